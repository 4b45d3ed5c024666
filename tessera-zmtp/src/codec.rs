//! ZMTP 3.x frame codec.
//!
//! Wire layout of one frame:
//!
//! ```text
//! [flags:1] [size:1 | size:8 BE] [body:size]
//! ```
//!
//! Flags: bit 0 MORE, bit 1 LONG (8-byte size), bit 2 COMMAND; bits 3..7
//! are reserved and must be zero.

use std::io;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tessera_core::buffer::SegmentedBuffer;
use tessera_core::error::TesseraError;
use tessera_core::socket_type::SocketType;
use thiserror::Error;

pub const FLAG_MORE: u8 = 0x01;
pub const FLAG_LONG: u8 = 0x02;
pub const FLAG_COMMAND: u8 = 0x04;
const RESERVED_MASK: u8 = 0xF8;

/// Largest body that fits in a short (1-byte size) frame.
pub const MAX_SHORT_BODY: usize = 255;

/// ZMTP protocol errors
#[derive(Debug, Error)]
pub enum ZmtpError {
    #[error("Protocol violation: reserved flag bits set ({0:#04x})")]
    ReservedBits(u8),

    #[error("Protocol violation: frame size field has MSB set")]
    SizeTooLarge,

    #[error("Frame of {size} bytes exceeds limit of {max}")]
    FrameTooLarge { size: u64, max: u64 },

    #[error("Invalid greeting: {0}")]
    Greeting(String),

    #[error("Unsupported security mechanism: {0}")]
    UnsupportedMechanism(String),

    #[error("Malformed command: {0}")]
    Command(String),

    #[error("Incompatible peer: {local} cannot talk to {peer}")]
    IncompatiblePeer { local: SocketType, peer: SocketType },

    #[error("Handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    #[error("Connection closed during handshake")]
    ClosedDuringHandshake,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for ZMTP operations
pub type Result<T> = std::result::Result<T, ZmtpError>;

impl From<ZmtpError> for TesseraError {
    fn from(err: ZmtpError) -> Self {
        match err {
            ZmtpError::Io(e) => Self::Io(e),
            ZmtpError::HandshakeTimeout(d) => Self::HandshakeTimeout(d),
            ZmtpError::Greeting(msg) => Self::InvalidGreeting(msg),
            ZmtpError::IncompatiblePeer { local, peer } => Self::IncompatiblePeer { local, peer },
            ZmtpError::FrameTooLarge { size, max } => Self::MessageTooLarge {
                size: usize::try_from(size).unwrap_or(usize::MAX),
                max: usize::try_from(max).unwrap_or(usize::MAX),
            },
            ZmtpError::ClosedDuringHandshake => Self::peer_disconnected("during handshake"),
            ZmtpError::ReservedBits(_) | ZmtpError::SizeTooLarge => {
                Self::invalid_frame(err.to_string())
            }
            ZmtpError::UnsupportedMechanism(_) | ZmtpError::Command(_) => {
                Self::protocol(err.to_string())
            }
        }
    }
}

impl From<ZmtpError> for io::Error {
    fn from(err: ZmtpError) -> Self {
        match err {
            ZmtpError::Io(e) => e,
            ZmtpError::HandshakeTimeout(_) => io::Error::new(io::ErrorKind::TimedOut, err),
            ZmtpError::ClosedDuringHandshake => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            ZmtpError::ReservedBits(_)
            | ZmtpError::SizeTooLarge
            | ZmtpError::FrameTooLarge { .. }
            | ZmtpError::Greeting(_)
            | ZmtpError::Command(_) => io::Error::new(io::ErrorKind::InvalidData, err),
            ZmtpError::UnsupportedMechanism(_) | ZmtpError::IncompatiblePeer { .. } => {
                io::Error::new(io::ErrorKind::Other, err)
            }
        }
    }
}

/// A decoded ZMTP frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZmtpFrame {
    pub flags: u8,
    pub payload: Bytes,
}

impl ZmtpFrame {
    /// Create a data frame. LONG is derived from the body length.
    pub fn data(payload: Bytes, more: bool) -> Self {
        let flags = if more { FLAG_MORE } else { 0 };
        Self { flags, payload }
    }

    /// Create a command frame.
    pub fn command(payload: Bytes) -> Self {
        Self {
            flags: FLAG_COMMAND,
            payload,
        }
    }

    #[inline]
    pub const fn more(&self) -> bool {
        (self.flags & FLAG_MORE) != 0
    }

    #[inline]
    pub const fn is_command(&self) -> bool {
        (self.flags & FLAG_COMMAND) != 0
    }

    /// Encoded size including header.
    #[inline]
    pub fn encoded_len(&self) -> usize {
        header_len(self.payload.len()) + self.payload.len()
    }

    /// Append the wire form of this frame to `dst`.
    pub fn encode_into(&self, dst: &mut BytesMut) {
        put_frame(dst, self.flags, &self.payload);
    }

    /// Encode this frame to bytes
    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out.freeze()
    }
}

#[inline]
const fn header_len(body_len: usize) -> usize {
    if body_len > MAX_SHORT_BODY {
        9
    } else {
        2
    }
}

/// Write one frame. LONG is set iff the body exceeds 255 bytes, whatever
/// `flags` says.
pub fn put_frame<B: BufMut>(dst: &mut B, flags: u8, body: &[u8]) {
    let len = body.len();
    if len > MAX_SHORT_BODY {
        dst.put_u8(flags | FLAG_LONG);
        dst.put_u64(len as u64);
    } else {
        dst.put_u8(flags & !FLAG_LONG);
        dst.put_u8(len as u8);
    }
    dst.put_slice(body);
}

/// Encode a multipart message: MORE on every frame but the last.
///
/// An empty message encodes to nothing.
pub fn encode_multipart<B: BufMut>(frames: &[Bytes], dst: &mut B) {
    let last = frames.len().saturating_sub(1);
    for (i, frame) in frames.iter().enumerate() {
        let flags = if i < last { FLAG_MORE } else { 0 };
        put_frame(dst, flags, frame);
    }
}

/// Incremental frame decoder over a [`SegmentedBuffer`].
///
/// Bytes are consumed only once a whole frame is buffered, so a partial
/// frame simply stays in the buffer until the next read completes it.
#[derive(Debug, Clone)]
pub struct ZmtpDecoder {
    max_frame_size: Option<u64>,
    last_more: bool,
}

impl Default for ZmtpDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ZmtpDecoder {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_frame_size: None,
            last_more: false,
        }
    }

    /// Reject frames whose body exceeds `max` bytes.
    #[must_use]
    pub const fn with_max_frame_size(max: Option<u64>) -> Self {
        Self {
            max_frame_size: max,
            last_more: false,
        }
    }

    /// MORE flag of the last data frame decoded.
    #[inline]
    pub const fn has_more(&self) -> bool {
        self.last_more
    }

    /// Decode a single frame from `src`.
    ///
    /// Returns:
    /// - `Ok(Some(frame))`: frame decoded and consumed
    /// - `Ok(None)`: need more data
    /// - `Err`: protocol violation, the connection must be dropped
    pub fn decode(&mut self, src: &mut SegmentedBuffer) -> Result<Option<ZmtpFrame>> {
        let mut head = [0u8; 9];
        if !src.copy_prefix(1, &mut head) {
            return Ok(None);
        }

        let flags = head[0];
        if flags & RESERVED_MASK != 0 {
            return Err(ZmtpError::ReservedBits(flags));
        }

        let is_long = flags & FLAG_LONG != 0;
        let hdr = if is_long { 9 } else { 2 };
        if !src.copy_prefix(hdr, &mut head) {
            return Ok(None);
        }

        let body_len = if is_long {
            let mut size = [0u8; 8];
            size.copy_from_slice(&head[1..9]);
            let size = u64::from_be_bytes(size);
            if size & (1 << 63) != 0 {
                return Err(ZmtpError::SizeTooLarge);
            }
            size
        } else {
            u64::from(head[1])
        };

        if let Some(max) = self.max_frame_size {
            if body_len > max {
                return Err(ZmtpError::FrameTooLarge {
                    size: body_len,
                    max,
                });
            }
        }

        let body_len = usize::try_from(body_len).map_err(|_| ZmtpError::SizeTooLarge)?;
        let Some(total) = hdr.checked_add(body_len) else {
            return Err(ZmtpError::SizeTooLarge);
        };
        if src.len() < total {
            return Ok(None);
        }

        src.advance(hdr);
        let payload = src.take_bytes(body_len).unwrap_or_default();
        let frame = ZmtpFrame { flags, payload };
        if !frame.is_command() {
            self.last_more = frame.more();
        }
        Ok(Some(frame))
    }
}

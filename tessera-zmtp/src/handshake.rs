//! ZMTP handshake: greeting exchange followed by READY exchange.
//!
//! The handshake runs to completion on the raw stream before a socket is
//! handed to the caller, so no application frame can interleave with it.
//! Reads use `read_exact` on small owned buffers and never pull bytes past
//! the peer's READY, leaving any pipelined data frames in the kernel buffer
//! for the socket's own decoder.

use std::io;
use std::time::Duration;

use bytes::Bytes;
use compio::buf::BufResult;
use compio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tessera_core::socket_type::SocketType;
use tracing::debug;

use crate::codec::{put_frame, ZmtpError, FLAG_COMMAND, FLAG_LONG};
use crate::command::{build_ready, parse_ready};
use crate::greeting::{Mechanism, ZmtpGreeting, GREETING_SIZE};

/// Upper bound for the peer's READY body.
const MAX_READY_SIZE: usize = 4096;

/// Result of a successful handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResult {
    pub peer_socket_type: SocketType,
    pub peer_identity: Option<Bytes>,
    /// (major, minor) from the peer's greeting.
    pub peer_version: (u8, u8),
}

/// Run the full handshake, bounded by `timeout` (`Duration::ZERO` disables it).
///
/// Fails if the peer's greeting is malformed, it selects a mechanism other
/// than NULL, its READY is malformed, or its socket type cannot talk to
/// `local_socket_type`.
pub async fn perform_handshake<S>(
    stream: &mut S,
    local_socket_type: SocketType,
    identity: Option<&[u8]>,
    timeout: Duration,
) -> Result<HandshakeResult, ZmtpError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if timeout.is_zero() {
        return exchange(stream, local_socket_type, identity).await;
    }
    match compio::time::timeout(timeout, exchange(stream, local_socket_type, identity)).await {
        Ok(result) => result,
        Err(_) => {
            debug!(?timeout, "[HANDSHAKE] timed out");
            Err(ZmtpError::HandshakeTimeout(timeout))
        }
    }
}

async fn exchange<S>(
    stream: &mut S,
    local_socket_type: SocketType,
    identity: Option<&[u8]>,
) -> Result<HandshakeResult, ZmtpError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    debug!(socket_type = %local_socket_type, "[HANDSHAKE] starting");

    let greeting = ZmtpGreeting::null(false).encode();
    let BufResult(res, _) = stream.write_all(greeting.to_vec()).await;
    res?;

    let BufResult(res, peer_raw) = stream.read_exact(vec![0u8; GREETING_SIZE]).await;
    res.map_err(eof_as_closed)?;
    let peer_greeting = ZmtpGreeting::parse(&peer_raw)?;
    if peer_greeting.mechanism != Mechanism::Null {
        return Err(ZmtpError::UnsupportedMechanism(
            peer_greeting.mechanism.as_str().to_string(),
        ));
    }
    debug!(
        major = peer_greeting.major,
        minor = peer_greeting.minor,
        "[HANDSHAKE] peer greeting ok"
    );

    let mut ready = Vec::with_capacity(64);
    put_frame(&mut ready, FLAG_COMMAND, &build_ready(local_socket_type, identity));
    let BufResult(res, _) = stream.write_all(ready).await;
    res?;

    let body = read_command(stream).await?;
    let meta = parse_ready(&body)?;

    if !local_socket_type.is_compatible(meta.socket_type) {
        debug!(
            local = %local_socket_type,
            peer = %meta.socket_type,
            "[HANDSHAKE] incompatible peer"
        );
        return Err(ZmtpError::IncompatiblePeer {
            local: local_socket_type,
            peer: meta.socket_type,
        });
    }

    debug!(
        peer = %meta.socket_type,
        has_identity = meta.identity.is_some(),
        "[HANDSHAKE] complete"
    );

    Ok(HandshakeResult {
        peer_socket_type: meta.socket_type,
        peer_identity: meta.identity,
        peer_version: (peer_greeting.major, peer_greeting.minor),
    })
}

/// Read exactly one command frame and return its body.
async fn read_command<S>(stream: &mut S) -> Result<Bytes, ZmtpError>
where
    S: AsyncRead + Unpin,
{
    let BufResult(res, header) = stream.read_exact(vec![0u8; 2]).await;
    res.map_err(eof_as_closed)?;

    let flags = header[0];
    if flags & 0xF8 != 0 {
        return Err(ZmtpError::ReservedBits(flags));
    }
    if flags & FLAG_COMMAND == 0 {
        return Err(ZmtpError::Command("expected command frame, got data".into()));
    }

    let body_len = if flags & FLAG_LONG != 0 {
        // header[1] is the first byte of the 8-byte size.
        let BufResult(res, rest) = stream.read_exact(vec![0u8; 7]).await;
        res.map_err(eof_as_closed)?;
        let mut size = [0u8; 8];
        size[0] = header[1];
        size[1..].copy_from_slice(&rest);
        let size = u64::from_be_bytes(size);
        usize::try_from(size).unwrap_or(usize::MAX)
    } else {
        usize::from(header[1])
    };

    if body_len > MAX_READY_SIZE {
        return Err(ZmtpError::FrameTooLarge {
            size: body_len as u64,
            max: MAX_READY_SIZE as u64,
        });
    }

    let BufResult(res, body) = stream.read_exact(vec![0u8; body_len]).await;
    res.map_err(eof_as_closed)?;
    Ok(Bytes::from(body))
}

fn eof_as_closed(err: io::Error) -> ZmtpError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        ZmtpError::ClosedDuringHandshake
    } else {
        ZmtpError::Io(err)
    }
}

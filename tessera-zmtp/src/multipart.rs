use crate::codec::ZmtpFrame;
use bytes::Bytes;
use smallvec::SmallVec;
use thiserror::Error;
use tracing::trace;

/// Errors produced by [`MultipartBuffer`]
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MultipartError {
    #[error("message exceeds {max} frames")]
    TooManyFrames { max: usize },

    #[error("message exceeds {max} bytes")]
    TooLarge { max: usize },
}

impl From<MultipartError> for std::io::Error {
    fn from(err: MultipartError) -> Self {
        std::io::Error::new(std::io::ErrorKind::InvalidData, err)
    }
}

/// Collects frames until a complete multipart message is formed.
///
/// A message completes on the first data frame without MORE. Limits are
/// checked per frame; on a violation the partial message is dropped and the
/// rest of that message is discarded as it arrives.
///
/// Command frames (PING, PONG, ...) may appear between data frames after the
/// handshake. They are never part of a message and are skipped.
#[derive(Debug)]
pub struct MultipartBuffer {
    frames: SmallVec<[Bytes; 4]>,
    byte_count: usize,
    max_frames: usize,
    max_bytes: Option<usize>,
    discarding: bool,
}

impl MultipartBuffer {
    pub fn new(max_frames: usize, max_bytes: Option<usize>) -> Self {
        Self {
            frames: SmallVec::new(),
            byte_count: 0,
            max_frames: max_frames.max(1),
            max_bytes,
            discarding: false,
        }
    }

    /// Number of frames of the message currently being assembled.
    #[inline]
    pub fn pending_frames(&self) -> usize {
        self.frames.len()
    }

    /// Push a frame.
    ///
    /// Returns:
    /// - `Ok(None)` if the message is not complete
    /// - `Ok(Some(frames))` if a full message was assembled
    /// - `Err(_)` when the message violates a limit
    pub fn push_frame(
        &mut self,
        frame: ZmtpFrame,
    ) -> Result<Option<Vec<Bytes>>, MultipartError> {
        if frame.is_command() {
            trace!(len = frame.payload.len(), "[MULTIPART] skipping command frame");
            return Ok(None);
        }

        if self.discarding {
            self.discarding = frame.more();
            return Ok(None);
        }

        if self.frames.len() + 1 > self.max_frames {
            self.fail(frame.more());
            return Err(MultipartError::TooManyFrames {
                max: self.max_frames,
            });
        }

        let bytes = self.byte_count + frame.payload.len();
        if let Some(max) = self.max_bytes {
            if bytes > max {
                self.fail(frame.more());
                return Err(MultipartError::TooLarge { max });
            }
        }

        self.byte_count = bytes;
        let more = frame.more();
        self.frames.push(frame.payload);

        if more {
            Ok(None)
        } else {
            let msg: Vec<Bytes> = self.frames.drain(..).collect();
            self.byte_count = 0;
            Ok(Some(msg))
        }
    }

    fn fail(&mut self, more: bool) {
        self.frames.clear();
        self.byte_count = 0;
        self.discarding = more;
    }
}

//! Multipart message builder.
//!
//! A message is an ordered list of frames; each frame is an immutable
//! `Bytes`. Sockets take and return `Vec<Bytes>` directly, the builder only
//! makes assembling those vectors pleasant.

use bytes::Bytes;

/// Builder for multipart messages.
///
/// ```
/// use tessera_core::message::Message;
///
/// // ROUTER envelope: [identity, empty, body]
/// let frames = Message::new()
///     .push_str("client-123")
///     .push_empty()
///     .push_str("Hello")
///     .into_frames();
/// assert_eq!(frames.len(), 3);
/// assert!(frames[1].is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    frames: Vec<Bytes>,
}

impl Message {
    #[must_use]
    pub const fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Create a message with room for `capacity` frames.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            frames: Vec::with_capacity(capacity),
        }
    }

    /// Wrap existing frames.
    #[must_use]
    pub const fn from_frames(frames: Vec<Bytes>) -> Self {
        Self { frames }
    }

    /// Add a frame from any type that can be converted to `Bytes`.
    #[must_use]
    pub fn push(mut self, frame: impl Into<Bytes>) -> Self {
        self.frames.push(frame.into());
        self
    }

    /// Add a UTF-8 string frame.
    #[must_use]
    pub fn push_str(mut self, s: &str) -> Self {
        self.frames.push(Bytes::copy_from_slice(s.as_bytes()));
        self
    }

    /// Add an empty frame (envelope delimiter).
    #[must_use]
    pub fn push_empty(mut self) -> Self {
        self.frames.push(Bytes::new());
        self
    }

    /// Add a `u64` frame in network byte order.
    #[must_use]
    pub fn push_u64(mut self, value: u64) -> Self {
        self.frames
            .push(Bytes::copy_from_slice(&value.to_be_bytes()));
        self
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Sum of all frame body sizes.
    #[must_use]
    pub fn total_bytes(&self) -> usize {
        total_bytes(&self.frames)
    }

    #[must_use]
    pub fn frames(&self) -> &[Bytes] {
        &self.frames
    }

    #[must_use]
    pub fn into_frames(self) -> Vec<Bytes> {
        self.frames
    }
}

impl From<Vec<Bytes>> for Message {
    fn from(frames: Vec<Bytes>) -> Self {
        Self { frames }
    }
}

impl From<Message> for Vec<Bytes> {
    fn from(msg: Message) -> Self {
        msg.frames
    }
}

/// Sum of frame body sizes.
#[inline]
#[must_use]
pub fn total_bytes(frames: &[Bytes]) -> usize {
    frames.iter().map(Bytes::len).sum()
}

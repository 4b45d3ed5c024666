//! Tessera Error Types
//!
//! Error handling shared by every layer. Socket-facing APIs return
//! `std::io::Result`; [`TesseraError`] converts into `io::Error` with a
//! matching [`io::ErrorKind`] so callers can use `?` across layers.

use std::fmt;
use std::io;
use thiserror::Error;

use crate::endpoint::EndpointError;
use crate::socket_type::SocketType;

/// Error numbers reported by [`TesseraError::errno`].
///
/// POSIX values follow Linux. Values above [`HAUSNUMERO`](errno::HAUSNUMERO)
/// are the messaging-specific numbers used by libzmq.
pub mod errno {
    pub const EINTR: i32 = 4;
    pub const EAGAIN: i32 = 11;
    pub const EFAULT: i32 = 14;
    pub const EINVAL: i32 = 22;
    pub const EMFILE: i32 = 24;
    pub const EPROTO: i32 = 71;
    pub const EMSGSIZE: i32 = 90;
    pub const ENOTSUP: i32 = 95;
    pub const ECONNRESET: i32 = 104;
    pub const ENOTCONN: i32 = 107;
    pub const EHOSTUNREACH: i32 = 113;

    /// Base for messaging-specific error numbers.
    pub const HAUSNUMERO: i32 = 156_384_712;
    /// Operation not valid in the current socket state.
    pub const EFSM: i32 = HAUSNUMERO + 51;
    /// Peer speaks an incompatible socket type or protocol.
    pub const ENOCOMPATPROTO: i32 = HAUSNUMERO + 52;
    /// The context was terminated.
    pub const ETERM: i32 = HAUSNUMERO + 53;
}

/// Why an operation on a [`Context`](crate::context::Context) failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextReason {
    /// The context was already destroyed or never initialized.
    InvalidContext,
    /// Termination was interrupted and may be restarted.
    Interrupted,
}

impl ContextReason {
    /// POSIX error number for this reason.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::InvalidContext => errno::EFAULT,
            Self::Interrupted => errno::EINTR,
        }
    }

    /// Human-readable description.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidContext => "The provided context was invalid.",
            Self::Interrupted => {
                "Termination was interrupted by a signal. It can be restarted if needed."
            }
        }
    }
}

impl fmt::Display for ContextReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Main error type for Tessera operations
#[derive(Error, Debug)]
pub enum TesseraError {
    /// IO error during socket operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Protocol error during ZMTP handshake or framing
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Handshake timeout
    #[error("Handshake timeout after {0:?}")]
    HandshakeTimeout(std::time::Duration),

    /// Invalid greeting received
    #[error("Invalid greeting: {0}")]
    InvalidGreeting(String),

    /// Invalid frame format
    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    /// Socket closed
    #[error("Socket closed")]
    SocketClosed,

    /// Peer disconnected
    #[error("Peer disconnected: {0}")]
    PeerDisconnected(String),

    /// Invalid routing ID
    #[error("Invalid routing ID")]
    InvalidRoutingId,

    /// Message too large
    #[error("Message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// Subscription error
    #[error("Subscription error: {0}")]
    Subscription(String),

    /// Context lifecycle error
    #[error("Context error: {0}")]
    Context(ContextReason),

    /// Option value rejected
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// The context already holds its maximum number of sockets
    #[error("Socket limit reached (max: {max})")]
    SocketLimitReached { max: usize },

    /// Peer socket type cannot talk to ours
    #[error("Incompatible peer: {local} cannot talk to {peer}")]
    IncompatiblePeer { local: SocketType, peer: SocketType },

    /// Operation not allowed in the current socket state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// No peer matches the requested routing identity
    #[error("Host unreachable: no peer for routing ID")]
    HostUnreachable,

    /// Endpoint parse or resolution failure
    #[error("Endpoint error: {0}")]
    Endpoint(#[from] EndpointError),
}

/// Result type alias for Tessera operations
pub type Result<T> = std::result::Result<T, TesseraError>;

impl TesseraError {
    /// Create a protocol error with a message
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create an invalid greeting error
    pub fn invalid_greeting(msg: impl Into<String>) -> Self {
        Self::InvalidGreeting(msg.into())
    }

    /// Create an invalid frame error
    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame(msg.into())
    }

    /// Create a peer disconnected error
    pub fn peer_disconnected(peer_id: impl Into<String>) -> Self {
        Self::PeerDisconnected(peer_id.into())
    }

    /// Create an invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create an invalid option error
    pub fn invalid_option(msg: impl Into<String>) -> Self {
        Self::InvalidOption(msg.into())
    }

    /// Check if this error is recoverable
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            Self::Context(ContextReason::Interrupted) | Self::InvalidState(_) => true,
            _ => false,
        }
    }

    /// Check if this is a connection error
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::SocketClosed | Self::PeerDisconnected(_) | Self::HandshakeTimeout(_)
        )
    }

    /// Closest error number for this error.
    #[must_use]
    pub fn errno(&self) -> i32 {
        match self {
            Self::Io(e) => match e.kind() {
                io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => errno::EAGAIN,
                io::ErrorKind::Interrupted => errno::EINTR,
                io::ErrorKind::InvalidInput => errno::EINVAL,
                io::ErrorKind::NotConnected => errno::ENOTCONN,
                io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe => errno::ECONNRESET,
                io::ErrorKind::Unsupported => errno::ENOTSUP,
                _ => e.raw_os_error().unwrap_or(errno::EPROTO),
            },
            Self::Protocol(_) | Self::InvalidGreeting(_) | Self::InvalidFrame(_) => errno::EPROTO,
            Self::HandshakeTimeout(_) => errno::EAGAIN,
            Self::SocketClosed => errno::ETERM,
            Self::PeerDisconnected(_) => errno::ECONNRESET,
            Self::InvalidRoutingId | Self::InvalidOption(_) | Self::Endpoint(_) => errno::EINVAL,
            Self::MessageTooLarge { .. } => errno::EMSGSIZE,
            Self::Subscription(_) => errno::EINVAL,
            Self::Context(reason) => reason.code(),
            Self::SocketLimitReached { .. } => errno::EMFILE,
            Self::IncompatiblePeer { .. } => errno::ENOCOMPATPROTO,
            Self::InvalidState(_) => errno::EFSM,
            Self::HostUnreachable => errno::EHOSTUNREACH,
        }
    }
}

impl From<TesseraError> for io::Error {
    fn from(err: TesseraError) -> Self {
        let kind = match &err {
            TesseraError::Io(e) => e.kind(),
            TesseraError::HandshakeTimeout(_) => io::ErrorKind::TimedOut,
            TesseraError::SocketClosed => io::ErrorKind::NotConnected,
            TesseraError::PeerDisconnected(_) => io::ErrorKind::ConnectionReset,
            TesseraError::InvalidRoutingId
            | TesseraError::InvalidOption(_)
            | TesseraError::InvalidState(_)
            | TesseraError::MessageTooLarge { .. }
            | TesseraError::Endpoint(_) => io::ErrorKind::InvalidInput,
            TesseraError::HostUnreachable => io::ErrorKind::NotFound,
            TesseraError::Protocol(_)
            | TesseraError::InvalidGreeting(_)
            | TesseraError::InvalidFrame(_)
            | TesseraError::IncompatiblePeer { .. } => io::ErrorKind::InvalidData,
            _ => io::ErrorKind::Other,
        };
        match err {
            TesseraError::Io(e) => e,
            other => io::Error::new(kind, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_reason_codes_and_text() {
        assert_eq!(ContextReason::InvalidContext.code(), errno::EFAULT);
        assert_eq!(ContextReason::Interrupted.code(), errno::EINTR);
        assert_eq!(
            ContextReason::InvalidContext.to_string(),
            "The provided context was invalid."
        );
    }

    #[test]
    fn errno_mapping() {
        let timeout = TesseraError::Io(io::Error::from(io::ErrorKind::TimedOut));
        assert_eq!(timeout.errno(), errno::EAGAIN);
        assert!(timeout.is_recoverable());

        let fsm = TesseraError::invalid_state("send while awaiting reply");
        assert_eq!(fsm.errno(), errno::EFSM);

        let big = TesseraError::MessageTooLarge { size: 10, max: 5 };
        assert_eq!(big.errno(), errno::EMSGSIZE);
        assert_eq!(big.to_string(), "Message too large: 10 bytes (max: 5)");
    }

    #[test]
    fn converts_into_io_error() {
        let err: io::Error = TesseraError::invalid_state("recv before send").into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(err.to_string().contains("recv before send"));

        let inner = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        let err: io::Error = TesseraError::Io(inner).into();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn connection_errors() {
        assert!(TesseraError::SocketClosed.is_connection_error());
        assert!(!TesseraError::InvalidRoutingId.is_connection_error());
    }
}

//! Socket event monitoring.
//!
//! Sockets and acceptors emit lifecycle events into an unbounded flume
//! channel. Emission never blocks; if the receiving side was dropped the
//! events are discarded.

use crate::endpoint::Endpoint;
use std::fmt;

/// Socket lifecycle events.
#[derive(Debug, Clone)]
pub enum SocketEvent {
    /// Outbound connection established.
    Connected(Endpoint),

    /// Peer went away (EOF or I/O error).
    Disconnected(Endpoint),

    /// Listener bound to an endpoint.
    Bound(Endpoint),

    /// Inbound connection accepted.
    Accepted(Endpoint),

    /// Connection attempt failed.
    ConnectFailed { endpoint: Endpoint, reason: String },

    /// Greeting or READY exchange failed.
    HandshakeFailed { endpoint: Endpoint, reason: String },

    /// Socket closed locally.
    Closed(Endpoint),
}

impl SocketEvent {
    /// Endpoint the event refers to.
    #[must_use]
    pub fn endpoint(&self) -> &Endpoint {
        match self {
            Self::Connected(ep)
            | Self::Disconnected(ep)
            | Self::Bound(ep)
            | Self::Accepted(ep)
            | Self::Closed(ep) => ep,
            Self::ConnectFailed { endpoint, .. } | Self::HandshakeFailed { endpoint, .. } => {
                endpoint
            }
        }
    }
}

impl fmt::Display for SocketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connected(ep) => write!(f, "Connected to {ep}"),
            Self::Disconnected(ep) => write!(f, "Disconnected from {ep}"),
            Self::Bound(ep) => write!(f, "Bound to {ep}"),
            Self::Accepted(ep) => write!(f, "Accepted connection from {ep}"),
            Self::ConnectFailed { endpoint, reason } => {
                write!(f, "Connect failed for {endpoint}: {reason}")
            }
            Self::HandshakeFailed { endpoint, reason } => {
                write!(f, "Handshake failed with {endpoint}: {reason}")
            }
            Self::Closed(ep) => write!(f, "Closed {ep}"),
        }
    }
}

/// Receiving side of a monitor channel.
pub type SocketMonitor = flume::Receiver<SocketEvent>;

/// Sending side of a monitor channel.
pub type SocketEventSender = flume::Sender<SocketEvent>;

/// Create a new monitoring channel pair.
#[must_use]
pub fn create_monitor() -> (SocketEventSender, SocketMonitor) {
    flume::unbounded()
}

/// Send `event` if a monitor is attached.
#[inline]
pub fn emit(monitor: Option<&SocketEventSender>, event: SocketEvent) {
    if let Some(tx) = monitor {
        // A dropped receiver just means nobody is listening any more.
        let _ = tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    fn ep() -> Endpoint {
        let addr: SocketAddr = "127.0.0.1:5555".parse().unwrap();
        Endpoint::Tcp(addr)
    }

    #[test]
    fn test_socket_event_display() {
        assert_eq!(
            SocketEvent::Connected(ep()).to_string(),
            "Connected to tcp://127.0.0.1:5555"
        );
        let failed = SocketEvent::HandshakeFailed {
            endpoint: ep(),
            reason: "bad greeting".into(),
        };
        assert_eq!(
            failed.to_string(),
            "Handshake failed with tcp://127.0.0.1:5555: bad greeting"
        );
        assert_eq!(failed.endpoint(), &ep());
    }

    #[test]
    fn test_monitor_channel() {
        let (sender, receiver) = create_monitor();
        emit(Some(&sender), SocketEvent::Bound(ep()));
        emit(None, SocketEvent::Closed(ep()));

        assert!(matches!(receiver.try_recv(), Ok(SocketEvent::Bound(_))));
        assert!(receiver.try_recv().is_err());

        drop(receiver);
        emit(Some(&sender), SocketEvent::Closed(ep()));
    }
}

//! Socket type enumeration.
//!
//! The names here are exactly the `Socket-Type` property values exchanged in
//! the READY command, so `as_str` and `from_bytes` are the wire encoding.

use std::fmt;

/// ZeroMQ socket types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SocketType {
    /// Exclusive bidirectional peer
    Pair = 0,
    /// Publisher, fans messages out to subscribers
    Pub = 1,
    /// Subscriber, receives messages matching its prefixes
    Sub = 2,
    /// Synchronous request client
    Req = 3,
    /// Synchronous reply server
    Rep = 4,
    /// Asynchronous request peer
    Dealer = 5,
    /// Identity-addressed router
    Router = 6,
    /// Pipeline sink
    Pull = 7,
    /// Pipeline source
    Push = 8,
    /// Publisher that surfaces subscriptions
    XPub = 9,
    /// Subscriber that sends raw subscription messages
    XSub = 10,
}

impl SocketType {
    /// All socket types, in wire-number order.
    pub const ALL: [SocketType; 11] = [
        Self::Pair,
        Self::Pub,
        Self::Sub,
        Self::Req,
        Self::Rep,
        Self::Dealer,
        Self::Router,
        Self::Pull,
        Self::Push,
        Self::XPub,
        Self::XSub,
    ];

    /// Get the socket type as a string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pair => "PAIR",
            Self::Pub => "PUB",
            Self::Sub => "SUB",
            Self::Req => "REQ",
            Self::Rep => "REP",
            Self::Dealer => "DEALER",
            Self::Router => "ROUTER",
            Self::Pull => "PULL",
            Self::Push => "PUSH",
            Self::XPub => "XPUB",
            Self::XSub => "XSUB",
        }
    }

    /// Parse a `Socket-Type` property value.
    pub fn from_bytes(name: &[u8]) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().as_bytes() == name)
    }

    /// Check if this socket type is compatible with the given peer type.
    pub fn is_compatible(&self, peer: SocketType) -> bool {
        matches!(
            (self, peer),
            (Self::Pair, Self::Pair)
                | (Self::Pub | Self::XPub, Self::Sub | Self::XSub)
                | (Self::Sub | Self::XSub, Self::Pub | Self::XPub)
                | (Self::Req, Self::Rep | Self::Router)
                | (Self::Rep, Self::Req | Self::Dealer)
                | (Self::Dealer, Self::Rep | Self::Router | Self::Dealer)
                | (Self::Router, Self::Req | Self::Dealer | Self::Router)
                | (Self::Push, Self::Pull)
                | (Self::Pull, Self::Push)
        )
    }

    /// Whether user messages may be sent on this socket type.
    pub fn can_send(&self) -> bool {
        !matches!(self, Self::Sub | Self::Pull)
    }

    /// Whether user messages may be received on this socket type.
    pub fn can_recv(&self) -> bool {
        !matches!(self, Self::Pub | Self::Push)
    }
}

impl fmt::Display for SocketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_type_display() {
        assert_eq!(SocketType::Dealer.to_string(), "DEALER");
        assert_eq!(SocketType::Router.to_string(), "ROUTER");
        assert_eq!(SocketType::Pub.to_string(), "PUB");
    }

    #[test]
    fn test_from_bytes_matches_names() {
        for ty in SocketType::ALL {
            assert_eq!(SocketType::from_bytes(ty.as_str().as_bytes()), Some(ty));
        }
        assert_eq!(SocketType::from_bytes(b"STREAM"), None);
        assert_eq!(SocketType::from_bytes(b"req"), None);
    }

    #[test]
    fn test_socket_compatibility() {
        assert!(SocketType::Req.is_compatible(SocketType::Rep));
        assert!(SocketType::Rep.is_compatible(SocketType::Req));
        assert!(SocketType::Dealer.is_compatible(SocketType::Router));
        assert!(SocketType::Router.is_compatible(SocketType::Dealer));
        assert!(SocketType::Push.is_compatible(SocketType::Pull));
        assert!(SocketType::Pub.is_compatible(SocketType::Sub));
        assert!(SocketType::XPub.is_compatible(SocketType::Sub));

        assert!(!SocketType::Req.is_compatible(SocketType::Dealer));
        assert!(!SocketType::Pub.is_compatible(SocketType::Pull));
        assert!(!SocketType::Pair.is_compatible(SocketType::Push));
    }

    #[test]
    fn test_compatibility_is_symmetric() {
        for a in SocketType::ALL {
            for b in SocketType::ALL {
                assert_eq!(a.is_compatible(b), b.is_compatible(a), "{a} / {b}");
            }
        }
    }

    #[test]
    fn test_direction() {
        assert!(!SocketType::Sub.can_send());
        assert!(!SocketType::Pull.can_send());
        assert!(!SocketType::Pub.can_recv());
        assert!(!SocketType::Push.can_recv());
        assert!(SocketType::Pair.can_send() && SocketType::Pair.can_recv());
    }
}

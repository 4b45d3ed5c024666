use std::collections::BTreeSet;

use bytes::Bytes;
use smallvec::SmallVec;
use tessera_core::subscription::{SubscriptionEvent, SubscriptionIndex};
use tracing::trace;

use super::PeerKey;

/// Subscription-filtered delivery for PUB sockets.
///
/// A message goes to every peer holding a subscription that prefixes its
/// first frame. Peers that never subscribed get nothing.
#[derive(Debug, Default)]
pub struct Fanout {
    peers: BTreeSet<PeerKey>,
    index: SubscriptionIndex,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_peer(&mut self, peer: PeerKey) {
        self.peers.insert(peer);
    }

    /// Drop a peer and every subscription it held.
    pub fn remove_peer(&mut self, peer: PeerKey) -> bool {
        self.index.remove_peer_everywhere(peer);
        self.peers.remove(&peer)
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn has_peer(&self, peer: PeerKey) -> bool {
        self.peers.contains(&peer)
    }

    /// Number of distinct prefixes with at least one subscriber.
    pub fn subscription_count(&self) -> usize {
        self.index.len()
    }

    /// Apply a subscription message received from `peer`.
    ///
    /// Returns the parsed event, or `None` when the message is not a
    /// subscription (ignored, as ZMTP 3.0 publishers do) or `peer` was never
    /// added.
    pub fn handle_message(&mut self, peer: PeerKey, msg: &[Bytes]) -> Option<SubscriptionEvent> {
        if !self.peers.contains(&peer) {
            trace!(peer, "[PUB] ignoring message from unknown peer");
            return None;
        }
        let first = msg.first()?;
        let Some(event) = SubscriptionEvent::from_message(first) else {
            trace!(peer, "[PUB] ignoring non-subscription message");
            return None;
        };
        match &event {
            SubscriptionEvent::Subscribe(prefix) => {
                self.index.subscribe(peer, prefix.clone());
            }
            SubscriptionEvent::Unsubscribe(prefix) => {
                self.index.unsubscribe(peer, prefix);
            }
        }
        trace!(peer, subscribe = event.is_subscribe(), "[PUB] subscription updated");
        Some(event)
    }

    /// Peers that should receive `msg`, in ascending key order.
    pub fn targets(&self, msg: &[Bytes]) -> SmallVec<[PeerKey; 16]> {
        match msg.first() {
            Some(topic) => self.index.match_topic(topic),
            None => SmallVec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sub(prefix: &'static [u8]) -> Vec<Bytes> {
        vec![SubscriptionEvent::Subscribe(Bytes::from_static(prefix)).to_message()]
    }

    fn unsub(prefix: &'static [u8]) -> Vec<Bytes> {
        vec![SubscriptionEvent::Unsubscribe(Bytes::from_static(prefix)).to_message()]
    }

    fn msg(topic: &'static [u8]) -> Vec<Bytes> {
        vec![Bytes::from_static(topic), Bytes::from_static(b"payload")]
    }

    #[test]
    fn filters_by_prefix() {
        let mut fan = Fanout::new();
        fan.add_peer(1);
        fan.add_peer(2);
        fan.add_peer(3);
        fan.handle_message(1, &sub(b"weather"));
        fan.handle_message(2, &sub(b""));

        assert_eq!(fan.targets(&msg(b"weather.paris")).as_slice(), &[1, 2]);
        assert_eq!(fan.targets(&msg(b"sports")).as_slice(), &[2]);
        // Peer 3 never subscribed.
        assert!(!fan.targets(&msg(b"anything")).contains(&3));
    }

    #[test]
    fn unsubscribe_and_removal() {
        let mut fan = Fanout::new();
        fan.add_peer(1);
        fan.handle_message(1, &sub(b"a"));
        assert_eq!(fan.subscription_count(), 1);
        assert!(fan.handle_message(1, &unsub(b"a")).is_some());
        assert!(fan.targets(&msg(b"a")).is_empty());

        fan.handle_message(1, &sub(b"b"));
        assert!(fan.remove_peer(1));
        assert!(fan.targets(&msg(b"b")).is_empty());
        assert_eq!(fan.peer_count(), 0);
    }

    #[test]
    fn unknown_peers_leave_no_subscriptions() {
        let mut fan = Fanout::new();
        fan.add_peer(1);
        assert!(fan.handle_message(7, &sub(b"a")).is_none());
        assert_eq!(fan.subscription_count(), 0);

        fan.remove_peer(1);
        assert!(fan.handle_message(1, &sub(b"a")).is_none());
        assert!(fan.targets(&msg(b"a")).is_empty());
    }

    #[test]
    fn ignores_garbage() {
        let mut fan = Fanout::new();
        fan.add_peer(1);
        assert!(fan.handle_message(1, &[Bytes::from_static(b"\x02x")]).is_none());
        assert!(fan.handle_message(1, &[]).is_none());
        assert!(fan.targets(&[]).is_empty());
    }
}

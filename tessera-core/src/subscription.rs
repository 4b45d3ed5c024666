//! PUB/SUB subscription bookkeeping.
//!
//! - [`SubscriptionIndex`]: publisher side, prefix → peers, kept as a table
//!   sorted by prefix so `match_topic` is a forward scan with early exit.
//! - [`SubscriptionSet`]: subscriber side, the local filter of one socket.
//!   Subscriptions are counted: subscribing twice needs two unsubscribes.
//! - [`SubscriptionEvent`]: the `0x01`/`0x00` + prefix wire message.

use bytes::Bytes;
use smallvec::SmallVec;

/// Compact integer ID for peers to keep the index cache-dense.
pub type PeerKey = u64;

#[derive(Debug, Clone)]
struct Entry {
    prefix: Bytes,
    /// Inline up to 4 peers without heap allocation (common low fanout).
    peers: SmallVec<[PeerKey; 4]>,
}

/// Sorted prefix table mapping topic prefixes to subscribed peers.
#[derive(Debug, Default)]
pub struct SubscriptionIndex {
    subs: Vec<Entry>,
}

impl SubscriptionIndex {
    #[must_use]
    pub const fn new() -> Self {
        Self { subs: Vec::new() }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Number of distinct prefixes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.subs.len()
    }

    /// Adds a subscription for `peer` to `prefix`.
    ///
    /// Returns `true` if the peer was not yet subscribed to this prefix.
    pub fn subscribe(&mut self, peer: PeerKey, prefix: Bytes) -> bool {
        match self.subs.binary_search_by(|s| s.prefix.cmp(&prefix)) {
            Ok(idx) => {
                let peers = &mut self.subs[idx].peers;
                if peers.contains(&peer) {
                    false
                } else {
                    peers.push(peer);
                    true
                }
            }
            Err(idx) => {
                let mut peers = SmallVec::<[PeerKey; 4]>::new();
                peers.push(peer);
                self.subs.insert(idx, Entry { prefix, peers });
                true
            }
        }
    }

    /// Removes a subscription for `peer` from `prefix`.
    ///
    /// Returns `true` if the peer was subscribed.
    pub fn unsubscribe(&mut self, peer: PeerKey, prefix: &[u8]) -> bool {
        let Ok(idx) = self.subs.binary_search_by(|s| s.prefix.as_ref().cmp(prefix)) else {
            return false;
        };
        let peers = &mut self.subs[idx].peers;
        let removed = match peers.iter().position(|p| *p == peer) {
            Some(pos) => {
                peers.swap_remove(pos);
                true
            }
            None => false,
        };
        if peers.is_empty() {
            self.subs.remove(idx);
        }
        removed
    }

    /// Remove `peer` from every prefix (used on disconnect).
    pub fn remove_peer_everywhere(&mut self, peer: PeerKey) {
        self.subs.retain_mut(|entry| {
            if let Some(pos) = entry.peers.iter().position(|p| *p == peer) {
                entry.peers.swap_remove(pos);
            }
            !entry.peers.is_empty()
        });
    }

    /// Whether `peer` holds at least one subscription.
    #[must_use]
    pub fn has_peer(&self, peer: PeerKey) -> bool {
        self.subs.iter().any(|s| s.peers.contains(&peer))
    }

    /// Match a topic against all subscriptions.
    ///
    /// Returns a sorted, deduplicated list of `PeerKey`s.
    #[must_use]
    pub fn match_topic(&self, topic: &[u8]) -> SmallVec<[PeerKey; 16]> {
        let mut out: SmallVec<[PeerKey; 16]> = SmallVec::new();

        for sub in &self.subs {
            let p = sub.prefix.as_ref();

            // A prefix of `topic` never sorts after `topic`.
            if p > topic {
                break;
            }

            if topic.starts_with(p) {
                out.extend_from_slice(&sub.peers);
            }
        }

        if out.len() > 1 {
            out.sort_unstable();
            out.dedup();
        }

        out
    }
}

/// Local subscription filter for a single subscriber.
#[derive(Debug, Default, Clone)]
pub struct SubscriptionSet {
    /// (prefix, count), sorted by prefix.
    prefixes: Vec<(Bytes, usize)>,
}

impl SubscriptionSet {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            prefixes: Vec::new(),
        }
    }

    /// Add one reference to `prefix`.
    ///
    /// Returns `true` when the prefix is new to the set.
    pub fn subscribe(&mut self, prefix: Bytes) -> bool {
        match self.prefixes.binary_search_by(|(p, _)| p.cmp(&prefix)) {
            Ok(idx) => {
                self.prefixes[idx].1 += 1;
                false
            }
            Err(idx) => {
                self.prefixes.insert(idx, (prefix, 1));
                true
            }
        }
    }

    /// Drop one reference to `prefix`.
    ///
    /// Returns `true` when the last reference went away. Unknown prefixes
    /// are ignored and return `false`.
    pub fn unsubscribe(&mut self, prefix: &[u8]) -> bool {
        let Ok(idx) = self
            .prefixes
            .binary_search_by(|(p, _)| p.as_ref().cmp(prefix))
        else {
            return false;
        };
        self.prefixes[idx].1 -= 1;
        if self.prefixes[idx].1 == 0 {
            self.prefixes.remove(idx);
            true
        } else {
            false
        }
    }

    /// Whether a message whose first frame is `topic` passes the filter.
    ///
    /// An empty set matches nothing; an empty prefix matches everything.
    #[must_use]
    pub fn matches(&self, topic: &[u8]) -> bool {
        self.prefixes
            .iter()
            .take_while(|(p, _)| p.as_ref() <= topic)
            .any(|(p, _)| topic.starts_with(p))
    }

    /// Distinct prefixes, in sorted order.
    pub fn prefixes(&self) -> impl Iterator<Item = &Bytes> {
        self.prefixes.iter().map(|(p, _)| p)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn clear(&mut self) {
        self.prefixes.clear();
    }
}

/// Subscribe / unsubscribe message as carried in a data frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionEvent {
    Subscribe(Bytes),
    Unsubscribe(Bytes),
}

impl SubscriptionEvent {
    /// Parse `[0x01|0x00] prefix...`. Any other leading byte is not a
    /// subscription message.
    #[must_use]
    pub fn from_message(msg: &Bytes) -> Option<Self> {
        let (&cmd, _) = msg.split_first()?;
        let prefix = msg.slice(1..);
        match cmd {
            0x01 => Some(Self::Subscribe(prefix)),
            0x00 => Some(Self::Unsubscribe(prefix)),
            _ => None,
        }
    }

    /// Encode as a subscription message body.
    #[must_use]
    pub fn to_message(&self) -> Bytes {
        let (cmd, prefix) = match self {
            Self::Subscribe(p) => (0x01u8, p),
            Self::Unsubscribe(p) => (0x00u8, p),
        };

        let mut msg = Vec::with_capacity(1 + prefix.len());
        msg.push(cmd);
        msg.extend_from_slice(prefix);
        Bytes::from(msg)
    }

    #[must_use]
    pub const fn prefix(&self) -> &Bytes {
        match self {
            Self::Subscribe(p) | Self::Unsubscribe(p) => p,
        }
    }

    #[must_use]
    pub const fn is_subscribe(&self) -> bool {
        matches!(self, Self::Subscribe(_))
    }
}

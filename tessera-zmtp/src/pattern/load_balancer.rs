use super::PeerKey;

/// Round-robin peer rotation.
///
/// Peers are served in attach order. Removing a peer keeps the rotation
/// position, so the peer after it is next.
#[derive(Debug, Default, Clone)]
pub struct LoadBalancer {
    peers: Vec<PeerKey>,
    cursor: usize,
}

impl LoadBalancer {
    pub const fn new() -> Self {
        Self {
            peers: Vec::new(),
            cursor: 0,
        }
    }

    pub fn add(&mut self, peer: PeerKey) {
        if !self.peers.contains(&peer) {
            self.peers.push(peer);
        }
    }

    pub fn remove(&mut self, peer: PeerKey) -> bool {
        let Some(pos) = self.peers.iter().position(|p| *p == peer) else {
            return false;
        };
        self.peers.remove(pos);
        if pos < self.cursor {
            self.cursor -= 1;
        }
        if self.cursor >= self.peers.len() {
            self.cursor = 0;
        }
        true
    }

    /// Next peer in rotation, or `None` with no peers.
    pub fn next_peer(&mut self) -> Option<PeerKey> {
        let peer = *self.peers.get(self.cursor)?;
        self.cursor = (self.cursor + 1) % self.peers.len();
        Some(peer)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn peers(&self) -> &[PeerKey] {
        &self.peers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_in_order() {
        let mut lb = LoadBalancer::new();
        assert_eq!(lb.next_peer(), None);
        lb.add(10);
        lb.add(20);
        lb.add(30);
        lb.add(20);
        let order: Vec<_> = (0..6).filter_map(|_| lb.next_peer()).collect();
        assert_eq!(order, vec![10, 20, 30, 10, 20, 30]);
    }

    #[test]
    fn removal_skips_peer() {
        let mut lb = LoadBalancer::new();
        for p in [1, 2, 3] {
            lb.add(p);
        }
        assert_eq!(lb.next_peer(), Some(1));
        assert!(lb.remove(2));
        assert!(!lb.remove(2));
        assert_eq!(lb.next_peer(), Some(3));
        assert_eq!(lb.next_peer(), Some(1));

        assert!(lb.remove(3));
        assert!(lb.remove(1));
        assert!(lb.is_empty());
        assert_eq!(lb.next_peer(), None);
    }

    #[test]
    fn removing_earlier_peer_keeps_position() {
        let mut lb = LoadBalancer::new();
        for p in [1, 2, 3] {
            lb.add(p);
        }
        lb.next_peer();
        lb.next_peer();
        // Cursor now points at 3.
        lb.remove(1);
        assert_eq!(lb.next_peer(), Some(3));
        assert_eq!(lb.next_peer(), Some(2));
    }
}

use std::collections::HashMap;

use bytes::{BufMut, Bytes, BytesMut};
use tessera_core::error::TesseraError;
use tracing::{debug, trace};

use super::PeerKey;

/// Identity <-> peer mapping for ROUTER sockets.
///
/// Peers that announce no identity get a generated one: a zero byte
/// followed by a 4-byte big-endian counter. Announced identities never
/// start with zero in practice, so the two spaces do not collide; if they
/// do, the generator skips taken values.
#[derive(Debug)]
pub struct RouterTable {
    by_identity: HashMap<Bytes, PeerKey>,
    by_peer: HashMap<PeerKey, Bytes>,
    next_generated: u32,
    mandatory: bool,
}

impl RouterTable {
    pub fn new(mandatory: bool) -> Self {
        Self {
            by_identity: HashMap::new(),
            by_peer: HashMap::new(),
            next_generated: 1,
            mandatory,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.by_peer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.by_peer.is_empty()
    }

    pub const fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn set_mandatory(&mut self, mandatory: bool) {
        self.mandatory = mandatory;
    }

    fn generate(&mut self) -> Bytes {
        loop {
            let mut id = BytesMut::with_capacity(5);
            id.put_u8(0);
            id.put_u32(self.next_generated);
            self.next_generated = self.next_generated.wrapping_add(1);
            let id = id.freeze();
            if !self.by_identity.contains_key(&id) {
                return id;
            }
        }
    }

    /// Register `peer` and return the identity it is addressed by.
    ///
    /// An identity already held by another peer is refused with
    /// `InvalidRoutingId`; the caller should drop the new connection.
    pub fn attach(&mut self, peer: PeerKey, announced: Option<Bytes>) -> Result<Bytes, TesseraError> {
        let identity = match announced {
            Some(id) if !id.is_empty() => {
                if self.by_identity.contains_key(&id) {
                    debug!(identity = ?id, "[ROUTER] duplicate identity refused");
                    return Err(TesseraError::InvalidRoutingId);
                }
                id
            }
            _ => self.generate(),
        };

        if let Some(old) = self.by_peer.insert(peer, identity.clone()) {
            self.by_identity.remove(&old);
        }
        self.by_identity.insert(identity.clone(), peer);
        trace!(peer, identity = ?identity, "[ROUTER] peer attached");
        Ok(identity)
    }

    /// Forget `peer`; returns the identity it held.
    pub fn detach(&mut self, peer: PeerKey) -> Option<Bytes> {
        let identity = self.by_peer.remove(&peer)?;
        self.by_identity.remove(&identity);
        Some(identity)
    }

    pub fn identity_of(&self, peer: PeerKey) -> Option<&Bytes> {
        self.by_peer.get(&peer)
    }

    pub fn peer_of(&self, identity: &[u8]) -> Option<PeerKey> {
        self.by_identity.get(identity).copied()
    }

    /// Prefix an inbound message with the sender's identity.
    pub fn tag_inbound(&self, peer: PeerKey, msg: Vec<Bytes>) -> Option<Vec<Bytes>> {
        let identity = self.by_peer.get(&peer)?;
        let mut out = Vec::with_capacity(msg.len() + 1);
        out.push(identity.clone());
        out.extend(msg);
        Some(out)
    }

    /// Resolve the destination of an outbound message.
    ///
    /// The first frame is the identity and is removed. Unknown identities
    /// give `Ok(None)` (message dropped) unless the table is mandatory, in
    /// which case they fail with `HostUnreachable`.
    pub fn route(&self, mut msg: Vec<Bytes>) -> Result<Option<(PeerKey, Vec<Bytes>)>, TesseraError> {
        if msg.is_empty() {
            return Err(TesseraError::invalid_state(
                "ROUTER message must start with an identity frame",
            ));
        }
        let identity = msg.remove(0);
        match self.by_identity.get(&identity) {
            Some(&peer) => Ok(Some((peer, msg))),
            None if self.mandatory => Err(TesseraError::HostUnreachable),
            None => {
                trace!(identity = ?identity, "[ROUTER] unknown identity, dropping");
                Ok(None)
            }
        }
    }
}

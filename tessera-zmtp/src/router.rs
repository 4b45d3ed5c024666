//! ROUTER socket implementation over a single stream.
//!
//! Inbound messages are prefixed with the identity of the peer they came
//! from. Outbound messages name their destination in the first frame; a
//! message for an unknown identity is dropped, or rejected with
//! `EHOSTUNREACH` when `router_mandatory` is set.

use crate::base::SocketBase;
use crate::pattern::{PeerKey, RouterTable};
use bytes::Bytes;
use compio::io::{AsyncRead, AsyncWrite};
use compio::net::TcpStream;
use std::io;
use tessera_core::socket_type::SocketType;
use tracing::{debug, trace};

const PEER: PeerKey = 0;

/// Identity-addressed socket.
pub struct RouterSocket<S = TcpStream>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    base: SocketBase<S>,
    table: RouterTable,
}

impl<S> RouterSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn from_base(base: SocketBase<S>) -> Self {
        let mut table = RouterTable::new(base.options().router_mandatory);
        // An empty table never refuses an identity.
        if let Ok(identity) = table.attach(PEER, base.peer_identity().cloned()) {
            debug!(identity = ?identity, "[ROUTER] peer routing id");
        }
        Self { base, table }
    }

    /// Identity the connected peer is addressed by.
    pub fn peer_routing_id(&self) -> Option<&Bytes> {
        self.table.identity_of(PEER)
    }

    pub fn set_router_mandatory(&mut self, mandatory: bool) {
        self.table.set_mandatory(mandatory);
    }

    /// Receive `[identity, frames...]`.
    pub async fn recv(&mut self) -> io::Result<Option<Vec<Bytes>>> {
        loop {
            let Some(msg) = self.base.recv_message().await? else {
                return Ok(None);
            };
            if let Some(tagged) = self.table.tag_inbound(PEER, msg) {
                return Ok(Some(tagged));
            }
        }
    }

    /// Send `[identity, frames...]` to the peer holding `identity`.
    pub async fn send(&mut self, msg: Vec<Bytes>) -> io::Result<()> {
        match self.table.route(msg)? {
            Some((_, body)) => {
                trace!("[ROUTER] Sending {} frames", body.len());
                self.base.send_message(&body).await
            }
            None => Ok(()),
        }
    }
}

stream_socket_common!(RouterSocket, SocketType::Router);
crate::impl_socket_trait!(RouterSocket<S>, SocketType::Router);

//! PUB socket implementation.
//!
//! A PUB owns any number of subscriber streams. Each one is handshaken on
//! [`attach`](PubSocket::attach) and gets a [`PeerKey`]. Subscriptions
//! arrive as messages on those streams and are applied with
//! [`recv_subscription`](PubSocket::recv_subscription); [`send`](PubSocket::send)
//! writes a message to every peer with a matching prefix.
//!
//! ```text
//!                 ┌── peer 1 (sub "weather")
//! send(msg) ─ Fanout ── peer 2 (sub "")
//!                 └── peer 3 (no subscription: skipped)
//! ```

use std::collections::BTreeMap;
use std::io;

use bytes::Bytes;
use compio::io::{AsyncRead, AsyncWrite};
use compio::net::TcpStream;
use tessera_core::endpoint::Endpoint;
use tessera_core::message::total_bytes;
use tessera_core::monitor::{create_monitor, emit, SocketEvent, SocketEventSender, SocketMonitor};
use tessera_core::options::SocketOptions;
use tessera_core::socket_type::SocketType;
use tessera_core::subscription::SubscriptionEvent;
use tracing::{debug, trace, warn};

use crate::base::SocketBase;
use crate::macros::not_supported;
use crate::pattern::{Fanout, PeerKey};
use crate::transport::TcpAcceptor;

/// Multi-subscriber publish socket.
pub struct PubSocket<S = TcpStream>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    peers: BTreeMap<PeerKey, SocketBase<S>>,
    fanout: Fanout,
    next_key: PeerKey,
    options: SocketOptions,
    monitor: Option<SocketEventSender>,
}

impl<S> PubSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new() -> Self {
        Self::with_options(SocketOptions::default())
    }

    /// Options given here apply to every attached peer.
    pub fn with_options(options: SocketOptions) -> Self {
        Self {
            peers: BTreeMap::new(),
            fanout: Fanout::new(),
            next_key: 1,
            options,
            monitor: None,
        }
    }

    #[inline]
    pub const fn socket_type(&self) -> SocketType {
        SocketType::Pub
    }

    #[inline]
    pub const fn options(&self) -> &SocketOptions {
        &self.options
    }

    pub fn monitor(&mut self) -> SocketMonitor {
        let (tx, rx) = create_monitor();
        self.monitor = Some(tx);
        rx
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn peers(&self) -> impl Iterator<Item = PeerKey> + '_ {
        self.peers.keys().copied()
    }

    pub fn subscription_count(&self) -> usize {
        self.fanout.subscription_count()
    }

    /// Handshake a subscriber stream and add it.
    pub async fn attach(&mut self, stream: S) -> io::Result<PeerKey> {
        self.attach_from(stream, None).await
    }

    async fn attach_from(&mut self, stream: S, endpoint: Option<Endpoint>) -> io::Result<PeerKey> {
        let base = match SocketBase::handshake(stream, SocketType::Pub, self.options.clone()).await {
            Ok(base) => base,
            Err(e) => {
                if let Some(ep) = endpoint {
                    emit(
                        self.monitor.as_ref(),
                        SocketEvent::HandshakeFailed {
                            endpoint: ep,
                            reason: e.to_string(),
                        },
                    );
                }
                return Err(e);
            }
        };

        let key = self.next_key;
        self.next_key += 1;
        let base = match endpoint {
            Some(ep) => base.with_endpoint(ep),
            None => base,
        };
        self.peers.insert(key, base);
        self.fanout.add_peer(key);
        debug!(peer = key, peers = self.peers.len(), "[PUB] subscriber attached");
        Ok(key)
    }

    fn remove_peer(&mut self, peer: PeerKey) {
        self.fanout.remove_peer(peer);
        if let Some(base) = self.peers.remove(&peer) {
            if let Some(ep) = base.last_endpoint() {
                emit(self.monitor.as_ref(), SocketEvent::Disconnected(ep.clone()));
            }
        }
        debug!(peer, "[PUB] subscriber removed");
    }

    /// Read messages from `peer` until one is a subscription change, and
    /// apply it.
    ///
    /// Returns `Ok(None)` when the peer disconnected; it is removed.
    pub async fn recv_subscription(&mut self, peer: PeerKey) -> io::Result<Option<SubscriptionEvent>> {
        loop {
            let Some(base) = self.peers.get_mut(&peer) else {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no subscriber with key {peer}"),
                ));
            };
            let msg = match base.recv_message().await {
                Ok(Some(msg)) => msg,
                Ok(None) => {
                    self.remove_peer(peer);
                    return Ok(None);
                }
                Err(e) => {
                    if !base.is_connected() {
                        self.remove_peer(peer);
                    }
                    return Err(e);
                }
            };
            if let Some(event) = self.fanout.handle_message(peer, &msg) {
                return Ok(Some(event));
            }
        }
    }

    /// Publish `msg` to every matching subscriber.
    ///
    /// Peers whose stream fails are dropped; the send itself still succeeds.
    pub async fn send(&mut self, msg: Vec<Bytes>) -> io::Result<()> {
        if msg.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot send a message with no frames",
            ));
        }
        self.options.check_msg_size(total_bytes(&msg))?;

        let targets = self.fanout.targets(&msg);
        trace!(targets = targets.len(), "[PUB] publishing");

        let mut dead = Vec::new();
        for peer in targets {
            let Some(base) = self.peers.get_mut(&peer) else {
                continue;
            };
            if let Err(e) = base.send_message(&msg).await {
                if base.is_connected() && !base.is_poisoned() {
                    trace!(peer, error = %e, "[PUB] message dropped for peer");
                } else {
                    warn!(peer, error = %e, "[PUB] subscriber failed");
                    dead.push(peer);
                }
            }
        }
        for peer in dead {
            self.remove_peer(peer);
        }
        Ok(())
    }

    /// Always fails with `Unsupported`.
    pub async fn recv(&mut self) -> io::Result<Option<Vec<Bytes>>> {
        Err(not_supported(SocketType::Pub, "recv"))
    }

    /// Close every subscriber stream.
    pub async fn close(&mut self) -> io::Result<()> {
        for base in self.peers.values_mut() {
            base.close().await?;
        }
        self.peers.clear();
        self.fanout = Fanout::new();
        Ok(())
    }
}

impl<S> Default for PubSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn default() -> Self {
        Self::new()
    }
}

impl PubSocket<TcpStream> {
    /// Accept one subscriber from `acceptor`.
    pub async fn accept(&mut self, acceptor: &TcpAcceptor) -> io::Result<PeerKey> {
        let (stream, addr) = acceptor.accept().await?;
        self.attach_from(stream, Some(Endpoint::Tcp(addr))).await
    }

    /// Connect out to a binding subscriber.
    pub async fn connect(&mut self, endpoint: &str) -> io::Result<PeerKey> {
        let stream = crate::transport::connect_tcp(endpoint, &self.options).await?;
        let addr = stream.peer_addr()?;
        self.attach_from(stream, Some(Endpoint::Tcp(addr))).await
    }
}

crate::impl_socket_trait!(PubSocket<S>, SocketType::Pub);

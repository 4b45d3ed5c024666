//! PUSH socket implementation
//!
//! PUSH distributes messages round-robin over every attached PULL peer. A
//! peer whose stream fails is dropped and the message goes to the next one.

use std::collections::HashMap;
use std::io;

use bytes::Bytes;
use compio::io::{AsyncRead, AsyncWrite};
use compio::net::TcpStream;
use tessera_core::endpoint::Endpoint;
use tessera_core::monitor::{create_monitor, emit, SocketEvent, SocketEventSender, SocketMonitor};
use tessera_core::options::SocketOptions;
use tessera_core::socket_type::SocketType;
use tracing::{debug, trace, warn};

use crate::base::SocketBase;
use crate::macros::not_supported;
use crate::pattern::{LoadBalancer, PeerKey};
use crate::transport::TcpAcceptor;

/// Round-robin send socket for pipelines.
pub struct PushSocket<S = TcpStream>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    peers: HashMap<PeerKey, SocketBase<S>>,
    balancer: LoadBalancer,
    next_key: PeerKey,
    options: SocketOptions,
    monitor: Option<SocketEventSender>,
}

impl<S> PushSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new() -> Self {
        Self::with_options(SocketOptions::default())
    }

    pub fn with_options(options: SocketOptions) -> Self {
        Self {
            peers: HashMap::new(),
            balancer: LoadBalancer::new(),
            next_key: 1,
            options,
            monitor: None,
        }
    }

    #[inline]
    pub const fn socket_type(&self) -> SocketType {
        SocketType::Push
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

    /// Handshake a PULL stream and add it to the rotation.
    pub async fn attach(&mut self, stream: S) -> io::Result<PeerKey> {
        self.attach_from(stream, None).await
    }

    async fn attach_from(&mut self, stream: S, endpoint: Option<Endpoint>) -> io::Result<PeerKey> {
        let base = match SocketBase::handshake(stream, SocketType::Push, self.options.clone()).await {
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
        self.balancer.add(key);
        debug!(peer = key, "[PUSH] peer attached");
        Ok(key)
    }

    fn remove_peer(&mut self, peer: PeerKey) {
        self.balancer.remove(peer);
        if let Some(base) = self.peers.remove(&peer) {
            if let Some(ep) = base.last_endpoint() {
                emit(self.monitor.as_ref(), SocketEvent::Disconnected(ep.clone()));
            }
        }
    }

    /// Send `msg` to the next peer in rotation.
    ///
    /// Fails with `NotConnected` when no live peer is left.
    pub async fn send(&mut self, msg: Vec<Bytes>) -> io::Result<()> {
        while let Some(peer) = self.balancer.next_peer() {
            let Some(base) = self.peers.get_mut(&peer) else {
                self.balancer.remove(peer);
                continue;
            };
            match base.send_message(&msg).await {
                Ok(()) => {
                    trace!(peer, "[PUSH] sent {} frames", msg.len());
                    return Ok(());
                }
                Err(e) if base.is_connected() && !base.is_poisoned() => return Err(e),
                Err(e) => {
                    warn!(peer, error = %e, "[PUSH] peer failed, trying next");
                    self.remove_peer(peer);
                }
            }
        }
        Err(io::Error::new(io::ErrorKind::NotConnected, "no PULL peer attached"))
    }

    /// Always fails with `Unsupported`.
    pub async fn recv(&mut self) -> io::Result<Option<Vec<Bytes>>> {
        Err(not_supported(SocketType::Push, "recv"))
    }

    pub async fn close(&mut self) -> io::Result<()> {
        for base in self.peers.values_mut() {
            base.close().await?;
        }
        self.peers.clear();
        self.balancer = LoadBalancer::new();
        Ok(())
    }
}

impl<S> Default for PushSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn default() -> Self {
        Self::new()
    }
}

impl PushSocket<TcpStream> {
    /// Accept one PULL peer from `acceptor`.
    pub async fn accept(&mut self, acceptor: &TcpAcceptor) -> io::Result<PeerKey> {
        let (stream, addr) = acceptor.accept().await?;
        self.attach_from(stream, Some(Endpoint::Tcp(addr))).await
    }

    /// Connect to a binding PULL peer.
    pub async fn connect(&mut self, endpoint: &str) -> io::Result<PeerKey> {
        let stream = crate::transport::connect_tcp(endpoint, &self.options).await?;
        let addr = stream.peer_addr()?;
        self.attach_from(stream, Some(Endpoint::Tcp(addr))).await
    }
}

crate::impl_socket_trait!(PushSocket<S>, SocketType::Push);

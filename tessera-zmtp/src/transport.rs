//! Connection setup for TCP and IPC endpoints.
//!
//! Everything here deals with raw streams only. The ZMTP handshake runs
//! later, when a socket type takes ownership of the stream.

use std::io;
use std::net::SocketAddr;

use compio::net::{TcpListener, TcpStream};
use tessera_core::endpoint::{Endpoint, EndpointError};
use tessera_core::monitor::{emit, SocketEvent, SocketEventSender};
use tessera_core::options::SocketOptions;
use tessera_core::reconnect::ReconnectState;
use tessera_core::tcp::{enable_tcp_keepalive, enable_tcp_nodelay};
use tracing::{debug, trace, warn};

#[cfg(unix)]
use compio::net::{UnixListener, UnixStream};
#[cfg(unix)]
use std::path::PathBuf;

/// Lifecycle of a single peer connection.
///
/// A socket only exists once its handshake has completed, so it starts out
/// `Active`.
///
/// ```text
/// Active -> Closed
///    \-> Poisoned
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Active,
    Closed,
    /// A send was cancelled mid-frame; the stream is unusable.
    Poisoned,
}

impl ConnectionState {
    #[inline]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

fn endpoint_error(err: EndpointError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, err)
}

fn wrong_transport(expected: &str, endpoint: &Endpoint) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{} endpoint {endpoint} cannot be used as {expected}", endpoint.scheme()),
    )
}

/// Parse `endpoint` and require a `tcp://` address.
pub fn tcp_addr(endpoint: &str, options: &SocketOptions) -> io::Result<SocketAddr> {
    let parsed = Endpoint::parse(endpoint).map_err(endpoint_error)?;
    parsed.check_ipv6(options.ipv6).map_err(endpoint_error)?;
    match parsed {
        Endpoint::Tcp(addr) => Ok(addr),
        other => Err(wrong_transport("tcp", &other)),
    }
}

/// Parse `endpoint` and require an `ipc://` path.
#[cfg(unix)]
pub fn ipc_path(endpoint: &str) -> io::Result<PathBuf> {
    match Endpoint::parse(endpoint).map_err(endpoint_error)? {
        Endpoint::Ipc(path) => Ok(path),
        other => Err(wrong_transport("ipc", &other)),
    }
}

/// Connect to a `tcp://host:port` endpoint.
///
/// Honors `connect_timeout` (zero waits for the OS) and enables
/// TCP_NODELAY on the resulting stream.
pub async fn connect_tcp(endpoint: &str, options: &SocketOptions) -> io::Result<TcpStream> {
    let addr = tcp_addr(endpoint, options)?;
    trace!(%addr, "[TRANSPORT] connecting");

    let stream = if options.connect_timeout.is_zero() {
        TcpStream::connect(addr).await?
    } else {
        match compio::time::timeout(options.connect_timeout, TcpStream::connect(addr)).await {
            Ok(res) => res?,
            Err(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("connect to {addr} timed out after {:?}", options.connect_timeout),
                ));
            }
        }
    };

    enable_tcp_nodelay(&stream)?;
    if options.tcp_keepalive {
        enable_tcp_keepalive(&stream)?;
    }
    debug!(%addr, "[TRANSPORT] tcp connected");
    Ok(stream)
}

/// Connect to an `ipc:///path` endpoint.
#[cfg(unix)]
pub async fn connect_ipc(endpoint: &str, options: &SocketOptions) -> io::Result<UnixStream> {
    let path = ipc_path(endpoint)?;
    let connect = tessera_core::ipc::connect(&path);
    let stream = if options.connect_timeout.is_zero() {
        connect.await?
    } else {
        compio::time::timeout(options.connect_timeout, connect)
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "ipc connect timed out"))??
    };
    debug!(path = %path.display(), "[TRANSPORT] ipc connected");
    Ok(stream)
}

/// Connect over TCP, retrying with backoff.
///
/// Makes at most `attempts` tries (at least one). Waits between tries
/// follow `reconnect_ivl` doubling up to `reconnect_ivl_max`. Outcomes are
/// reported to `monitor` when one is attached.
pub async fn connect_tcp_with_retry(
    endpoint: &str,
    options: &SocketOptions,
    attempts: u32,
    monitor: Option<&SocketEventSender>,
) -> io::Result<TcpStream> {
    let addr = tcp_addr(endpoint, options)?;
    let mut backoff = ReconnectState::new(options);
    let attempts = attempts.max(1);

    let mut last_err = None;
    for attempt in 0..attempts {
        if attempt > 0 {
            let delay = backoff.next_delay();
            debug!(attempt, ?delay, %addr, "[TRANSPORT] retrying connect");
            compio::time::sleep(delay).await;
        }

        match connect_tcp(endpoint, options).await {
            Ok(stream) => {
                emit(monitor, SocketEvent::Connected(Endpoint::Tcp(addr)));
                return Ok(stream);
            }
            Err(e) => {
                emit(
                    monitor,
                    SocketEvent::ConnectFailed {
                        endpoint: Endpoint::Tcp(addr),
                        reason: e.to_string(),
                    },
                );
                last_err = Some(e);
            }
        }
    }

    warn!(%addr, attempts, "[TRANSPORT] giving up on connect");
    Err(last_err.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotConnected)))
}

/// Listening TCP endpoint.
pub struct TcpAcceptor {
    listener: TcpListener,
    local: Endpoint,
    keepalive: bool,
    monitor: Option<SocketEventSender>,
}

impl TcpAcceptor {
    /// Bind to a `tcp://` endpoint. Port 0 picks a free port; the chosen
    /// port is visible through [`local_endpoint`](Self::local_endpoint).
    pub async fn bind(endpoint: &str) -> io::Result<Self> {
        Self::bind_with_options(endpoint, &SocketOptions::default()).await
    }

    pub async fn bind_with_options(endpoint: &str, options: &SocketOptions) -> io::Result<Self> {
        let addr = tcp_addr(endpoint, options)?;
        let listener = TcpListener::bind(addr).await?;
        let local = Endpoint::Tcp(listener.local_addr()?);
        debug!(endpoint = %local, "[TRANSPORT] tcp bound");
        Ok(Self {
            listener,
            local,
            keepalive: options.tcp_keepalive,
            monitor: None,
        })
    }

    /// Report `Bound` and `Accepted` events to `monitor`.
    #[must_use]
    pub fn with_monitor(self, monitor: SocketEventSender) -> Self {
        emit(Some(&monitor), SocketEvent::Bound(self.local.clone()));
        Self {
            monitor: Some(monitor),
            ..self
        }
    }

    /// Wait for the next connection.
    pub async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        let (stream, peer) = self.listener.accept().await?;
        enable_tcp_nodelay(&stream)?;
        if self.keepalive {
            enable_tcp_keepalive(&stream)?;
        }
        trace!(%peer, "[TRANSPORT] tcp accepted");
        emit(self.monitor.as_ref(), SocketEvent::Accepted(Endpoint::Tcp(peer)));
        Ok((stream, peer))
    }

    /// The bound address with any port 0 resolved.
    pub fn local_endpoint(&self) -> &Endpoint {
        &self.local
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// Listening Unix domain socket endpoint.
///
/// The socket file is removed before binding and again on drop.
#[cfg(unix)]
pub struct IpcAcceptor {
    listener: UnixListener,
    path: PathBuf,
    monitor: Option<SocketEventSender>,
}

#[cfg(unix)]
impl IpcAcceptor {
    pub async fn bind(endpoint: &str) -> io::Result<Self> {
        let path = ipc_path(endpoint)?;
        let listener = tessera_core::ipc::bind(&path).await?;
        debug!(path = %path.display(), "[TRANSPORT] ipc bound");
        Ok(Self {
            listener,
            path,
            monitor: None,
        })
    }

    #[must_use]
    pub fn with_monitor(mut self, monitor: SocketEventSender) -> Self {
        emit(Some(&monitor), SocketEvent::Bound(self.local_endpoint()));
        self.monitor = Some(monitor);
        self
    }

    pub async fn accept(&self) -> io::Result<UnixStream> {
        let stream = tessera_core::ipc::accept(&self.listener).await?;
        emit(self.monitor.as_ref(), SocketEvent::Accepted(self.local_endpoint()));
        Ok(stream)
    }

    pub fn local_endpoint(&self) -> Endpoint {
        Endpoint::Ipc(self.path.clone())
    }
}

#[cfg(unix)]
impl Drop for IpcAcceptor {
    fn drop(&mut self) {
        if let Err(e) = tessera_core::ipc::remove_stale(&self.path) {
            warn!(path = %self.path.display(), error = %e, "[TRANSPORT] failed to remove socket file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tessera_core::monitor::create_monitor;

    #[test]
    fn rejects_mismatched_schemes() {
        let opts = SocketOptions::default();
        let err = tcp_addr("inproc://workers", &opts).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);

        let err = tcp_addr("udp://127.0.0.1:1", &opts).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        let err = tcp_addr("tcp://[::1]:5555", &opts).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(tcp_addr("tcp://[::1]:5555", &opts.clone().with_ipv6(true)).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn ipc_requires_ipc_scheme() {
        assert_eq!(
            ipc_path("tcp://127.0.0.1:1").unwrap_err().kind(),
            io::ErrorKind::Unsupported
        );
        assert!(ipc_path("ipc:///tmp/x.sock").is_ok());
    }

    #[compio::test]
    async fn acceptor_resolves_port_zero() {
        let (tx, rx) = create_monitor();
        let acceptor = TcpAcceptor::bind("tcp://127.0.0.1:0").await.unwrap().with_monitor(tx);
        let Endpoint::Tcp(addr) = acceptor.local_endpoint().clone() else {
            panic!("expected tcp endpoint");
        };
        assert_ne!(addr.port(), 0);
        assert!(matches!(rx.try_recv().unwrap(), SocketEvent::Bound(_)));

        let ep = acceptor.local_endpoint().to_string();
        let client = compio::runtime::spawn(async move {
            connect_tcp(&ep, &SocketOptions::default()).await
        });
        let (_server, _peer) = acceptor.accept().await.unwrap();
        let _client = client.await.unwrap();
        assert!(matches!(rx.try_recv().unwrap(), SocketEvent::Accepted(_)));
    }

    #[compio::test]
    async fn retry_reports_failures() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let acceptor = TcpAcceptor::bind("tcp://127.0.0.1:0").await.unwrap();
            acceptor.local_addr().unwrap().port()
        };
        let (tx, rx) = create_monitor();
        let opts = SocketOptions::default().with_reconnect_ivl(Duration::from_millis(1));
        let ep = format!("tcp://127.0.0.1:{port}");
        assert!(connect_tcp_with_retry(&ep, &opts, 2, Some(&tx)).await.is_err());
        let failures = rx.try_iter().filter(|e| matches!(e, SocketEvent::ConnectFailed { .. })).count();
        assert_eq!(failures, 2);
    }

    #[cfg(unix)]
    #[compio::test]
    async fn ipc_acceptor_cleans_up() {
        let path = std::env::temp_dir().join(format!("tessera_transport_{}.sock", std::process::id()));
        let ep = format!("ipc://{}", path.display());
        {
            let acceptor = IpcAcceptor::bind(&ep).await.unwrap();
            assert!(path.exists());
            let ep2 = ep.clone();
            let client = compio::runtime::spawn(async move {
                connect_ipc(&ep2, &SocketOptions::default()).await
            });
            let _server = acceptor.accept().await.unwrap();
            let _client = client.await.unwrap();
        }
        assert!(!path.exists());
    }
}

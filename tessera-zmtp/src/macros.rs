/// Constructors and accessors shared by every single-stream socket.
///
/// The socket type must be a struct `Name<S>` with a `base: SocketBase<S>`
/// field and a `fn from_base(base: SocketBase<S>) -> Self`.
macro_rules! stream_socket_common {
    ($name:ident, $kind:expr) => {
        impl<S> $name<S>
        where
            S: compio::io::AsyncRead + compio::io::AsyncWrite + Unpin,
        {
            /// Handshake over an already connected stream with default options.
            pub async fn new(stream: S) -> std::io::Result<Self> {
                Self::with_options(stream, tessera_core::options::SocketOptions::default()).await
            }

            /// Handshake over an already connected stream.
            pub async fn with_options(
                stream: S,
                options: tessera_core::options::SocketOptions,
            ) -> std::io::Result<Self> {
                let base = $crate::base::SocketBase::handshake(stream, $kind, options).await?;
                Ok(Self::from_base(base))
            }

            #[inline]
            pub const fn socket_type(&self) -> tessera_core::socket_type::SocketType {
                $kind
            }

            #[inline]
            pub const fn options(&self) -> &tessera_core::options::SocketOptions {
                self.base.options()
            }

            pub fn set_recv_timeout(&mut self, timeout: Option<std::time::Duration>) {
                self.base.set_recv_timeout(timeout);
            }

            pub fn set_send_timeout(&mut self, timeout: Option<std::time::Duration>) {
                self.base.set_send_timeout(timeout);
            }

            #[inline]
            pub const fn peer_socket_type(&self) -> tessera_core::socket_type::SocketType {
                self.base.peer_socket_type()
            }

            #[inline]
            pub fn peer_identity(&self) -> Option<&bytes::Bytes> {
                self.base.peer_identity()
            }

            #[inline]
            pub const fn is_connected(&self) -> bool {
                self.base.is_connected()
            }

            #[inline]
            pub const fn state(&self) -> $crate::transport::ConnectionState {
                self.base.state()
            }

            #[inline]
            pub const fn last_endpoint(&self) -> Option<&tessera_core::endpoint::Endpoint> {
                self.base.last_endpoint()
            }

            #[inline]
            pub const fn has_more(&self) -> bool {
                self.base.has_more()
            }

            /// Start reporting `Disconnected` / `Closed` events.
            pub fn monitor(&mut self) -> tessera_core::monitor::SocketMonitor {
                self.base.monitor()
            }

            pub async fn close(&mut self) -> std::io::Result<()> {
                self.base.close().await
            }
        }

        impl $name<compio::net::TcpStream> {
            /// Connect to a `tcp://` endpoint and handshake.
            pub async fn connect(
                endpoint: &str,
                options: tessera_core::options::SocketOptions,
            ) -> std::io::Result<Self> {
                let stream = $crate::transport::connect_tcp(endpoint, &options).await?;
                let peer = tessera_core::endpoint::Endpoint::Tcp(stream.peer_addr()?);
                let base = $crate::base::SocketBase::handshake(stream, $kind, options).await?;
                Ok(Self::from_base(base.with_endpoint(peer)))
            }

            /// Accept one connection from `acceptor` and handshake.
            pub async fn accept(
                acceptor: &$crate::transport::TcpAcceptor,
                options: tessera_core::options::SocketOptions,
            ) -> std::io::Result<Self> {
                let (stream, addr) = acceptor.accept().await?;
                let base = $crate::base::SocketBase::handshake(stream, $kind, options).await?;
                Ok(Self::from_base(
                    base.with_endpoint(tessera_core::endpoint::Endpoint::Tcp(addr)),
                ))
            }

            /// Bind `endpoint` and accept the first connection.
            ///
            /// The acceptor is returned so further peers can be accepted.
            pub async fn bind(
                endpoint: &str,
                options: tessera_core::options::SocketOptions,
            ) -> std::io::Result<($crate::transport::TcpAcceptor, Self)> {
                let acceptor =
                    $crate::transport::TcpAcceptor::bind_with_options(endpoint, &options).await?;
                let socket = Self::accept(&acceptor, options).await?;
                Ok((acceptor, socket))
            }
        }

        #[cfg(unix)]
        impl $name<compio::net::UnixStream> {
            /// Connect to an `ipc://` endpoint and handshake.
            pub async fn connect_ipc(
                endpoint: &str,
                options: tessera_core::options::SocketOptions,
            ) -> std::io::Result<Self> {
                let path = $crate::transport::ipc_path(endpoint)?;
                let stream = $crate::transport::connect_ipc(endpoint, &options).await?;
                let base = $crate::base::SocketBase::handshake(stream, $kind, options).await?;
                Ok(Self::from_base(
                    base.with_endpoint(tessera_core::endpoint::Endpoint::Ipc(path)),
                ))
            }

            /// Accept one connection from `acceptor` and handshake.
            pub async fn accept_ipc(
                acceptor: &$crate::transport::IpcAcceptor,
                options: tessera_core::options::SocketOptions,
            ) -> std::io::Result<Self> {
                let stream = acceptor.accept().await?;
                let base = $crate::base::SocketBase::handshake(stream, $kind, options).await?;
                Ok(Self::from_base(base.with_endpoint(acceptor.local_endpoint())))
            }
        }
    };
}

/// Error for an operation the socket type does not support.
pub(crate) fn not_supported(kind: tessera_core::socket_type::SocketType, op: &str) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        format!("{op} is not supported on {kind} sockets"),
    )
}

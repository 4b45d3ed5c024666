//! Uniform async interface over every socket type.
//!
//! Lets generic code such as [`proxy`](crate::proxy::proxy) move messages
//! between sockets without knowing their pattern.

use bytes::Bytes;
use std::io;

use crate::SocketType;

/// Common send/receive surface.
///
/// Operations a socket type does not support (`recv` on PUB, `send` on SUB,
/// ...) fail with `ErrorKind::Unsupported`.
///
/// ```no_run
/// use tessera_zmtp::Socket;
/// use std::io;
///
/// async fn drain<S: Socket>(from: &mut S) -> io::Result<usize> {
///     let mut n = 0;
///     while from.recv().await?.is_some() {
///         n += 1;
///     }
///     Ok(n)
/// }
/// ```
#[async_trait::async_trait(?Send)]
pub trait Socket {
    /// Send one multipart message.
    async fn send(&mut self, msg: Vec<Bytes>) -> io::Result<()>;

    /// Receive one multipart message; `Ok(None)` once the peer is gone.
    async fn recv(&mut self) -> io::Result<Option<Vec<Bytes>>>;

    fn socket_type(&self) -> SocketType;
}

/// Implement [`Socket`] by forwarding to a type's inherent `send`/`recv`.
///
/// ```ignore
/// impl_socket_trait!(DealerSocket<S>, SocketType::Dealer);
/// ```
#[macro_export]
macro_rules! impl_socket_trait {
    ($socket_type:ty, $zmq_type:expr) => {
        #[async_trait::async_trait(?Send)]
        impl<S> $crate::Socket for $socket_type
        where
            S: compio::io::AsyncRead + compio::io::AsyncWrite + Unpin + 'static,
        {
            async fn send(&mut self, msg: Vec<bytes::Bytes>) -> std::io::Result<()> {
                self.send(msg).await
            }

            async fn recv(&mut self) -> std::io::Result<Option<Vec<bytes::Bytes>>> {
                self.recv().await
            }

            fn socket_type(&self) -> $crate::SocketType {
                $zmq_type
            }
        }
    };
}

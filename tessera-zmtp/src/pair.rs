//! PAIR socket implementation
//!
//! PAIR sockets are exclusive peer-to-peer sockets that connect exactly two
//! endpoints. Messages pass in both directions without routing or filtering.

use crate::base::SocketBase;
use bytes::Bytes;
use compio::io::{AsyncRead, AsyncWrite};
use compio::net::TcpStream;
use std::io;
use tessera_core::socket_type::SocketType;
use tracing::trace;

/// PAIR socket for exclusive peer-to-peer communication.
///
/// ```rust,no_run
/// use tessera_zmtp::PairSocket;
/// use tessera_core::options::SocketOptions;
/// use bytes::Bytes;
///
/// # async fn example() -> std::io::Result<()> {
/// let mut pair = PairSocket::connect("tcp://127.0.0.1:5555", SocketOptions::default()).await?;
/// pair.send(vec![Bytes::from_static(b"hi")]).await?;
/// let reply = pair.recv().await?;
/// # Ok(())
/// # }
/// ```
pub struct PairSocket<S = TcpStream>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    base: SocketBase<S>,
}

impl<S> PairSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn from_base(base: SocketBase<S>) -> Self {
        Self { base }
    }

    pub async fn send(&mut self, msg: Vec<Bytes>) -> io::Result<()> {
        trace!("[PAIR] Sending {} frames", msg.len());
        self.base.send_message(&msg).await
    }

    /// Receive the next message; `Ok(None)` once the peer is gone.
    pub async fn recv(&mut self) -> io::Result<Option<Vec<Bytes>>> {
        self.base.recv_message().await
    }
}

stream_socket_common!(PairSocket, SocketType::Pair);
crate::impl_socket_trait!(PairSocket<S>, SocketType::Pair);

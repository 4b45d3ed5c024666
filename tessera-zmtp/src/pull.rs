//! PULL socket implementation
//!
//! PULL sockets are the receive-only end of a pipeline, fed by PUSH.

use crate::base::SocketBase;
use crate::macros::not_supported;
use bytes::Bytes;
use compio::io::{AsyncRead, AsyncWrite};
use compio::net::TcpStream;
use std::io;
use tessera_core::socket_type::SocketType;

/// PULL socket for receiving messages in a pipeline.
pub struct PullSocket<S = TcpStream>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    base: SocketBase<S>,
}

impl<S> PullSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn from_base(base: SocketBase<S>) -> Self {
        Self { base }
    }

    pub async fn recv(&mut self) -> io::Result<Option<Vec<Bytes>>> {
        self.base.recv_message().await
    }

    /// Always fails with `Unsupported`.
    pub async fn send(&mut self, _msg: Vec<Bytes>) -> io::Result<()> {
        Err(not_supported(SocketType::Pull, "send"))
    }
}

stream_socket_common!(PullSocket, SocketType::Pull);
crate::impl_socket_trait!(PullSocket<S>, SocketType::Pull);

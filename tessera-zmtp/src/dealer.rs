//! DEALER socket implementation
//!
//! DEALER is the asynchronous counterpart of REQ: any number of sends and
//! receives in any order, with frames passed through untouched. Talking to
//! a REP peer therefore requires the caller to add the empty delimiter
//! frame itself.

use crate::base::SocketBase;
use bytes::Bytes;
use compio::io::{AsyncRead, AsyncWrite};
use compio::net::TcpStream;
use std::io;
use tessera_core::socket_type::SocketType;
use tracing::trace;

/// Asynchronous request/reply socket.
pub struct DealerSocket<S = TcpStream>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    base: SocketBase<S>,
}

impl<S> DealerSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn from_base(base: SocketBase<S>) -> Self {
        Self { base }
    }

    pub async fn send(&mut self, msg: Vec<Bytes>) -> io::Result<()> {
        trace!("[DEALER] Sending {} frames", msg.len());
        self.base.send_message(&msg).await
    }

    pub async fn recv(&mut self) -> io::Result<Option<Vec<Bytes>>> {
        let msg = self.base.recv_message().await?;
        if let Some(frames) = &msg {
            trace!("[DEALER] Received {} frames", frames.len());
        }
        Ok(msg)
    }
}

stream_socket_common!(DealerSocket, SocketType::Dealer);
crate::impl_socket_trait!(DealerSocket<S>, SocketType::Dealer);

//! REP socket implementation.
//!
//! REP strips the routing envelope from each request, hands the body to the
//! application and puts the same envelope back on the reply.

use crate::base::SocketBase;
use crate::pattern::{RepEnvelope, RepState};
use bytes::Bytes;
use compio::io::{AsyncRead, AsyncWrite};
use compio::net::TcpStream;
use std::io;
use tessera_core::socket_type::SocketType;
use tracing::trace;

/// Synchronous reply socket.
///
/// ```text
/// AwaitingRequest → recv() → ReadyToReply → send() → AwaitingRequest
/// ```
pub struct RepSocket<S = TcpStream>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    base: SocketBase<S>,
    envelope: RepEnvelope,
}

impl<S> RepSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn from_base(base: SocketBase<S>) -> Self {
        Self {
            base,
            envelope: RepEnvelope::new(),
        }
    }

    #[inline]
    pub const fn rep_state(&self) -> RepState {
        self.envelope.state()
    }

    /// Receive the next request body.
    pub async fn recv(&mut self) -> io::Result<Option<Vec<Bytes>>> {
        if self.envelope.state() == RepState::ReadyToReply {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Cannot receive while a reply is pending - must call send() first",
            ));
        }
        loop {
            let Some(msg) = self.base.recv_message().await? else {
                return Ok(None);
            };
            if let Some(body) = self.envelope.accept_request(msg)? {
                trace!("[REP] Request with {} frames", body.len());
                return Ok(Some(body));
            }
        }
    }

    /// Reply to the request last received.
    pub async fn send(&mut self, msg: Vec<Bytes>) -> io::Result<()> {
        let wire = self.envelope.prepare_reply(msg)?;
        trace!("[REP] Sending {} frames", wire.len());
        self.base.send_message(&wire).await
    }
}

stream_socket_common!(RepSocket, SocketType::Rep);
crate::impl_socket_trait!(RepSocket<S>, SocketType::Rep);

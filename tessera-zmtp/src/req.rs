//! REQ socket implementation.
//!
//! ```text
//! Application
//!     ↕
//! ReqSocket ── ReqStateMachine (alternation, envelope)
//!     ↕
//! SocketBase (ZmtpDecoder + SegmentedBuffer)
//!     ↕
//! compio stream
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use tessera_zmtp::ReqSocket;
//! use tessera_core::options::SocketOptions;
//! use bytes::Bytes;
//!
//! #[compio::main]
//! async fn main() -> std::io::Result<()> {
//!     let mut socket = ReqSocket::connect("tcp://127.0.0.1:5555", SocketOptions::default()).await?;
//!     socket.send(vec![Bytes::from_static(b"Hello")]).await?;
//!     let reply = socket.recv().await?;
//!     Ok(())
//! }
//! ```

use crate::base::SocketBase;
use crate::pattern::{ReqState, ReqStateMachine};
use bytes::Bytes;
use compio::io::{AsyncRead, AsyncWrite};
use compio::net::TcpStream;
use std::io;
use tessera_core::socket_type::SocketType;
use tracing::{debug, trace};

/// Synchronous request socket.
///
/// ```text
/// Idle → send() → AwaitingReply → recv() → Idle
/// ```
///
/// Calling `send` twice or `recv` before `send` fails with `InvalidInput`,
/// unless `req_relaxed` is set on the options.
pub struct ReqSocket<S = TcpStream>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    base: SocketBase<S>,
    machine: ReqStateMachine,
}

impl<S> ReqSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn from_base(base: SocketBase<S>) -> Self {
        let machine = ReqStateMachine::from_options(base.options());
        Self { base, machine }
    }

    #[inline]
    pub const fn req_state(&self) -> ReqState {
        self.machine.state()
    }

    /// Send a request.
    pub async fn send(&mut self, msg: Vec<Bytes>) -> io::Result<()> {
        if msg.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "request must have at least one frame",
            ));
        }
        let wire = self.machine.prepare_request(msg)?;
        trace!("[REQ] Sending {} frames", wire.len());
        if let Err(e) = self.base.send_message(&wire).await {
            self.machine.reset();
            return Err(e);
        }
        Ok(())
    }

    /// Receive the reply to the last request.
    ///
    /// `Ok(None)` means the peer closed the connection; the outstanding
    /// request is forgotten.
    pub async fn recv(&mut self) -> io::Result<Option<Vec<Bytes>>> {
        if self.machine.state() != ReqState::AwaitingReply {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "Cannot receive before sending a request",
            ));
        }

        loop {
            let Some(msg) = self.base.recv_message().await? else {
                debug!("[REQ] Peer closed while awaiting reply");
                self.machine.reset();
                return Ok(None);
            };
            if let Some(body) = self.machine.accept_reply(msg)? {
                trace!("[REQ] Reply with {} frames", body.len());
                return Ok(Some(body));
            }
        }
    }
}

stream_socket_common!(ReqSocket, SocketType::Req);
crate::impl_socket_trait!(ReqSocket<S>, SocketType::Req);

//! One-way message forwarding between two sockets.
//!
//! ```text
//! PULL (frontend) ──> PUSH (backend)
//! SUB  (frontend) ──> PUB  (backend)
//! ```
//!
//! ```no_run
//! use tessera_zmtp::proxy::proxy;
//! use tessera_zmtp::{PullSocket, PushSocket, transport::TcpAcceptor};
//! use tessera_core::options::SocketOptions;
//!
//! #[compio::main]
//! async fn main() -> std::io::Result<()> {
//!     let mut frontend = PullSocket::connect("tcp://127.0.0.1:5557", SocketOptions::default()).await?;
//!     let mut backend: PushSocket = PushSocket::new();
//!     let workers = TcpAcceptor::bind("tcp://127.0.0.1:5558").await?;
//!     backend.accept(&workers).await?;
//!     let forwarded = proxy(&mut frontend, &mut backend).await?;
//!     println!("forwarded {forwarded} messages");
//!     Ok(())
//! }
//! ```

use std::io;

use tracing::{debug, trace};

use crate::Socket;

/// Forward every message from `frontend` to `backend` until the frontend
/// peer disconnects. Returns the number of messages forwarded.
///
/// # Errors
///
/// The first send or receive error ends the proxy.
pub async fn proxy<F, B>(frontend: &mut F, backend: &mut B) -> io::Result<u64>
where
    F: Socket + ?Sized,
    B: Socket + ?Sized,
{
    proxy_with_capture(frontend, backend, None::<&mut B>).await
}

/// Like [`proxy`], also sending a copy of each message to `capture`.
pub async fn proxy_with_capture<F, B, C>(
    frontend: &mut F,
    backend: &mut B,
    mut capture: Option<&mut C>,
) -> io::Result<u64>
where
    F: Socket + ?Sized,
    B: Socket + ?Sized,
    C: Socket + ?Sized,
{
    debug!(
        frontend = %frontend.socket_type(),
        backend = %backend.socket_type(),
        "[PROXY] starting"
    );

    let mut forwarded = 0u64;
    while let Some(msg) = frontend.recv().await? {
        if let Some(cap) = capture.as_deref_mut() {
            cap.send(msg.clone()).await?;
        }
        trace!(frames = msg.len(), "[PROXY] forwarding");
        backend.send(msg).await?;
        forwarded += 1;
    }

    debug!(forwarded, "[PROXY] frontend closed");
    Ok(forwarded)
}

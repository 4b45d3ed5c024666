//! SUB socket implementation.
//!
//! Subscriptions are sent upstream as ZMTP 3.0 subscription messages and
//! also kept locally: only messages whose first frame starts with a
//! subscribed prefix are returned, whatever the publisher sends.

use crate::base::SocketBase;
use crate::macros::not_supported;
use bytes::Bytes;
use compio::io::{AsyncRead, AsyncWrite};
use compio::net::TcpStream;
use std::io;
use tessera_core::socket_type::SocketType;
use tessera_core::subscription::{SubscriptionEvent, SubscriptionSet};
use tracing::{debug, trace};

/// Topic-filtered receive socket.
///
/// ```rust,no_run
/// use tessera_zmtp::SubSocket;
/// use tessera_core::options::SocketOptions;
///
/// # async fn example() -> std::io::Result<()> {
/// let mut sub = SubSocket::connect("tcp://127.0.0.1:5556", SocketOptions::default()).await?;
/// sub.subscribe(b"weather.").await?;
/// while let Some(msg) = sub.recv().await? {
///     println!("{} frames", msg.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct SubSocket<S = TcpStream>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    base: SocketBase<S>,
    subscriptions: SubscriptionSet,
}

impl<S> SubSocket<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn from_base(base: SocketBase<S>) -> Self {
        Self {
            base,
            subscriptions: SubscriptionSet::new(),
        }
    }

    pub fn subscriptions(&self) -> &SubscriptionSet {
        &self.subscriptions
    }

    /// Subscribe to `prefix`. The empty prefix matches everything.
    ///
    /// Subscriptions are counted; the publisher is only told about the
    /// first one for a given prefix. If that message cannot be sent the
    /// local count is rolled back, so a retry sends it again.
    pub async fn subscribe(&mut self, prefix: &[u8]) -> io::Result<()> {
        let prefix = Bytes::copy_from_slice(prefix);
        if self.subscriptions.subscribe(prefix.clone()) {
            debug!(prefix = ?prefix, "[SUB] subscribing");
            let msg = SubscriptionEvent::Subscribe(prefix.clone()).to_message();
            if let Err(e) = self.base.send_message(&[msg]).await {
                self.subscriptions.unsubscribe(&prefix);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Drop one subscription to `prefix`. Unknown prefixes are ignored.
    ///
    /// The subscription stays in place when the upstream message fails.
    pub async fn unsubscribe(&mut self, prefix: &[u8]) -> io::Result<()> {
        if self.subscriptions.unsubscribe(prefix) {
            debug!(prefix = ?prefix, "[SUB] unsubscribing");
            let prefix = Bytes::copy_from_slice(prefix);
            let msg = SubscriptionEvent::Unsubscribe(prefix.clone()).to_message();
            if let Err(e) = self.base.send_message(&[msg]).await {
                self.subscriptions.subscribe(prefix);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Next message matching a local subscription.
    pub async fn recv(&mut self) -> io::Result<Option<Vec<Bytes>>> {
        loop {
            let Some(msg) = self.base.recv_message().await? else {
                return Ok(None);
            };
            let topic = msg.first().map_or(&[][..], |f| &f[..]);
            if self.subscriptions.matches(topic) {
                return Ok(Some(msg));
            }
            trace!("[SUB] Filtered out message");
        }
    }

    /// Always fails with `Unsupported`; use [`subscribe`](Self::subscribe).
    pub async fn send(&mut self, _msg: Vec<Bytes>) -> io::Result<()> {
        Err(not_supported(SocketType::Sub, "send"))
    }
}

stream_socket_common!(SubSocket, SocketType::Sub);
crate::impl_socket_trait!(SubSocket<S>, SocketType::Sub);

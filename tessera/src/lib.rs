//! # Tessera
//!
//! A standalone, ZeroMQ-compatible messaging core built on `compio`.
//!
//! ## Architecture
//!
//! Tessera is layered so each crate depends only on the one below:
//!
//! - **`tessera-core`**: errors, context, options, endpoints, buffers,
//!   subscriptions, reconnect backoff, monitoring
//! - **`tessera-zmtp`**: ZMTP 3.0 framing, handshake, transports and the
//!   messaging patterns
//! - **`tessera`**: public API surface and version symbols (this crate)
//!
//! Everything public in the lower crates is re-exported here, so consumers
//! only ever depend on `tessera`.
//!
//! ## Protocols (opt-in via features)
//!
//! - **`zmq`** (default) - ZMTP 3.0 sockets over TCP and IPC
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(feature = "zmq")]
//! use tessera::prelude::*;
//!
//! # #[cfg(feature = "zmq")]
//! # async fn example() -> std::io::Result<()> {
//! let (_acceptor, mut rep) = RepSocket::bind("tcp://127.0.0.1:5555", SocketOptions::default()).await?;
//!
//! while let Some(request) = rep.recv().await? {
//!     rep.send(request).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dev_tracing;

pub use bytes::Bytes;

pub use tessera_core::{
    buffer, config, context, endpoint, error, message, monitor, options, poison, reconnect,
    socket_type, subscription, tcp,
};

#[cfg(unix)]
pub use tessera_core::ipc;

pub use tessera_core::config::BufferConfig;
pub use tessera_core::context::{Context, ContextOption, SocketSlot};
pub use tessera_core::endpoint::{Endpoint, EndpointError};
pub use tessera_core::error::{errno, ContextReason, TesseraError};
pub use tessera_core::message::Message;
pub use tessera_core::monitor::{SocketEvent, SocketMonitor};
pub use tessera_core::options::SocketOptions;
pub use tessera_core::socket_type::SocketType;

#[cfg(feature = "zmq")]
pub mod zmq;

#[cfg(feature = "zmq")]
pub use zmq::{
    proxy, ConnectionState, DealerSocket, PairSocket, PubSocket, PullSocket, PushSocket,
    RepSocket, ReqSocket, RouterSocket, Socket, SubSocket,
};

/// Release version as a number, encoded `major * 10000 + minor * 100 + patch`.
pub const VERSION_NUMBER: f64 = (VERSION.0 * 10_000 + VERSION.1 * 100 + VERSION.2) as f64;

/// Release version as NUL-terminated text.
pub const VERSION_STRING: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();

/// ZMTP version spoken on the wire, as (major, minor).
pub const ZMTP_VERSION: (u8, u8) = (3, 0);

const VERSION: (u32, u32, u32) = (
    parse_component(env!("CARGO_PKG_VERSION_MAJOR")),
    parse_component(env!("CARGO_PKG_VERSION_MINOR")),
    parse_component(env!("CARGO_PKG_VERSION_PATCH")),
);

const fn parse_component(s: &str) -> u32 {
    let bytes = s.as_bytes();
    let mut value = 0u32;
    let mut i = 0;
    while i < bytes.len() {
        value = value * 10 + (bytes[i] - b'0') as u32;
        i += 1;
    }
    value
}

/// Library version as (major, minor, patch).
#[must_use]
pub const fn version() -> (u32, u32, u32) {
    VERSION
}

/// Library version text, without the trailing NUL.
#[must_use]
pub fn version_string() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Convenient imports.
///
/// ```rust
/// use tessera::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{Bytes, Context, ContextOption, Endpoint, SocketEvent, SocketOptions, SocketType};

    #[cfg(feature = "zmq")]
    pub use crate::zmq::prelude::*;
}

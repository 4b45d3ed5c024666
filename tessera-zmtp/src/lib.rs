//! # Tessera ZMTP
//!
//! ZMTP 3.0 framing, transports and messaging patterns.
//!
//! ## Layers
//!
//! - **Transport**: [`transport`] connects and accepts TCP / IPC streams,
//!   [`base::SocketBase`] moves whole messages over one handshaken stream
//! - **Framer**: [`codec`], [`greeting`], [`command`], [`handshake`],
//!   [`multipart`]
//! - **Patterns**: sans-IO state in [`pattern`], composed by the socket types
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tessera_zmtp::DealerSocket;
//! use tessera_core::options::SocketOptions;
//! use bytes::Bytes;
//!
//! #[compio::main]
//! async fn main() -> std::io::Result<()> {
//!     let mut socket = DealerSocket::connect("tcp://127.0.0.1:5555", SocketOptions::default()).await?;
//!     socket.send(vec![Bytes::from_static(b"Hello!")]).await?;
//!     let response = socket.recv().await?;
//!     Ok(())
//! }
//! ```

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

#[macro_use]
mod macros;

pub mod base;
pub mod codec;
pub mod command;
pub mod greeting;
pub mod handshake;
pub mod multipart;
pub mod pattern;
pub mod proxy;
pub mod socket_trait;
pub mod transport;

// Socket implementations
pub mod dealer;
pub mod pair;
pub mod publisher;
pub mod pull;
pub mod push;
pub mod rep;
pub mod req;
pub mod router;
pub mod subscriber;

pub use dealer::DealerSocket;
pub use pair::PairSocket;
pub use publisher::PubSocket;
pub use pull::PullSocket;
pub use push::PushSocket;
pub use rep::RepSocket;
pub use req::ReqSocket;
pub use router::RouterSocket;
pub use subscriber::SubSocket;

pub use socket_trait::Socket;
pub use tessera_core::socket_type::SocketType;
pub use transport::ConnectionState;

/// Prelude module for convenient imports
///
/// ```rust
/// use tessera_zmtp::prelude::*;
/// ```
pub mod prelude {
    pub use super::transport::TcpAcceptor;
    pub use super::{
        DealerSocket, PairSocket, PubSocket, PullSocket, PushSocket, RepSocket, ReqSocket,
        RouterSocket, Socket, SocketType, SubSocket,
    };
    pub use bytes::Bytes;
    pub use tessera_core::options::SocketOptions;
}

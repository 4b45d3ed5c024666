//! ZeroMQ (ZMTP 3.0) sockets.
//!
//! # Socket Types
//!
//! - [`PairSocket`] - exclusive bidirectional link
//! - [`ReqSocket`] / [`RepSocket`] - strict request-reply
//! - [`DealerSocket`] / [`RouterSocket`] - asynchronous request-reply, identity routing
//! - [`PubSocket`] / [`SubSocket`] - topic-filtered fan-out
//! - [`PushSocket`] / [`PullSocket`] - round-robin pipeline
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tessera::zmq::prelude::*;
//!
//! # async fn example() -> std::io::Result<()> {
//! let mut socket = DealerSocket::connect("tcp://127.0.0.1:5555", SocketOptions::default()).await?;
//! socket.send(vec![Bytes::from("REQUEST")]).await?;
//!
//! if let Some(reply) = socket.recv().await? {
//!     println!("Got reply: {reply:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub use tessera_zmtp::{
    base, codec, command, greeting, handshake, impl_socket_trait, multipart, pattern, proxy,
    socket_trait, transport,
};

pub use tessera_zmtp::{
    ConnectionState, DealerSocket, PairSocket, PubSocket, PullSocket, PushSocket, RepSocket,
    ReqSocket, RouterSocket, Socket, SocketType, SubSocket,
};

pub use tessera_zmtp::transport::TcpAcceptor;

#[cfg(unix)]
pub use tessera_zmtp::transport::IpcAcceptor;

/// Convenient imports for ZeroMQ sockets.
///
/// ```rust
/// use tessera::zmq::prelude::*;
/// ```
pub mod prelude {
    pub use tessera_zmtp::prelude::*;

    #[cfg(unix)]
    pub use tessera_zmtp::transport::IpcAcceptor;
}

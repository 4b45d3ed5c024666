//! Tessera Core
//!
//! Protocol-agnostic building blocks shared by the framing and pattern layers:
//! - Error types and error numbers (`error`)
//! - Context lifecycle and options (`context`)
//! - Socket options and buffer presets (`options`, `config`)
//! - Socket type table and endpoints (`socket_type`, `endpoint`)
//! - Zero-copy segmented receive buffer (`buffer`)
//! - Subscription index and filters (`subscription`)
//! - Multipart message builder (`message`)
//! - Reconnect backoff, poison guard, monitor events (`reconnect`, `poison`, `monitor`)
//! - TCP and IPC helpers (`tcp`, `ipc`)

// The tcp module needs raw fd/socket access for socket configuration
#![cfg_attr(not(test), deny(unsafe_code))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod buffer;
pub mod config;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod message;
pub mod monitor;
pub mod options;
pub mod poison;
pub mod reconnect;
pub mod socket_type;
pub mod subscription;
pub mod tcp;

#[cfg(unix)]
pub mod ipc;

/// Commonly used items.
pub mod prelude {
    pub use crate::buffer::SegmentedBuffer;
    pub use crate::config::BufferConfig;
    pub use crate::context::{Context, ContextOption, SocketSlot};
    pub use crate::endpoint::{Endpoint, EndpointError};
    pub use crate::error::{ContextReason, TesseraError};
    pub use crate::message::Message;
    pub use crate::monitor::{create_monitor, SocketEvent, SocketEventSender, SocketMonitor};
    pub use crate::options::SocketOptions;
    pub use crate::poison::PoisonGuard;
    pub use crate::reconnect::ReconnectState;
    pub use crate::socket_type::SocketType;
    pub use crate::subscription::{PeerKey, SubscriptionEvent, SubscriptionIndex, SubscriptionSet};
    pub use crate::tcp::{enable_tcp_keepalive, enable_tcp_nodelay};

    #[cfg(unix)]
    pub use crate::ipc;
}

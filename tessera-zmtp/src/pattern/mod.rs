//! Messaging pattern state, free of any I/O.
//!
//! Socket types feed received messages in and get back what to deliver or
//! where to write. Keeping these pure makes every rule testable without a
//! runtime:
//!
//! - [`ReqStateMachine`]: REQ alternation and envelope
//! - [`RepEnvelope`]: REP envelope save/restore
//! - [`RouterTable`]: ROUTER identity routing
//! - [`LoadBalancer`]: round-robin peer selection (PUSH, DEALER)
//! - [`Fanout`]: subscription-filtered delivery (PUB)

mod fanout;
mod load_balancer;
mod rep;
mod req;
mod router;

pub use fanout::Fanout;
pub use load_balancer::LoadBalancer;
pub use rep::{RepEnvelope, RepState};
pub use req::{ReqState, ReqStateMachine};
pub use router::RouterTable;

/// Local handle for a connected peer within one socket.
pub use tessera_core::subscription::PeerKey;

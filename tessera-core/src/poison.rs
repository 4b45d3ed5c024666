//! Cancellation guard for multi-step writes.
//!
//! A future dropped mid-write (a timeout, a `select!` losing branch) leaves
//! the stream with part of a frame on the wire. Nothing after that point can
//! be framed correctly, so the socket is marked poisoned and refuses I/O.
//!
//! The guard sets the flag when created and clears it only in
//! [`PoisonGuard::disarm`]; any other exit path leaves the flag set.
//!
//! ```rust
//! use tessera_core::poison::PoisonGuard;
//!
//! let mut poisoned = false;
//! {
//!     let guard = PoisonGuard::new(&mut poisoned);
//!     // write_all(...).await? would go here
//!     guard.disarm();
//! }
//! assert!(!poisoned);
//! ```

use std::io;

/// Marks a connection poisoned until explicitly disarmed.
pub struct PoisonGuard<'a> {
    flag: &'a mut bool,
}

impl<'a> PoisonGuard<'a> {
    #[inline]
    pub fn new(flag: &'a mut bool) -> Self {
        *flag = true;
        Self { flag }
    }

    /// Clear the poison flag. Call only after the whole write succeeded.
    #[inline]
    pub fn disarm(self) {
        *self.flag = false;
    }
}

/// Error returned by every operation on a poisoned socket.
#[must_use]
pub fn poisoned_error() -> io::Error {
    io::Error::new(
        io::ErrorKind::BrokenPipe,
        "socket poisoned by a cancelled write; reconnect required",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_guard_leaves_flag_set() {
        let mut poisoned = false;
        {
            let _guard = PoisonGuard::new(&mut poisoned);
        }
        assert!(poisoned);
    }

    #[test]
    fn disarm_clears_flag() {
        let mut poisoned = true;
        PoisonGuard::new(&mut poisoned).disarm();
        assert!(!poisoned);
    }

    #[test]
    fn error_kind_is_broken_pipe() {
        assert_eq!(poisoned_error().kind(), io::ErrorKind::BrokenPipe);
    }
}

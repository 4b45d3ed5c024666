//! Messaging context.
//!
//! A [`Context`] owns process-wide settings and counts the sockets created
//! under it. Handles are cheap to clone and may be shared across threads;
//! all clones see the same state. Terminating any handle terminates the
//! context for every clone, and dropping the last handle terminates it
//! implicitly.
//!
//! ```
//! use tessera_core::context::{Context, ContextOption};
//!
//! let ctx = Context::new().unwrap();
//! ctx.set(ContextOption::MaxSockets(8)).unwrap();
//! assert_eq!(
//!     ctx.get(ContextOption::MaxSockets(0)).unwrap(),
//!     ContextOption::MaxSockets(8)
//! );
//!
//! let slot = ctx.register_socket().unwrap();
//! assert_eq!(ctx.live_sockets(), 1);
//! drop(slot);
//!
//! ctx.terminate().unwrap();
//! assert!(ctx.terminate().is_err());
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::error::{ContextReason, Result, TesseraError};
use crate::options::SocketOptions;

pub const DEFAULT_IO_THREADS: i32 = 1;
pub const DEFAULT_MAX_SOCKETS: i32 = 1023;
/// Hard ceiling for `max_sockets`.
pub const SOCKET_LIMIT: i32 = 65535;

/// A context option together with its value.
///
/// For [`Context::get`] the carried value is ignored and the returned
/// variant holds the current setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextOption {
    /// Size of the I/O thread pool.
    IoThreads(i32),
    /// Maximum number of live sockets.
    MaxSockets(i32),
    /// Largest message sockets will accept; `None` is unlimited.
    MaxMessageSize(Option<usize>),
    /// Upper bound for `MaxSockets`. Read-only.
    SocketLimit(i32),
    /// Enable IPv6 on sockets created from this context.
    Ipv6(bool),
    /// Whether termination waits for pending messages.
    Blocky(bool),
    /// Scheduling policy for I/O threads; -1 leaves the OS default.
    ThreadSchedPolicy(i32),
    /// Name prefix for I/O threads.
    ThreadNamePrefix(String),
    /// Size in bytes of one in-memory message frame handle. Read-only.
    MessageHandleSize(usize),
}

impl ContextOption {
    /// Option name as used in log output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::IoThreads(_) => "io_threads",
            Self::MaxSockets(_) => "max_sockets",
            Self::MaxMessageSize(_) => "max_msg_size",
            Self::SocketLimit(_) => "socket_limit",
            Self::Ipv6(_) => "ipv6",
            Self::Blocky(_) => "blocky",
            Self::ThreadSchedPolicy(_) => "thread_sched_policy",
            Self::ThreadNamePrefix(_) => "thread_name_prefix",
            Self::MessageHandleSize(_) => "msg_t_size",
        }
    }

    /// Whether [`Context::set`] rejects this option.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::SocketLimit(_) | Self::MessageHandleSize(_))
    }
}

#[derive(Debug, Clone)]
struct Settings {
    io_threads: i32,
    max_sockets: i32,
    max_msg_size: Option<usize>,
    ipv6: bool,
    blocky: bool,
    thread_sched_policy: i32,
    thread_name_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            io_threads: DEFAULT_IO_THREADS,
            max_sockets: DEFAULT_MAX_SOCKETS,
            max_msg_size: None,
            ipv6: false,
            blocky: true,
            thread_sched_policy: -1,
            thread_name_prefix: String::new(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    settings: RwLock<Settings>,
    live_sockets: AtomicUsize,
    handles: AtomicUsize,
    terminated: AtomicBool,
}

impl Inner {
    fn check_alive(&self) -> Result<()> {
        if self.terminated.load(Ordering::Acquire) {
            Err(TesseraError::Context(ContextReason::InvalidContext))
        } else {
            Ok(())
        }
    }

    fn terminate(&self) -> Result<()> {
        if self.terminated.swap(true, Ordering::AcqRel) {
            return Err(TesseraError::Context(ContextReason::InvalidContext));
        }
        debug!(
            live_sockets = self.live_sockets.load(Ordering::Acquire),
            blocky = self.settings.read().blocky,
            "[CTX] terminated"
        );
        Ok(())
    }
}

/// Shared messaging context.
#[derive(Debug)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// Create a context with default settings.
    pub fn new() -> Result<Self> {
        let inner = Arc::new(Inner::default());
        inner.handles.store(1, Ordering::Release);
        debug!("[CTX] created");
        Ok(Self { inner })
    }

    /// Read an option. The value inside `option` is ignored.
    pub fn get(&self, option: ContextOption) -> Result<ContextOption> {
        self.inner.check_alive()?;
        let s = self.inner.settings.read();
        Ok(match option {
            ContextOption::IoThreads(_) => ContextOption::IoThreads(s.io_threads),
            ContextOption::MaxSockets(_) => ContextOption::MaxSockets(s.max_sockets),
            ContextOption::MaxMessageSize(_) => ContextOption::MaxMessageSize(s.max_msg_size),
            ContextOption::SocketLimit(_) => ContextOption::SocketLimit(SOCKET_LIMIT),
            ContextOption::Ipv6(_) => ContextOption::Ipv6(s.ipv6),
            ContextOption::Blocky(_) => ContextOption::Blocky(s.blocky),
            ContextOption::ThreadSchedPolicy(_) => {
                ContextOption::ThreadSchedPolicy(s.thread_sched_policy)
            }
            ContextOption::ThreadNamePrefix(_) => {
                ContextOption::ThreadNamePrefix(s.thread_name_prefix.clone())
            }
            ContextOption::MessageHandleSize(_) => {
                ContextOption::MessageHandleSize(std::mem::size_of::<Bytes>())
            }
        })
    }

    /// Change an option.
    pub fn set(&self, option: ContextOption) -> Result<()> {
        self.inner.check_alive()?;
        if option.is_read_only() {
            return Err(TesseraError::invalid_option(format!(
                "{} is read-only",
                option.name()
            )));
        }

        trace!(option = ?option, "[CTX] set");
        let mut s = self.inner.settings.write();
        match option {
            ContextOption::IoThreads(n) => {
                if n < 0 {
                    return Err(TesseraError::invalid_option(format!(
                        "io_threads must be >= 0 (got {n})"
                    )));
                }
                s.io_threads = n;
            }
            ContextOption::MaxSockets(n) => {
                if !(1..=SOCKET_LIMIT).contains(&n) {
                    return Err(TesseraError::invalid_option(format!(
                        "max_sockets must be in 1..={SOCKET_LIMIT} (got {n})"
                    )));
                }
                s.max_sockets = n;
            }
            ContextOption::MaxMessageSize(size) => s.max_msg_size = size,
            ContextOption::Ipv6(on) => s.ipv6 = on,
            ContextOption::Blocky(on) => s.blocky = on,
            ContextOption::ThreadSchedPolicy(p) => {
                if p < -1 {
                    return Err(TesseraError::invalid_option(format!(
                        "thread_sched_policy must be >= -1 (got {p})"
                    )));
                }
                s.thread_sched_policy = p;
            }
            ContextOption::ThreadNamePrefix(prefix) => s.thread_name_prefix = prefix,
            ContextOption::SocketLimit(_) | ContextOption::MessageHandleSize(_) => {}
        }
        Ok(())
    }

    /// Reserve a socket slot, enforcing `max_sockets`.
    ///
    /// The slot is released when the returned guard is dropped.
    pub fn register_socket(&self) -> Result<SocketSlot> {
        self.inner.check_alive()?;
        let max = usize::try_from(self.inner.settings.read().max_sockets).unwrap_or(0);

        let mut current = self.inner.live_sockets.load(Ordering::Acquire);
        loop {
            if current >= max {
                return Err(TesseraError::SocketLimitReached { max });
            }
            match self.inner.live_sockets.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        trace!(live = current + 1, "[CTX] socket registered");
        Ok(SocketSlot {
            inner: Arc::clone(&self.inner),
        })
    }

    /// Number of live socket slots.
    #[must_use]
    pub fn live_sockets(&self) -> usize {
        self.inner.live_sockets.load(Ordering::Acquire)
    }

    /// Socket options seeded from this context's settings.
    pub fn socket_options(&self) -> Result<SocketOptions> {
        self.inner.check_alive()?;
        let s = self.inner.settings.read();
        Ok(SocketOptions::default()
            .with_max_msg_size(s.max_msg_size)
            .with_ipv6(s.ipv6))
    }

    /// Terminate the context.
    ///
    /// Sockets already created keep working; new sockets and option access
    /// fail. Terminating twice fails with
    /// [`ContextReason::InvalidContext`].
    pub fn terminate(&self) -> Result<()> {
        self.inner.terminate()
    }

    /// Alias of [`terminate`](Self::terminate).
    pub fn destroy(&self) -> Result<()> {
        self.terminate()
    }

    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.inner.terminated.load(Ordering::Acquire)
    }
}

impl Clone for Context {
    fn clone(&self) -> Self {
        self.inner.handles.fetch_add(1, Ordering::AcqRel);
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        if self.inner.handles.fetch_sub(1, Ordering::AcqRel) == 1 && !self.is_terminated() {
            // Last handle: terminate implicitly; nothing to report on failure.
            let _ = self.inner.terminate();
        }
    }
}

/// Registration of one live socket in a [`Context`].
#[derive(Debug)]
pub struct SocketSlot {
    inner: Arc<Inner>,
}

impl Drop for SocketSlot {
    fn drop(&mut self) {
        let prev = self.inner.live_sockets.fetch_sub(1, Ordering::AcqRel);
        trace!(live = prev.saturating_sub(1), "[CTX] socket released");
    }
}

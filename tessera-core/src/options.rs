//! Socket configuration options
//!
//! Per-socket knobs in the spirit of `zmq_setsockopt`. Options are plain data
//! configured through a consuming builder and copied into each socket at
//! construction time; sockets never share an options value.

use std::io;
use std::time::Duration;

use bytes::Bytes;

/// Default limit on frames per multipart message.
pub const DEFAULT_MAX_FRAMES: usize = 1024;

/// Socket configuration options.
///
/// # Examples
///
/// ```
/// use tessera_core::options::SocketOptions;
/// use std::time::Duration;
///
/// let opts = SocketOptions::default()
///     .with_recv_timeout(Duration::from_secs(5))
///     .with_send_timeout(Duration::from_secs(5));
/// assert!(!opts.is_recv_nonblocking());
/// ```
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Receive timeout (ZMQ_RCVTIMEO)
    ///
    /// - `None`: block indefinitely (default)
    /// - `Some(Duration::ZERO)`: non-blocking, fail with `WouldBlock`
    /// - `Some(duration)`: fail with `TimedOut` once elapsed
    pub recv_timeout: Option<Duration>,

    /// Send timeout (ZMQ_SNDTIMEO), same semantics as `recv_timeout`.
    pub send_timeout: Option<Duration>,

    /// Maximum time to complete the ZMTP handshake (ZMQ_HANDSHAKE_IVL).
    ///
    /// `Duration::ZERO` disables the timeout.
    pub handshake_timeout: Duration,

    /// Time to wait for pending output on close (ZMQ_LINGER).
    pub linger: Option<Duration>,

    /// Initial reconnection delay (ZMQ_RECONNECT_IVL).
    pub reconnect_ivl: Duration,

    /// Cap for exponential reconnect backoff (ZMQ_RECONNECT_IVL_MAX).
    ///
    /// Zero disables backoff; `reconnect_ivl` is then used for every attempt.
    pub reconnect_ivl_max: Duration,

    /// TCP connect timeout (ZMQ_CONNECT_TIMEOUT). Zero uses the OS default.
    pub connect_timeout: Duration,

    /// Receive high water mark in messages (ZMQ_RCVHWM).
    pub recv_hwm: usize,

    /// Send high water mark in messages (ZMQ_SNDHWM).
    pub send_hwm: usize,

    /// Maximum total size of one inbound or outbound message (ZMQ_MAXMSGSIZE).
    ///
    /// `None` means unlimited.
    pub max_msg_size: Option<usize>,

    /// Maximum number of frames in one multipart message.
    pub max_frames: usize,

    /// Size of each read from the network, in bytes.
    pub read_buffer_size: usize,

    /// Initial capacity of the encode buffer, in bytes.
    pub write_buffer_size: usize,

    /// Identity announced in READY (ZMQ_ROUTING_ID).
    pub routing_id: Option<Bytes>,

    /// ROUTER: fail with EHOSTUNREACH instead of dropping (ZMQ_ROUTER_MANDATORY).
    pub router_mandatory: bool,

    /// REQ: allow a new request before the reply arrived (ZMQ_REQ_RELAXED).
    pub req_relaxed: bool,

    /// REQ: tag requests with a request id frame (ZMQ_REQ_CORRELATE).
    pub req_correlate: bool,

    /// Keep only the most recent inbound message (ZMQ_CONFLATE).
    pub conflate: bool,

    /// Allow IPv6 addresses when resolving endpoints (ZMQ_IPV6).
    pub ipv6: bool,

    /// Enable SO_KEEPALIVE on TCP streams (ZMQ_TCP_KEEPALIVE).
    pub tcp_keepalive: bool,
}

impl Default for SocketOptions {
    fn default() -> Self {
        Self {
            recv_timeout: None,
            send_timeout: None,
            handshake_timeout: Duration::from_secs(30),
            linger: Some(Duration::from_secs(30)),
            reconnect_ivl: Duration::from_millis(100),
            reconnect_ivl_max: Duration::ZERO,
            connect_timeout: Duration::ZERO,
            recv_hwm: 1000,
            send_hwm: 1000,
            max_msg_size: None,
            max_frames: DEFAULT_MAX_FRAMES,
            read_buffer_size: 8192,
            write_buffer_size: 8192,
            routing_id: None,
            router_mandatory: false,
            req_relaxed: false,
            req_correlate: false,
            conflate: false,
            ipv6: false,
            tcp_keepalive: false,
        }
    }
}

impl SocketOptions {
    /// Create new socket options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set receive timeout.
    ///
    /// ```
    /// use tessera_core::options::SocketOptions;
    /// use std::time::Duration;
    ///
    /// let opts = SocketOptions::new().with_recv_timeout(Duration::ZERO);
    /// assert!(opts.is_recv_nonblocking());
    /// ```
    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = Some(timeout);
        self
    }

    /// Set send timeout.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    /// Set handshake timeout.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set linger timeout.
    pub fn with_linger(mut self, linger: Option<Duration>) -> Self {
        self.linger = linger;
        self
    }

    /// Set reconnection interval.
    pub fn with_reconnect_ivl(mut self, ivl: Duration) -> Self {
        self.reconnect_ivl = ivl;
        self
    }

    /// Set maximum reconnection interval for exponential backoff.
    pub fn with_reconnect_ivl_max(mut self, max: Duration) -> Self {
        self.reconnect_ivl_max = max;
        self
    }

    /// Set connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_recv_hwm(mut self, hwm: usize) -> Self {
        self.recv_hwm = hwm;
        self
    }

    pub fn with_send_hwm(mut self, hwm: usize) -> Self {
        self.send_hwm = hwm;
        self
    }

    /// Set maximum message size.
    pub fn with_max_msg_size(mut self, size: Option<usize>) -> Self {
        self.max_msg_size = size;
        self
    }

    /// Set the multipart frame limit. Zero is clamped to one.
    pub fn with_max_frames(mut self, frames: usize) -> Self {
        self.max_frames = frames.max(1);
        self
    }

    /// Set the per-read buffer size. Zero is clamped to one.
    pub fn with_read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    pub fn with_write_buffer_size(mut self, size: usize) -> Self {
        self.write_buffer_size = size;
        self
    }

    /// Set both read and write buffer sizes. A zero read size is clamped to one.
    pub fn with_buffer_sizes(mut self, read_size: usize, write_size: usize) -> Self {
        self.read_buffer_size = read_size.max(1);
        self.write_buffer_size = write_size;
        self
    }

    /// Set socket routing ID / identity.
    ///
    /// ```
    /// use tessera_core::options::SocketOptions;
    /// use bytes::Bytes;
    ///
    /// let opts = SocketOptions::new()
    ///     .with_routing_id(Bytes::from_static(b"worker-01"));
    /// assert_eq!(opts.routing_id.as_deref(), Some(&b"worker-01"[..]));
    /// ```
    pub fn with_routing_id(mut self, id: Bytes) -> Self {
        self.routing_id = Some(id);
        self
    }

    pub fn with_router_mandatory(mut self, enabled: bool) -> Self {
        self.router_mandatory = enabled;
        self
    }

    pub fn with_req_relaxed(mut self, enabled: bool) -> Self {
        self.req_relaxed = enabled;
        self
    }

    pub fn with_req_correlate(mut self, enabled: bool) -> Self {
        self.req_correlate = enabled;
        self
    }

    /// Enable message conflation (keep only last message).
    pub fn with_conflate(mut self, enabled: bool) -> Self {
        self.conflate = enabled;
        self
    }

    pub fn with_ipv6(mut self, enabled: bool) -> Self {
        self.ipv6 = enabled;
        self
    }

    #[must_use]
    pub fn with_tcp_keepalive(mut self, enabled: bool) -> Self {
        self.tcp_keepalive = enabled;
        self
    }

    /// Check if receive operation should be non-blocking.
    pub fn is_recv_nonblocking(&self) -> bool {
        matches!(self.recv_timeout, Some(d) if d.is_zero())
    }

    /// Check if send operation should be non-blocking.
    pub fn is_send_nonblocking(&self) -> bool {
        matches!(self.send_timeout, Some(d) if d.is_zero())
    }

    /// Check a message size against `max_msg_size`.
    pub fn check_msg_size(&self, size: usize) -> io::Result<()> {
        match self.max_msg_size {
            Some(max) if size > max => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("message of {size} bytes exceeds max_msg_size {max}"),
            )),
            _ => Ok(()),
        }
    }

    /// Validate routing ID for use with ROUTER sockets.
    ///
    /// ROUTER socket identities must:
    /// - Be 1-255 bytes long
    /// - Not start with a null byte (reserved for generated identities)
    pub fn validate_router_identity(id: &[u8]) -> io::Result<()> {
        if id.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "routing ID cannot be empty",
            ));
        }

        if id.len() > 255 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("routing ID cannot exceed 255 bytes (got {})", id.len()),
            ));
        }

        if id[0] == 0x00 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "routing ID cannot start with null byte (reserved for generated IDs)",
            ));
        }

        Ok(())
    }

    /// Validate a routing ID announced by any socket type.
    ///
    /// Less strict than ROUTER identities: empty and null-prefixed are allowed.
    pub fn validate_routing_id(id: &[u8]) -> io::Result<()> {
        if id.len() > 255 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("routing ID cannot exceed 255 bytes (got {})", id.len()),
            ));
        }
        Ok(())
    }

    /// Reconnection interval for the given attempt.
    ///
    /// Doubles `reconnect_ivl` per attempt and caps at `reconnect_ivl_max`.
    pub fn next_reconnect_ivl(&self, attempt: u32) -> Duration {
        if self.reconnect_ivl_max.is_zero() {
            return self.reconnect_ivl;
        }

        let backoff = self
            .reconnect_ivl
            .saturating_mul(2u32.saturating_pow(attempt));

        backoff.min(self.reconnect_ivl_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = SocketOptions::default();
        assert!(opts.recv_timeout.is_none());
        assert!(opts.send_timeout.is_none());
        assert_eq!(opts.handshake_timeout, Duration::from_secs(30));
        assert_eq!(opts.reconnect_ivl, Duration::from_millis(100));
        assert_eq!(opts.max_frames, DEFAULT_MAX_FRAMES);
        assert!(!opts.req_relaxed);
        assert!(!opts.ipv6);
    }

    #[test]
    fn test_builder_pattern() {
        let opts = SocketOptions::new()
            .with_recv_timeout(Duration::from_secs(5))
            .with_send_timeout(Duration::from_secs(10))
            .with_max_frames(0)
            .with_req_relaxed(true)
            .with_req_correlate(true);

        assert_eq!(opts.recv_timeout, Some(Duration::from_secs(5)));
        assert_eq!(opts.send_timeout, Some(Duration::from_secs(10)));
        assert_eq!(opts.max_frames, 1);
        assert!(opts.req_relaxed && opts.req_correlate);
    }

    #[test]
    fn test_nonblocking_checks() {
        let blocking = SocketOptions::new();
        assert!(!blocking.is_recv_nonblocking());
        assert!(!blocking.is_send_nonblocking());

        let nonblocking = SocketOptions::new()
            .with_recv_timeout(Duration::ZERO)
            .with_send_timeout(Duration::ZERO);
        assert!(nonblocking.is_recv_nonblocking());
        assert!(nonblocking.is_send_nonblocking());
    }

    #[test]
    fn test_msg_size_check() {
        let unlimited = SocketOptions::new();
        assert!(unlimited.check_msg_size(usize::MAX).is_ok());

        let limited = SocketOptions::new().with_max_msg_size(Some(16));
        assert!(limited.check_msg_size(16).is_ok());
        let err = limited.check_msg_size(17).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_exponential_backoff() {
        let opts = SocketOptions::new()
            .with_reconnect_ivl(Duration::from_millis(100))
            .with_reconnect_ivl_max(Duration::from_secs(10));

        assert_eq!(opts.next_reconnect_ivl(0), Duration::from_millis(100));
        assert_eq!(opts.next_reconnect_ivl(1), Duration::from_millis(200));
        assert_eq!(opts.next_reconnect_ivl(2), Duration::from_millis(400));
        assert_eq!(opts.next_reconnect_ivl(10), Duration::from_secs(10));
    }

    #[test]
    fn test_no_exponential_backoff() {
        let opts = SocketOptions::new().with_reconnect_ivl(Duration::from_millis(100));
        assert_eq!(opts.next_reconnect_ivl(0), Duration::from_millis(100));
        assert_eq!(opts.next_reconnect_ivl(10), Duration::from_millis(100));
    }

    #[test]
    fn test_routing_id_validation() {
        assert!(SocketOptions::validate_router_identity(b"client-001").is_ok());
        assert!(SocketOptions::validate_router_identity(&[0x01; 255]).is_ok());
        assert!(SocketOptions::validate_router_identity(b"").is_err());
        assert!(SocketOptions::validate_router_identity(&[0x01; 256]).is_err());
        assert!(SocketOptions::validate_router_identity(b"\x00client").is_err());

        assert!(SocketOptions::validate_routing_id(b"").is_ok());
        assert!(SocketOptions::validate_routing_id(b"\x00client").is_ok());
        assert!(SocketOptions::validate_routing_id(&[0x01; 256]).is_err());
    }
}

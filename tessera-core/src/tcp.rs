//! TCP socket tuning.
//!
//! compio streams do not expose `set_nodelay`, so the raw descriptor is
//! borrowed into a `socket2::Socket` for the duration of the call.

#![allow(unsafe_code)]

use std::io;
use std::mem::ManuallyDrop;

/// Disable Nagle's algorithm on a connected stream.
///
/// Request/reply traffic is latency bound; small frames must not wait for
/// coalescing.
///
/// # Errors
///
/// Returns an error if the socket option cannot be set.
#[inline]
pub fn enable_tcp_nodelay(stream: &compio::net::TcpStream) -> io::Result<()> {
    with_socket2(stream, |sock| sock.set_nodelay(true))
}

/// Turn on SO_KEEPALIVE so half-open peers are eventually detected.
pub fn enable_tcp_keepalive(stream: &compio::net::TcpStream) -> io::Result<()> {
    with_socket2(stream, |sock| sock.set_keepalive(true))
}

fn with_socket2<T>(
    stream: &compio::net::TcpStream,
    f: impl FnOnce(&socket2::Socket) -> io::Result<T>,
) -> io::Result<T> {
    #[cfg(unix)]
    {
        use std::os::unix::io::{AsRawFd, FromRawFd};
        // SAFETY: the fd stays owned by `stream`; ManuallyDrop keeps socket2
        // from closing it.
        let sock = ManuallyDrop::new(unsafe { socket2::Socket::from_raw_fd(stream.as_raw_fd()) });
        f(&sock)
    }

    #[cfg(windows)]
    {
        use std::os::windows::io::{AsRawSocket, FromRawSocket};
        // SAFETY: as above, the socket stays owned by `stream`.
        let sock = ManuallyDrop::new(unsafe {
            socket2::Socket::from_raw_socket(stream.as_raw_socket())
        });
        f(&sock)
    }

    #[cfg(not(any(unix, windows)))]
    {
        let _ = (stream, f);
        Err(io::Error::from(io::ErrorKind::Unsupported))
    }
}

//! Stream-level plumbing shared by every single-peer socket type.
//!
//! `SocketBase<S>` owns the connected stream after the handshake and turns
//! it into whole multipart messages in both directions. Socket types
//! compose it and add their pattern logic on top.

use std::fmt;
use std::io;
use std::time::Instant;

use bytes::Bytes;
use compio::buf::BufResult;
use compio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use compio::net::TcpStream;
use tessera_core::buffer::SegmentedBuffer;
use tessera_core::endpoint::Endpoint;
use tessera_core::message::total_bytes;
use tessera_core::monitor::{create_monitor, emit, SocketEvent, SocketEventSender, SocketMonitor};
use tessera_core::options::SocketOptions;
use tessera_core::poison::{poisoned_error, PoisonGuard};
use tessera_core::socket_type::SocketType;
use tracing::{debug, trace, warn};

use crate::codec::{encode_multipart, ZmtpDecoder, ZmtpFrame};
use crate::handshake::{perform_handshake, HandshakeResult};
use crate::multipart::MultipartBuffer;
use crate::transport::ConnectionState;

/// Connection state and buffers for one handshaken peer.
pub struct SocketBase<S = TcpStream>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// `None` once the peer is gone or the socket was closed.
    pub(crate) stream: Option<S>,
    pub(crate) decoder: ZmtpDecoder,
    pub(crate) recv: SegmentedBuffer,
    pub(crate) assembler: MultipartBuffer,
    /// Reused encode buffer; handed to the kernel and given back by compio.
    pub(crate) write_buf: Vec<u8>,
    pub(crate) options: SocketOptions,
    pub(crate) socket_type: SocketType,
    pub(crate) peer: HandshakeResult,
    pub(crate) endpoint: Option<Endpoint>,
    pub(crate) monitor: Option<SocketEventSender>,
    pub(crate) is_poisoned: bool,
    state: ConnectionState,
}

impl<S> SocketBase<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Run the ZMTP handshake on `stream` and wrap it.
    ///
    /// The local identity comes from `options.routing_id`. Handshake errors
    /// are reported as `ErrorKind::Other` carrying the protocol message.
    pub async fn handshake(
        mut stream: S,
        socket_type: SocketType,
        options: SocketOptions,
    ) -> io::Result<Self> {
        if let Some(id) = &options.routing_id {
            SocketOptions::validate_routing_id(id)?;
        }

        trace!(socket_type = %socket_type, "[SocketBase] handshaking");
        let peer = perform_handshake(
            &mut stream,
            socket_type,
            options.routing_id.as_deref(),
            options.handshake_timeout,
        )
        .await
        .map_err(|e| io::Error::other(format!("Handshake failed: {e}")))?;

        debug!(
            socket_type = %socket_type,
            peer = %peer.peer_socket_type,
            "[SocketBase] handshake complete"
        );
        Ok(Self::from_parts(stream, socket_type, peer, options))
    }

    /// Wrap a stream whose handshake already completed.
    pub(crate) fn from_parts(
        stream: S,
        socket_type: SocketType,
        peer: HandshakeResult,
        options: SocketOptions,
    ) -> Self {
        let max_frame = options.max_msg_size.map(|m| m as u64);
        Self {
            stream: Some(stream),
            decoder: ZmtpDecoder::with_max_frame_size(max_frame),
            recv: SegmentedBuffer::new(),
            assembler: MultipartBuffer::new(options.max_frames, options.max_msg_size),
            write_buf: Vec::with_capacity(options.write_buffer_size),
            options,
            socket_type,
            peer,
            endpoint: None,
            monitor: None,
            is_poisoned: false,
            state: ConnectionState::Active,
        }
    }

    /// Remember the endpoint this stream was connected to or accepted from.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Start reporting lifecycle events. Replaces any previous monitor.
    pub fn monitor(&mut self) -> SocketMonitor {
        let (tx, rx) = create_monitor();
        self.monitor = Some(tx);
        rx
    }

    #[inline]
    pub const fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    #[inline]
    pub const fn is_poisoned(&self) -> bool {
        self.is_poisoned
    }

    /// Current connection state. A poisoned flag wins over everything else.
    #[inline]
    pub const fn state(&self) -> ConnectionState {
        if self.is_poisoned {
            ConnectionState::Poisoned
        } else {
            self.state
        }
    }

    #[inline]
    pub const fn options(&self) -> &SocketOptions {
        &self.options
    }

    pub fn set_recv_timeout(&mut self, timeout: Option<std::time::Duration>) {
        self.options.recv_timeout = timeout;
    }

    pub fn set_send_timeout(&mut self, timeout: Option<std::time::Duration>) {
        self.options.send_timeout = timeout;
    }

    #[inline]
    pub const fn socket_type(&self) -> SocketType {
        self.socket_type
    }

    #[inline]
    pub const fn peer_socket_type(&self) -> SocketType {
        self.peer.peer_socket_type
    }

    /// Identity the peer announced in READY, if any.
    #[inline]
    pub fn peer_identity(&self) -> Option<&Bytes> {
        self.peer.peer_identity.as_ref()
    }

    #[inline]
    pub const fn last_endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// MORE flag of the last data frame decoded.
    #[inline]
    pub const fn has_more(&self) -> bool {
        self.decoder.has_more()
    }

    fn mark_closed(&mut self, why: &str) {
        self.stream = None;
        if self.state != ConnectionState::Closed {
            debug!(socket_type = %self.socket_type, why, "[SocketBase] connection closed");
            self.state = ConnectionState::Closed;
            if let Some(ep) = &self.endpoint {
                emit(self.monitor.as_ref(), SocketEvent::Disconnected(ep.clone()));
            }
        }
    }

    /// Read whatever the kernel has into the recv buffer.
    ///
    /// Returns `Ok(0)` on EOF. `deadline` bounds the wait.
    async fn read_raw(&mut self, deadline: Option<Instant>) -> io::Result<usize> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "Socket not connected"));
        };

        // A zero-capacity read would come back as Ok(0) and look like EOF.
        let buf = Vec::with_capacity(self.options.read_buffer_size.max(1));
        let BufResult(result, buf) = match deadline {
            None => AsyncRead::read(stream, buf).await,
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(recv_timed_out());
                }
                match compio::time::timeout(remaining, AsyncRead::read(stream, buf)).await {
                    Ok(res) => res,
                    Err(_) => return Err(recv_timed_out()),
                }
            }
        };

        match result {
            Ok(0) => {
                self.mark_closed("eof");
                Ok(0)
            }
            Ok(n) => {
                trace!(n, "[SocketBase] read");
                self.recv.push(Bytes::from(buf));
                Ok(n)
            }
            Err(e) => {
                self.mark_closed("read error");
                Err(e)
            }
        }
    }

    /// Decode one frame from what is already buffered.
    ///
    /// A framing error leaves the stream unusable, so it is dropped.
    fn decode_buffered(&mut self) -> io::Result<Option<ZmtpFrame>> {
        match self.decoder.decode(&mut self.recv) {
            Ok(frame) => Ok(frame),
            Err(e) => {
                warn!(error = %e, "[SocketBase] framing error, dropping connection");
                self.recv.clear();
                self.mark_closed("protocol error");
                Err(e.into())
            }
        }
    }

    fn recv_deadline(&self) -> Option<Instant> {
        self.options.recv_timeout.map(|d| Instant::now() + d)
    }

    /// Read a single frame, command frames included.
    ///
    /// `Ok(None)` means the peer closed the connection.
    pub async fn read_frame(&mut self) -> io::Result<Option<ZmtpFrame>> {
        if self.is_poisoned {
            return Err(poisoned_error());
        }
        let deadline = self.recv_deadline();
        loop {
            if let Some(frame) = self.decode_buffered()? {
                return Ok(Some(frame));
            }
            if self.stream.is_none() {
                return Ok(None);
            }
            if self.options.is_recv_nonblocking() {
                return Err(would_block());
            }
            if self.read_raw(deadline).await? == 0 {
                return Ok(None);
            }
        }
    }

    /// Receive one complete multipart message.
    ///
    /// - `recv_timeout == None` waits indefinitely
    /// - `Some(ZERO)` returns `WouldBlock` unless a message is already buffered
    /// - otherwise `TimedOut` once the timeout elapses
    ///
    /// `Ok(None)` means the peer closed the connection. Messages violating
    /// `max_frames` or `max_msg_size` fail with `InvalidData` and are
    /// skipped; the connection stays up.
    ///
    /// With `conflate` set, every complete message already buffered is
    /// decoded and only the newest is returned.
    pub async fn recv_message(&mut self) -> io::Result<Option<Vec<Bytes>>> {
        if self.is_poisoned {
            return Err(poisoned_error());
        }
        let deadline = self.recv_deadline();
        let mut latest = None;
        loop {
            while let Some(frame) = self.decode_buffered()? {
                if let Some(msg) = self.assembler.push_frame(frame)? {
                    trace!(frames = msg.len(), "[SocketBase] message received");
                    if !self.options.conflate {
                        return Ok(Some(msg));
                    }
                    latest = Some(msg);
                }
            }
            if latest.is_some() {
                return Ok(latest);
            }
            if self.stream.is_none() {
                return Ok(None);
            }
            if self.options.is_recv_nonblocking() {
                return Err(would_block());
            }
            if self.read_raw(deadline).await? == 0 {
                return Ok(None);
            }
        }
    }

    /// Encode and write one multipart message.
    ///
    /// A write interrupted by cancellation or `send_timeout` poisons the
    /// socket: a partial frame may be on the wire, so every later call fails
    /// with `BrokenPipe`.
    pub async fn send_message(&mut self, msg: &[Bytes]) -> io::Result<()> {
        if self.is_poisoned {
            return Err(poisoned_error());
        }
        if msg.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot send a message with no frames",
            ));
        }
        self.options.check_msg_size(total_bytes(msg))?;
        if self.options.is_send_nonblocking() {
            return Err(io::Error::new(
                io::ErrorKind::WouldBlock,
                "Socket is in non-blocking mode and cannot send immediately",
            ));
        }

        let Some(stream) = self.stream.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "Socket not connected"));
        };

        let mut buf = std::mem::take(&mut self.write_buf);
        buf.clear();
        encode_multipart(msg, &mut buf);
        trace!(frames = msg.len(), bytes = buf.len(), "[SocketBase] sending");

        let guard = PoisonGuard::new(&mut self.is_poisoned);
        let BufResult(result, buf) = match self.options.send_timeout {
            None => stream.write_all(buf).await,
            Some(dur) => match compio::time::timeout(dur, stream.write_all(buf)).await {
                Ok(res) => res,
                Err(_) => {
                    // Guard stays armed: the frame may be half written.
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("Send operation timed out after {dur:?}"),
                    ));
                }
            },
        };
        guard.disarm();
        self.write_buf = buf;

        if let Err(e) = result {
            self.mark_closed("write error");
            return Err(e);
        }
        Ok(())
    }

    /// Shut the stream down and drop it. Safe to call more than once.
    ///
    /// `linger` bounds how long the write-side shutdown may take.
    pub async fn close(&mut self) -> io::Result<()> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };

        let res = match self.options.linger {
            None => AsyncWrite::shutdown(&mut stream).await,
            Some(linger) => compio::time::timeout(linger, AsyncWrite::shutdown(&mut stream))
                .await
                .unwrap_or(Ok(())),
        };
        if let Err(e) = res {
            trace!(error = %e, "[SocketBase] shutdown failed");
        }
        drop(stream);

        self.state = ConnectionState::Closed;
        if let Some(ep) = &self.endpoint {
            emit(self.monitor.as_ref(), SocketEvent::Closed(ep.clone()));
        }
        debug!(socket_type = %self.socket_type, "[SocketBase] closed");
        Ok(())
    }
}

fn recv_timed_out() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "Receive operation timed out")
}

fn would_block() -> io::Error {
    io::Error::new(
        io::ErrorKind::WouldBlock,
        "Socket is in non-blocking mode and no message is available",
    )
}

impl<S> fmt::Debug for SocketBase<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketBase")
            .field("socket_type", &self.socket_type)
            .field("peer", &self.peer.peer_socket_type)
            .field("state", &self.state())
            .field("buffered", &self.recv.len())
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

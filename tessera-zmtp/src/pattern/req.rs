use bytes::Bytes;
use tessera_core::error::TesseraError;
use tessera_core::options::SocketOptions;
use tracing::{debug, trace};

/// REQ socket state for enforcing strict request-reply pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReqState {
    /// Ready to send a request
    Idle,
    /// Waiting for a reply after sending request
    AwaitingReply,
}

/// REQ envelope and alternation rules.
///
/// ```text
/// Idle -> prepare_request -> AwaitingReply -> accept_reply -> Idle
/// ```
///
/// Outbound requests get an empty delimiter frame in front. With
/// `correlate` a 4-byte request id goes before the delimiter and replies
/// carrying any other id are discarded. With `relaxed` a new request may be
/// sent while a reply is still outstanding; the old one is abandoned.
#[derive(Debug, Clone)]
pub struct ReqStateMachine {
    state: ReqState,
    relaxed: bool,
    correlate: bool,
    request_id: u32,
}

impl ReqStateMachine {
    pub const fn new(relaxed: bool, correlate: bool) -> Self {
        Self {
            state: ReqState::Idle,
            relaxed,
            correlate,
            request_id: 0,
        }
    }

    pub const fn from_options(options: &SocketOptions) -> Self {
        Self::new(options.req_relaxed, options.req_correlate)
    }

    #[inline]
    pub const fn state(&self) -> ReqState {
        self.state
    }

    /// Id of the request currently in flight (0 before the first send).
    #[inline]
    pub const fn request_id(&self) -> u32 {
        self.request_id
    }

    /// Wrap `body` for sending and move to `AwaitingReply`.
    ///
    /// Fails with `InvalidState` (EFSM) when a reply is outstanding and the
    /// machine is strict.
    pub fn prepare_request(&mut self, body: Vec<Bytes>) -> Result<Vec<Bytes>, TesseraError> {
        if self.state == ReqState::AwaitingReply {
            if !self.relaxed {
                return Err(TesseraError::invalid_state(
                    "Cannot send while awaiting reply - must call recv() first",
                ));
            }
            debug!(request_id = self.request_id, "[REQ] abandoning outstanding request");
        }

        self.request_id = self.request_id.wrapping_add(1);
        let mut out = Vec::with_capacity(body.len() + 2);
        if self.correlate {
            out.push(Bytes::copy_from_slice(&self.request_id.to_be_bytes()));
        }
        out.push(Bytes::new());
        out.extend(body);

        self.state = ReqState::AwaitingReply;
        Ok(out)
    }

    /// Strip the envelope from an inbound reply.
    ///
    /// Returns `Ok(None)` for a stale reply that must be dropped while the
    /// caller keeps waiting (only possible with `correlate`).
    pub fn accept_reply(&mut self, msg: Vec<Bytes>) -> Result<Option<Vec<Bytes>>, TesseraError> {
        if self.state != ReqState::AwaitingReply {
            return Err(TesseraError::invalid_state(
                "Cannot receive before sending a request",
            ));
        }

        let mut frames = msg.into_iter();
        if self.correlate {
            let expected = self.request_id.to_be_bytes();
            match frames.next() {
                Some(id) if id[..] == expected[..] => {}
                other => {
                    trace!(got = ?other, "[REQ] dropping reply with foreign request id");
                    return Ok(None);
                }
            }
        }

        match frames.next() {
            Some(delim) if delim.is_empty() => {}
            _ => {
                return Err(TesseraError::protocol(
                    "reply is missing the empty delimiter frame",
                ))
            }
        }

        self.state = ReqState::Idle;
        Ok(Some(frames.collect()))
    }

    /// Forget the outstanding request (used after the peer disconnects).
    pub fn reset(&mut self) {
        self.state = ReqState::Idle;
    }
}

impl Default for ReqStateMachine {
    fn default() -> Self {
        Self::new(false, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(s: &'static str) -> Vec<Bytes> {
        vec![Bytes::from_static(s.as_bytes())]
    }

    #[test]
    fn strict_alternation() {
        let mut req = ReqStateMachine::default();
        assert!(req.accept_reply(body("early")).is_err());

        let out = req.prepare_request(body("hello")).unwrap();
        assert_eq!(out, vec![Bytes::new(), Bytes::from_static(b"hello")]);
        assert_eq!(req.state(), ReqState::AwaitingReply);

        let err = req.prepare_request(body("again")).unwrap_err();
        assert_eq!(err.errno(), tessera_core::error::errno::EFSM);

        let reply = req
            .accept_reply(vec![Bytes::new(), Bytes::from_static(b"world")])
            .unwrap()
            .unwrap();
        assert_eq!(reply, body("world"));
        assert_eq!(req.state(), ReqState::Idle);
    }

    #[test]
    fn reply_without_delimiter_is_rejected() {
        let mut req = ReqStateMachine::default();
        req.prepare_request(body("q")).unwrap();
        assert!(matches!(
            req.accept_reply(body("no-delim")),
            Err(TesseraError::Protocol(_))
        ));
        // Still waiting for a proper reply.
        assert_eq!(req.state(), ReqState::AwaitingReply);
    }

    #[test]
    fn relaxed_allows_resend() {
        let mut req = ReqStateMachine::new(true, false);
        req.prepare_request(body("one")).unwrap();
        req.prepare_request(body("two")).unwrap();
        assert_eq!(req.request_id(), 2);
    }

    #[test]
    fn correlate_filters_stale_replies() {
        let mut req = ReqStateMachine::new(true, true);
        let first = req.prepare_request(body("one")).unwrap();
        assert_eq!(&first[0][..], &1u32.to_be_bytes());
        req.prepare_request(body("two")).unwrap();

        let stale = vec![first[0].clone(), Bytes::new(), Bytes::from_static(b"late")];
        assert_eq!(req.accept_reply(stale).unwrap(), None);

        let fresh = vec![
            Bytes::copy_from_slice(&2u32.to_be_bytes()),
            Bytes::new(),
            Bytes::from_static(b"ok"),
        ];
        assert_eq!(req.accept_reply(fresh).unwrap(), Some(body("ok")));
    }
}

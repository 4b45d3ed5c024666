use bytes::Bytes;
use smallvec::SmallVec;
use tessera_core::error::TesseraError;
use tracing::trace;

/// REP socket state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepState {
    AwaitingRequest,
    /// A request was delivered; the next call must be a reply.
    ReadyToReply,
}

/// REP envelope bookkeeping.
///
/// An inbound request is `[routing frames..., empty, body...]`. Everything up
/// to and including the empty delimiter is kept and put back in front of the
/// reply, so the reply retraces the request's path through any ROUTER hops.
#[derive(Debug, Clone)]
pub struct RepEnvelope {
    state: RepState,
    envelope: SmallVec<[Bytes; 4]>,
}

impl RepEnvelope {
    pub fn new() -> Self {
        Self {
            state: RepState::AwaitingRequest,
            envelope: SmallVec::new(),
        }
    }

    #[inline]
    pub const fn state(&self) -> RepState {
        self.state
    }

    /// Saved envelope of the request being served.
    pub fn envelope(&self) -> &[Bytes] {
        &self.envelope
    }

    /// Split a request into envelope and body.
    ///
    /// Returns `Ok(None)` for a request without delimiter; such messages are
    /// dropped and the socket keeps waiting.
    pub fn accept_request(&mut self, msg: Vec<Bytes>) -> Result<Option<Vec<Bytes>>, TesseraError> {
        if self.state == RepState::ReadyToReply {
            return Err(TesseraError::invalid_state(
                "Cannot receive while a reply is pending - must call send() first",
            ));
        }

        let Some(delim) = msg.iter().position(Bytes::is_empty) else {
            trace!(frames = msg.len(), "[REP] dropping request without delimiter");
            return Ok(None);
        };

        let mut frames = msg;
        let body = frames.split_off(delim + 1);
        self.envelope.clear();
        self.envelope.extend(frames);
        self.state = RepState::ReadyToReply;
        Ok(Some(body))
    }

    /// Put the saved envelope in front of `body`.
    pub fn prepare_reply(&mut self, body: Vec<Bytes>) -> Result<Vec<Bytes>, TesseraError> {
        if self.state != RepState::ReadyToReply {
            return Err(TesseraError::invalid_state(
                "Cannot send before receiving a request",
            ));
        }
        let mut out = Vec::with_capacity(self.envelope.len() + body.len());
        out.extend(self.envelope.drain(..));
        out.extend(body);
        self.state = RepState::AwaitingRequest;
        Ok(out)
    }
}

impl Default for RepEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_is_restored() {
        let mut rep = RepEnvelope::new();
        let req = vec![
            Bytes::from_static(b"hop-1"),
            Bytes::from_static(b"hop-2"),
            Bytes::new(),
            Bytes::from_static(b"ping"),
        ];
        let body = rep.accept_request(req).unwrap().unwrap();
        assert_eq!(body, vec![Bytes::from_static(b"ping")]);
        assert_eq!(rep.envelope().len(), 3);
        assert_eq!(rep.state(), RepState::ReadyToReply);

        let reply = rep.prepare_reply(vec![Bytes::from_static(b"pong")]).unwrap();
        assert_eq!(
            reply,
            vec![
                Bytes::from_static(b"hop-1"),
                Bytes::from_static(b"hop-2"),
                Bytes::new(),
                Bytes::from_static(b"pong"),
            ]
        );
        assert_eq!(rep.state(), RepState::AwaitingRequest);
    }

    #[test]
    fn alternation_is_enforced() {
        let mut rep = RepEnvelope::new();
        assert!(matches!(
            rep.prepare_reply(vec![Bytes::new()]),
            Err(TesseraError::InvalidState(_))
        ));
        rep.accept_request(vec![Bytes::new(), Bytes::from_static(b"a")]).unwrap();
        assert!(rep.accept_request(vec![Bytes::new()]).is_err());
    }

    #[test]
    fn malformed_request_dropped() {
        let mut rep = RepEnvelope::new();
        assert_eq!(rep.accept_request(vec![Bytes::from_static(b"x")]).unwrap(), None);
        assert_eq!(rep.state(), RepState::AwaitingRequest);
    }
}

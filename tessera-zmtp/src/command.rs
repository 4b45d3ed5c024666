//! ZMTP command bodies.
//!
//! ```text
//! command  = name-len:1 name properties*
//! property = pname-len:1 pname value-len:4 (BE) value
//! ```

use crate::codec::ZmtpError;
use bytes::{BufMut, Bytes, BytesMut};
use tessera_core::socket_type::SocketType;

pub const READY: &[u8] = b"READY";
pub const ERROR: &[u8] = b"ERROR";
pub const PROP_SOCKET_TYPE: &[u8] = b"Socket-Type";
pub const PROP_IDENTITY: &[u8] = b"Identity";

/// Parsed ZMTP command (borrowed views into the payload).
#[derive(Debug, Clone)]
pub struct ZmtpCommand<'a> {
    pub name: &'a [u8],
    pub props: Vec<ZmtpProp<'a>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZmtpProp<'a> {
    pub name: &'a [u8],
    pub value: &'a [u8],
}

impl<'a> ZmtpCommand<'a> {
    pub fn name_str(&self) -> Option<&'a str> {
        std::str::from_utf8(self.name).ok()
    }

    /// First property with the given name. Names compare case-insensitively.
    pub fn get(&self, prop: &[u8]) -> Option<&'a [u8]> {
        self.props
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(prop))
            .map(|p| p.value)
    }

    #[inline]
    pub fn is(&self, name: &[u8]) -> bool {
        self.name == name
    }
}

fn malformed(what: &str) -> ZmtpError {
    ZmtpError::Command(what.to_string())
}

/// Parse a command payload (frame body, header excluded).
pub fn parse_command(payload: &[u8]) -> Result<ZmtpCommand<'_>, ZmtpError> {
    let (&name_len, rest) = payload
        .split_first()
        .ok_or_else(|| malformed("empty command body"))?;
    let name_len = usize::from(name_len);
    if rest.len() < name_len {
        return Err(malformed("truncated command name"));
    }
    let (name, mut rest) = rest.split_at(name_len);

    let mut props = Vec::new();
    while let Some((&pn_len, after)) = rest.split_first() {
        let pn_len = usize::from(pn_len);
        if after.len() < pn_len + 4 {
            return Err(malformed("truncated property header"));
        }
        let (pname, after) = after.split_at(pn_len);
        let (vl, after) = after.split_at(4);
        let vl = u32::from_be_bytes([vl[0], vl[1], vl[2], vl[3]]) as usize;
        if after.len() < vl {
            return Err(malformed("truncated property value"));
        }
        let (value, after) = after.split_at(vl);
        props.push(ZmtpProp { name: pname, value });
        rest = after;
    }

    Ok(ZmtpCommand { name, props })
}

/// Append one property.
pub fn put_property(dst: &mut BytesMut, name: &[u8], value: &[u8]) {
    dst.put_u8(name.len() as u8);
    dst.extend_from_slice(name);
    dst.put_u32(value.len() as u32);
    dst.extend_from_slice(value);
}

/// Build a READY command body.
///
/// `Socket-Type` is always present; `Identity` only when given.
pub fn build_ready(socket_type: SocketType, identity: Option<&[u8]>) -> Bytes {
    let mut body = BytesMut::with_capacity(64);
    body.put_u8(READY.len() as u8);
    body.extend_from_slice(READY);
    put_property(&mut body, PROP_SOCKET_TYPE, socket_type.as_str().as_bytes());
    if let Some(id) = identity {
        put_property(&mut body, PROP_IDENTITY, id);
    }
    body.freeze()
}

/// Reason text of an ERROR command, or `None` if `body` is not ERROR.
///
/// ERROR carries a single length-prefixed reason instead of properties.
pub fn parse_error(body: &[u8]) -> Option<String> {
    let rest = body.strip_prefix(&[ERROR.len() as u8][..])?.strip_prefix(ERROR)?;
    let reason = match rest.split_first() {
        Some((&len, text)) => &text[..text.len().min(usize::from(len))],
        None => &[][..],
    };
    Some(String::from_utf8_lossy(reason).into_owned())
}

/// Metadata announced by the peer in READY.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyMeta {
    pub socket_type: SocketType,
    /// Present and non-empty only if the peer supplied one.
    pub identity: Option<Bytes>,
}

/// Parse a READY body.
///
/// Fails on any other command name, a missing or unknown `Socket-Type`, or
/// an identity longer than 255 bytes. Unknown properties are ignored.
pub fn parse_ready(body: &Bytes) -> Result<ReadyMeta, ZmtpError> {
    if let Some(reason) = parse_error(body) {
        return Err(ZmtpError::Command(format!("peer sent ERROR: {reason}")));
    }
    let cmd = parse_command(body)?;
    if !cmd.is(READY) {
        return Err(ZmtpError::Command(format!(
            "expected READY, got {}",
            String::from_utf8_lossy(cmd.name)
        )));
    }

    let raw_type = cmd
        .get(PROP_SOCKET_TYPE)
        .ok_or_else(|| malformed("READY without Socket-Type"))?;
    let socket_type = SocketType::from_bytes(raw_type).ok_or_else(|| {
        ZmtpError::Command(format!(
            "unknown Socket-Type {}",
            String::from_utf8_lossy(raw_type)
        ))
    })?;

    let identity = match cmd.get(PROP_IDENTITY) {
        Some(id) if id.len() > 255 => return Err(malformed("Identity longer than 255 bytes")),
        Some(id) if !id.is_empty() => Some(body.slice_ref(id)),
        _ => None,
    };

    Ok(ReadyMeta {
        socket_type,
        identity,
    })
}

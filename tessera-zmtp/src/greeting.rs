use crate::codec::ZmtpError;

/// ZMTP Greeting is always exactly 64 bytes
pub const GREETING_SIZE: usize = 64;

/// Protocol version we announce.
pub const ZMTP_MAJOR: u8 = 3;
pub const ZMTP_MINOR: u8 = 0;

const SIGNATURE_HEAD: u8 = 0xFF;
const SIGNATURE_TAIL: u8 = 0x7F;
const MECHANISM_OFFSET: usize = 12;
const MECHANISM_LEN: usize = 20;
const AS_SERVER_OFFSET: usize = 32;

/// Security mechanisms named in a greeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mechanism {
    Null,
    Plain,
    Curve,
    Unknown(String),
}

impl Mechanism {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Null => "NULL",
            Self::Plain => "PLAIN",
            Self::Curve => "CURVE",
            Self::Unknown(s) => s,
        }
    }
}

/// Parsed greeting information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZmtpGreeting {
    pub major: u8,
    pub minor: u8,
    pub mechanism: Mechanism,
    pub as_server: bool,
}

impl ZmtpGreeting {
    /// Our greeting: ZMTP 3.0, NULL mechanism.
    pub const fn null(as_server: bool) -> Self {
        Self {
            major: ZMTP_MAJOR,
            minor: ZMTP_MINOR,
            mechanism: Mechanism::Null,
            as_server,
        }
    }

    /// Serialize to the fixed 64-byte layout.
    ///
    /// ```text
    /// [0]      0xFF
    /// [1..9]   Padding
    /// [9]      0x7F
    /// [10]     Major version
    /// [11]     Minor version
    /// [12..32] Mechanism (ASCII, null-padded)
    /// [32]     As-Server flag
    /// [33..64] Filler
    /// ```
    pub fn encode(&self) -> [u8; GREETING_SIZE] {
        let mut b = [0u8; GREETING_SIZE];
        b[0] = SIGNATURE_HEAD;
        b[9] = SIGNATURE_TAIL;
        b[10] = self.major;
        b[11] = self.minor;
        let name = self.mechanism.as_str().as_bytes();
        let n = name.len().min(MECHANISM_LEN);
        b[MECHANISM_OFFSET..MECHANISM_OFFSET + n].copy_from_slice(&name[..n]);
        b[AS_SERVER_OFFSET] = u8::from(self.as_server);
        b
    }

    /// Parse a 64-byte ZMTP greeting.
    ///
    /// Any major version >= 3 is accepted; ZMTP 3.x peers negotiate down to
    /// the lowest common minor version on their own.
    pub fn parse(src: &[u8]) -> crate::codec::Result<Self> {
        if src.len() < GREETING_SIZE {
            return Err(ZmtpError::Greeting(format!(
                "expected {GREETING_SIZE} bytes, got {}",
                src.len()
            )));
        }

        if src[0] != SIGNATURE_HEAD || src[9] != SIGNATURE_TAIL {
            return Err(ZmtpError::Greeting("bad signature".into()));
        }

        let major = src[10];
        let minor = src[11];
        if major < 3 {
            return Err(ZmtpError::Greeting(format!(
                "unsupported ZMTP version {major}.{minor}"
            )));
        }

        let mech_raw = &src[MECHANISM_OFFSET..MECHANISM_OFFSET + MECHANISM_LEN];
        let mech_str = std::str::from_utf8(mech_raw)
            .map_err(|_| ZmtpError::Greeting("mechanism name is not ASCII".into()))?
            .trim_end_matches(char::from(0));

        let mechanism = match mech_str {
            "NULL" => Mechanism::Null,
            "PLAIN" => Mechanism::Plain,
            "CURVE" => Mechanism::Curve,
            other => Mechanism::Unknown(other.to_string()),
        };

        let as_server = (src[AS_SERVER_OFFSET] & 0x01) != 0;

        Ok(Self {
            major,
            minor,
            mechanism,
            as_server,
        })
    }
}

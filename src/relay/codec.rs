//! Wire forms of the two messages peers exchange.
//!
//! Collaboration envelope:
//! ```text
//! [magic: b"ARCD"] [bincode(CollaborationData), fixint, no trailing bytes]
//! ```
//! Handshake: the UTF-8 text `SessionID:<session id>`, nothing before or after.
use super::ContractViolation;

use crate::session_id::SessionId;
use crate::tracking::CollaborationData;

use bincode::Options;
use bytes::{BufMut, Bytes, BytesMut};

/// Magic bytes opening every collaboration envelope
pub const MAGIC: [u8; 4] = *b"ARCD";

/// Largest collaboration payload accepted in either direction
pub const MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Literal prefix of a handshake message
pub const HANDSHAKE_PREFIX: &str = "SessionID:";

// priority tag + payload length prefix
const ENVELOPE_OVERHEAD: u64 = 4 + 8;

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
        .with_limit(MAX_PAYLOAD as u64 + ENVELOPE_OVERHEAD)
}

pub fn encode_collaboration(data: &CollaborationData) -> Result<Bytes, ContractViolation> {
    if data.payload.len() > MAX_PAYLOAD {
        return Err(ContractViolation::Oversized { len: data.payload.len() });
    }
    let body = options()
        .serialize(data)
        .map_err(|err| ContractViolation::Unencodable(err.to_string()))?;
    let mut buf = BytesMut::with_capacity(MAGIC.len() + body.len());
    buf.put_slice(&MAGIC);
    buf.put_slice(&body);
    Ok(buf.freeze())
}

/// `None` unless `bytes` is exactly one well-formed envelope.
pub fn decode_collaboration(bytes: &[u8]) -> Option<CollaborationData> {
    if bytes.len() < MAGIC.len() || bytes[..MAGIC.len()] != MAGIC {
        return None;
    }
    options().deserialize::<CollaborationData>(&bytes[MAGIC.len()..]).ok()
}

pub fn encode_handshake(session_id: &SessionId) -> Bytes {
    let mut command = String::with_capacity(HANDSHAKE_PREFIX.len() + session_id.as_str().len());
    command.push_str(HANDSHAKE_PREFIX);
    command.push_str(session_id.as_str());
    Bytes::from(command)
}

/// The announced session, if `bytes` is a handshake with a non-empty id.
pub fn decode_handshake(bytes: &[u8]) -> Option<SessionId> {
    let text = std::str::from_utf8(bytes).ok()?;
    let remainder = text.strip_prefix(HANDSHAKE_PREFIX)?;
    remainder.parse().ok()
}

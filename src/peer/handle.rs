use crate::util;

use base58check::{FromBase58Check, ToBase58Check};
use rand::{self, Rng};

use std::convert::TryInto;
use std::fmt;
use std::str::FromStr;

/// Transport-issued identity of a connected remote device.
///
/// Stable for the lifetime of one connection and unique among the connected peers. A
/// device that reconnects is issued a new handle.
#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize)]
pub struct PeerHandle([u8; 32]);

impl fmt::Debug for PeerHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // The full base58check form is long, logs only need to tell peers apart
        let encoded = self.0.to_base58check(0);
        write!(f, "{}", &encoded[..encoded.len().min(8)])
    }
}

impl fmt::Display for PeerHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.to_base58check(0))
    }
}

impl FromStr for PeerHandle {
    type Err = crate::Error;

    /// Converts a base58check encoded string to the bytes of a handle
    fn from_str(s: &str) -> Result<Self, crate::Error> {
        let (vsn, bytes) = s.from_base58check().map_err(|_| crate::Error::TryFromStringError)?;
        if vsn != 0 {
            return Err(crate::Error::TryFromStringError);
        }
        let bytes: [u8; 32] =
            bytes.as_slice().try_into().map_err(|_| crate::Error::TryFromStringError)?;
        Ok(PeerHandle(bytes))
    }
}

impl PeerHandle {
    /// A handle derived from connection-specific bytes (e.g. a display name and nonce).
    pub fn new(bytes: &[u8]) -> PeerHandle {
        PeerHandle(util::hash(bytes))
    }

    pub fn generate() -> PeerHandle {
        let mut rng = rand::thread_rng();
        let v: [u8; 32] = rng.gen();
        PeerHandle(v)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

//! Identity of one continuous tracking run on a device.
use crate::Error;

use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// An opaque, comparable session identifier.
///
/// The canonical form is the string a device's tracking engine reports (an uppercase
/// hyphenated UUID for sessions generated here), and it is exactly what is sent in a
/// handshake. Remote identifiers are not required to be UUIDs.
#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// A fresh identifier for a new tracking run.
    pub fn generate() -> SessionId {
        SessionId::from_uuid(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> SessionId {
        SessionId(uuid.hyphenated().to_string().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The UUID behind this identifier, if it is one.
    pub fn to_uuid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.0).ok()
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        if s.is_empty() {
            return Err(Error::InvalidSessionId);
        }
        Ok(SessionId(s.to_owned()))
    }
}

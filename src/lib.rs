#[macro_use]
extern crate serde_derive;
#[macro_use(Message, MessageResponse)]
extern crate actix_derive;
extern crate colored;

pub mod anchor;
pub mod announcer;
pub mod node;
pub mod peer;
pub mod prelude;
pub mod registry;
pub mod relay;
pub mod scene;
pub mod session;
pub mod session_id;
pub mod settings;
pub mod tracking;
pub mod transport;
pub mod util;

#[cfg(test)]
mod integration_test;

use peer::PeerHandle;

#[derive(Debug)]
pub enum Error {
    IO(std::io::Error),
    Actix(actix::MailboxError),
    Codec(bincode::Error),
    Config(config::ConfigError),

    // transport errors
    PeerNotConnected(PeerHandle),
    UnknownPeer(PeerHandle),

    /// Error caused by converting from a `String` to a `PeerHandle`
    TryFromStringError,
    /// An empty string cannot identify a tracking session
    InvalidSessionId,
    /// Settings outside of their accepted range
    InvalidSettings(String),
}

impl std::error::Error for Error {}

impl std::convert::From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::IO(error)
    }
}

impl std::convert::From<actix::MailboxError> for Error {
    fn from(error: actix::MailboxError) -> Self {
        Error::Actix(error)
    }
}

impl std::convert::From<bincode::Error> for Error {
    fn from(error: bincode::Error) -> Self {
        Error::Codec(error)
    }
}

impl std::convert::From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Error::Config(error)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

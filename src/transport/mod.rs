//! Boundary with the peer-to-peer transport.
//!
//! Discovery, encryption and framing belong to the transport; this crate sees connected
//! peer handles, whole messages, and the four events below.
pub mod memory;

use crate::peer::PeerHandle;
use crate::Result;

use actix::Recipient;
use bytes::Bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Reliability {
    Reliable,
    BestEffort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Every connected peer.
    All,
    Peers(Vec<PeerHandle>),
}

pub trait Transport: Sync + Send {
    fn local_peer(&self) -> PeerHandle;

    fn connected_peers(&self) -> Vec<PeerHandle>;

    /// Fire-and-forget send; the transport owns retries for reliable delivery.
    fn send(&self, bytes: Bytes, reliability: Reliability, destination: Destination) -> Result<()>;
}

//-- Events the transport delivers to the session actor

/// A prospective peer was found; the reply decides whether it may connect.
#[derive(Debug, Clone, Message)]
#[rtype(result = "bool")]
pub struct PeerDiscovered {
    pub peer: PeerHandle,
}

#[derive(Debug, Clone, Message)]
#[rtype(result = "()")]
pub struct PeerJoined {
    pub peer: PeerHandle,
}

#[derive(Debug, Clone, Message)]
#[rtype(result = "()")]
pub struct PeerLeft {
    pub peer: PeerHandle,
}

#[derive(Debug, Clone, Message)]
#[rtype(result = "crate::relay::Dispatched")]
pub struct DataReceived {
    pub peer: PeerHandle,
    pub bytes: Bytes,
}

/// Where a transport delivers the events of one device.
#[derive(Clone)]
pub struct PeerEvents {
    pub discovered: Recipient<PeerDiscovered>,
    pub joined: Recipient<PeerJoined>,
    pub left: Recipient<PeerLeft>,
    pub data: Recipient<DataReceived>,
}

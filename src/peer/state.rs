//! Per-peer join lifecycle.
//!
//! ```text
//! Discovered --admit--> Admitted --join--> Connected --handshake--> HandshakeKnown --leave--> Disconnected
//!     \--refuse--> Refused
//! ```
//!
//! `Refused` and `Disconnected` are terminal: the peer is dropped from the table and a
//! later connection from the same device arrives under a new handle. An `Admitted` peer
//! holds a slot until it joins or its connection attempt is abandoned.
use super::handle::PeerHandle;
use crate::session_id::SessionId;

use tracing::debug;

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerState {
    Discovered,
    Admitted,
    Refused,
    Connected,
    HandshakeKnown(SessionId),
    Disconnected,
}

impl PeerState {
    /// Admitted by this side, whether or not the transport finished connecting.
    pub fn holds_slot(&self) -> bool {
        matches!(self, PeerState::Admitted | PeerState::Connected | PeerState::HandshakeKnown(_))
    }

    pub fn is_joined(&self) -> bool {
        matches!(self, PeerState::Connected | PeerState::HandshakeKnown(_))
    }
}

#[derive(Debug, Default)]
pub struct PeerTable {
    peers: HashMap<PeerHandle, PeerState>,
}

impl PeerTable {
    pub fn new() -> Self {
        PeerTable { peers: HashMap::new() }
    }

    pub fn get(&self, peer: &PeerHandle) -> Option<&PeerState> {
        self.peers.get(peer)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    /// Peers admitted here whose join has not been reported yet.
    pub fn pending(&self) -> Vec<PeerHandle> {
        self.peers
            .iter()
            .filter(|(_, state)| **state == PeerState::Admitted)
            .map(|(peer, _)| *peer)
            .collect()
    }

    pub fn discovered(&mut self, peer: PeerHandle) {
        // A rediscovered peer keeps whatever progress it already made
        let _ = self.peers.entry(peer).or_insert(PeerState::Discovered);
    }

    pub fn admitted(&mut self, peer: PeerHandle) -> PeerState {
        let state = self.peers.entry(peer).or_insert(PeerState::Discovered);
        if *state == PeerState::Discovered {
            *state = PeerState::Admitted;
        }
        state.clone()
    }

    pub fn refused(&mut self, peer: &PeerHandle) -> PeerState {
        if let Some(previous) = self.peers.remove(peer) {
            debug!("{:?}: {:?} -> {:?}", peer, previous, PeerState::Refused);
        }
        PeerState::Refused
    }

    pub fn connected(&mut self, peer: PeerHandle) -> PeerState {
        let state = self.peers.entry(peer).or_insert(PeerState::Discovered);
        if !matches!(state, PeerState::HandshakeKnown(_)) {
            *state = PeerState::Connected;
        }
        state.clone()
    }

    /// Handshakes may overtake the join notification, so an admitted peer is enough.
    /// Returns `None` and records nothing for a peer that holds no slot.
    pub fn handshake_known(&mut self, peer: PeerHandle, session_id: SessionId) -> Option<PeerState> {
        let state = self.peers.get_mut(&peer).filter(|state| state.holds_slot())?;
        let next = PeerState::HandshakeKnown(session_id);
        debug!("{:?}: {:?} -> {:?}", peer, state, next);
        *state = next.clone();
        Some(next)
    }

    /// Drops the peer, returning the state it was in.
    pub fn left(&mut self, peer: &PeerHandle) -> Option<PeerState> {
        let previous = self.peers.remove(peer)?;
        debug!("{:?}: {:?} -> {:?}", peer, previous, PeerState::Disconnected);
        Some(previous)
    }
}

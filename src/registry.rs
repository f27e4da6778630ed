//! Maps connected peers to the tracking sessions they announced.
use crate::peer::PeerHandle;
use crate::session_id::SessionId;

use tracing::{debug, info, warn};

use std::collections::{HashMap, HashSet};

/// Maximum number of connected peers.
pub const MAX_CONNECTED_PEERS: usize = 4;

/// Removes every anchor contributed by a session.
pub trait Retract {
    /// Returns the number of anchors removed.
    fn retract_anchors_from(&mut self, session_id: &SessionId) -> usize;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// First session announced by the peer.
    New,
    /// Replay of the session already known.
    Unchanged,
    /// The peer restarted tracking; anchors of the old session were retracted.
    Replaced(SessionId),
}

#[derive(Debug)]
pub struct PeerRegistry {
    sessions: HashMap<PeerHandle, SessionId>,
    max_peers: usize,
}

impl Default for PeerRegistry {
    fn default() -> Self {
        PeerRegistry::new(MAX_CONNECTED_PEERS)
    }
}

impl PeerRegistry {
    pub fn new(max_peers: usize) -> Self {
        PeerRegistry { sessions: HashMap::new(), max_peers }
    }

    /// Whether `peer` may connect given the peers already `occupied` a slot, connected
    /// or admitted and still joining.
    ///
    /// Counts `peer` itself, so with `max_peers` slots taken any new peer is refused.
    pub fn admit(&self, peer: &PeerHandle, occupied: &[PeerHandle]) -> bool {
        let others = occupied.iter().filter(|p| *p != peer).collect::<HashSet<_>>().len();
        if others + 1 > self.max_peers {
            warn!(
                "refusing {:?}: {} peer slots taken, limited to {}",
                peer, others, self.max_peers
            );
            false
        } else {
            true
        }
    }

    /// Records the session announced by `peer`.
    ///
    /// A different session replaces the old one only after its anchors were retracted.
    pub fn on_handshake_received(
        &mut self,
        peer: PeerHandle,
        session_id: SessionId,
        retract: &mut dyn Retract,
    ) -> HandshakeOutcome {
        let outcome = match self.sessions.get(&peer) {
            Some(known) if *known == session_id => return HandshakeOutcome::Unchanged,
            Some(old) => {
                let old = old.clone();
                let n = retract.retract_anchors_from(&old);
                info!("{:?} restarted session {} -> {} ({} anchors retracted)", peer, old, session_id, n);
                HandshakeOutcome::Replaced(old)
            }
            None => {
                info!("{:?} announced session {}", peer, session_id);
                HandshakeOutcome::New
            }
        };
        let _ = self.sessions.insert(peer, session_id);
        outcome
    }

    /// Forgets `peer`, retracting the anchors of its last known session.
    pub fn on_peer_left(&mut self, peer: &PeerHandle, retract: &mut dyn Retract) -> Option<SessionId> {
        match self.sessions.get(peer).cloned() {
            Some(session_id) => {
                let n = retract.retract_anchors_from(&session_id);
                let _ = self.sessions.remove(peer);
                info!("{:?} left, {} anchors of session {} retracted", peer, n, session_id);
                Some(session_id)
            }
            None => {
                debug!("{:?} left before completing the handshake", peer);
                None
            }
        }
    }

    pub fn session_of(&self, peer: &PeerHandle) -> Option<&SessionId> {
        self.sessions.get(peer)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PeerHandle, &SessionId)> {
        self.sessions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingRetract {
        calls: Vec<SessionId>,
    }

    impl Retract for RecordingRetract {
        fn retract_anchors_from(&mut self, session_id: &SessionId) -> usize {
            self.calls.push(session_id.clone());
            0
        }
    }

    fn peers(n: usize) -> Vec<PeerHandle> {
        (0..n).map(|_| PeerHandle::generate()).collect()
    }

    #[test]
    fn handshake_sequence_keeps_last_and_retracts_the_rest() {
        let mut registry = PeerRegistry::default();
        let mut retract = RecordingRetract::default();
        let peer = PeerHandle::generate();
        let sessions: Vec<SessionId> = (0..5).map(|_| SessionId::generate()).collect();

        for (i, session_id) in sessions.iter().enumerate() {
            let outcome = registry.on_handshake_received(peer, session_id.clone(), &mut retract);
            if i == 0 {
                assert_eq!(outcome, HandshakeOutcome::New);
            } else {
                assert_eq!(outcome, HandshakeOutcome::Replaced(sessions[i - 1].clone()));
            }
            // Retraction for the previous session happened before the update
            assert_eq!(retract.calls.len(), i);
            assert_eq!(registry.session_of(&peer), Some(session_id));
        }

        assert_eq!(retract.calls, sessions[..4].to_vec());
        assert_eq!(registry.session_of(&peer), sessions.last());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn replayed_handshake_is_idempotent() {
        let mut registry = PeerRegistry::default();
        let mut retract = RecordingRetract::default();
        let peer = PeerHandle::generate();
        let session_id = SessionId::generate();

        let _ = registry.on_handshake_received(peer, session_id.clone(), &mut retract);
        for _ in 0..3 {
            assert_eq!(
                registry.on_handshake_received(peer, session_id.clone(), &mut retract),
                HandshakeOutcome::Unchanged
            );
        }
        assert!(retract.calls.is_empty());
    }

    #[test]
    fn leaving_without_handshake_retracts_nothing() {
        let mut registry = PeerRegistry::default();
        let mut retract = RecordingRetract::default();
        let peer = PeerHandle::generate();

        assert_eq!(registry.on_peer_left(&peer, &mut retract), None);
        assert!(retract.calls.is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn leaving_retracts_last_known_session() {
        let mut registry = PeerRegistry::default();
        let mut retract = RecordingRetract::default();
        let (p1, p2) = (PeerHandle::generate(), PeerHandle::generate());
        let (s1, s2) = (SessionId::generate(), SessionId::generate());

        let _ = registry.on_handshake_received(p1, s1.clone(), &mut retract);
        let _ = registry.on_handshake_received(p2, s2.clone(), &mut retract);

        assert_eq!(registry.on_peer_left(&p1, &mut retract), Some(s1.clone()));
        assert_eq!(retract.calls, vec![s1]);
        assert_eq!(registry.session_of(&p1), None);
        assert_eq!(registry.session_of(&p2), Some(&s2));

        // A second leave for the same peer is absorbed
        assert_eq!(registry.on_peer_left(&p1, &mut retract), None);
        assert_eq!(retract.calls.len(), 1);
    }

    #[test]
    fn admission_is_capped_at_four() {
        let registry = PeerRegistry::default();
        let candidate = PeerHandle::generate();

        assert!(registry.admit(&candidate, &peers(0)));
        assert!(registry.admit(&candidate, &peers(3)));
        assert!(!registry.admit(&candidate, &peers(4)));
        assert!(!registry.admit(&candidate, &peers(5)));
        assert!(registry.is_empty());
    }

    #[test]
    fn already_connected_peer_is_not_counted_twice() {
        let registry = PeerRegistry::default();
        let connected = peers(4);
        assert!(registry.admit(&connected[2], &connected));

        // A peer reported both connected and pending takes one slot
        let mut occupied = peers(3);
        occupied.push(occupied[0]);
        assert!(registry.admit(&PeerHandle::generate(), &occupied));
    }
}

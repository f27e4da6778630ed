//! Moves collaboration data between the tracking engine and the peers, and routes the
//! session handshake to the registry.
//!
//! Classification is stateless per message, so reordered or duplicated frames are
//! tolerated: engines apply collaboration data idempotently and handshake replays leave
//! the registry unchanged.
pub mod codec;

use crate::peer::PeerHandle;
use crate::registry::{HandshakeOutcome, PeerRegistry, Retract};
use crate::session_id::SessionId;
use crate::tracking::{CollaborationData, TrackingEngine};
use crate::transport::{Destination, Reliability, Transport};
use crate::util;

use tracing::{debug, warn};

use std::fmt;

/// The engine handed over a payload that cannot be put on the wire.
///
/// Engines guarantee their payloads are encodable, so this is a broken contract between
/// the engine and this crate rather than a network condition. Callers should treat it as
/// unrecoverable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    Oversized { len: usize },
    Unencodable(String),
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ContractViolation::Oversized { len } => {
                write!(f, "collaboration payload of {} bytes exceeds {}", len, codec::MAX_PAYLOAD)
            }
            ContractViolation::Unencodable(reason) => {
                write!(f, "collaboration payload could not be encoded: {}", reason)
            }
        }
    }
}

impl std::error::Error for ContractViolation {}

#[derive(Debug, Clone, PartialEq, Eq, MessageResponse)]
pub enum Relayed {
    Broadcast { peers: usize, reliability: Reliability },
    /// No peers were connected; the engine re-derives later state.
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Eq, MessageResponse)]
pub enum Dispatched {
    Collaboration,
    Handshake(SessionId, HandshakeOutcome),
    Discarded,
}

pub fn reliability_for(data: &CollaborationData) -> Reliability {
    if data.is_critical() {
        Reliability::Reliable
    } else {
        Reliability::BestEffort
    }
}

/// Broadcasts locally produced collaboration data to every connected peer.
pub fn relay_outbound(
    data: &CollaborationData,
    transport: &dyn Transport,
) -> Result<Relayed, ContractViolation> {
    let peers = transport.connected_peers();
    if peers.is_empty() {
        debug!("no peers connected, dropping {} bytes of collaboration data", data.payload.len());
        return Ok(Relayed::Dropped);
    }
    let bytes = codec::encode_collaboration(data)?;
    let reliability = reliability_for(data);
    if let Err(err) = transport.send(bytes, reliability, Destination::All) {
        warn!("collaboration broadcast failed: {:?}", err);
    }
    Ok(Relayed::Broadcast { peers: peers.len(), reliability })
}

/// Routes one inbound message from `peer`.
///
/// Collaboration data is tried first, so an envelope whose payload happens to contain
/// the handshake prefix is never mistaken for a handshake.
pub fn relay_inbound(
    bytes: &[u8],
    peer: PeerHandle,
    engine: &dyn TrackingEngine,
    registry: &mut PeerRegistry,
    retract: &mut dyn Retract,
) -> Dispatched {
    if let Some(data) = codec::decode_collaboration(bytes) {
        engine.update_with_collaboration_data(data);
        return Dispatched::Collaboration;
    }
    if let Some(session_id) = codec::decode_handshake(bytes) {
        let outcome = registry.on_handshake_received(peer, session_id.clone(), retract);
        return Dispatched::Handshake(session_id, outcome);
    }
    debug!("discarding unrecognized message from {:?}: {}", peer, util::preview(bytes));
    Dispatched::Discarded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::{Anchor, AnchorLifecycle, Transform};
    use crate::tracking::memory::MemoryEngine;
    use crate::tracking::Priority;
    use crate::Result;

    use bytes::Bytes;

    use std::sync::{Arc, Mutex};

    struct StubTransport {
        peers: Vec<PeerHandle>,
        sent: Mutex<Vec<(Bytes, Reliability, Destination)>>,
    }

    impl StubTransport {
        fn with_peers(n: usize) -> Self {
            StubTransport {
                peers: (0..n).map(|_| PeerHandle::generate()).collect(),
                sent: Mutex::new(vec![]),
            }
        }
    }

    impl Transport for StubTransport {
        fn local_peer(&self) -> PeerHandle {
            PeerHandle::new(b"local")
        }

        fn connected_peers(&self) -> Vec<PeerHandle> {
            self.peers.clone()
        }

        fn send(&self, bytes: Bytes, reliability: Reliability, destination: Destination) -> Result<()> {
            self.sent.lock().unwrap().push((bytes, reliability, destination));
            Ok(())
        }
    }

    fn inbound_env() -> (Arc<MemoryEngine>, PeerRegistry, AnchorLifecycle) {
        let engine = Arc::new(MemoryEngine::new());
        let lifecycle = AnchorLifecycle::new(engine.clone());
        (engine, PeerRegistry::default(), lifecycle)
    }

    #[test]
    fn nothing_is_sent_without_peers() {
        let transport = StubTransport::with_peers(0);
        let data = CollaborationData::new(Priority::Critical, vec![1, 2, 3]);
        assert_eq!(relay_outbound(&data, &transport), Ok(Relayed::Dropped));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn critical_data_is_sent_reliably() {
        let transport = StubTransport::with_peers(2);
        let data = CollaborationData::new(Priority::Critical, vec![1, 2, 3]);
        assert_eq!(
            relay_outbound(&data, &transport),
            Ok(Relayed::Broadcast { peers: 2, reliability: Reliability::Reliable })
        );
        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1, Reliability::Reliable);
        assert_eq!(sent[0].2, Destination::All);
        assert_eq!(codec::decode_collaboration(&sent[0].0), Some(data));
    }

    #[test]
    fn normal_data_is_sent_best_effort() {
        let transport = StubTransport::with_peers(1);
        let data = CollaborationData::new(Priority::Normal, vec![9]);
        let _ = relay_outbound(&data, &transport).unwrap();
        assert_eq!(transport.sent.lock().unwrap()[0].1, Reliability::BestEffort);
    }

    #[test]
    fn oversized_data_is_a_contract_violation() {
        let transport = StubTransport::with_peers(1);
        let data = CollaborationData::new(Priority::Normal, vec![0; codec::MAX_PAYLOAD + 1]);
        assert!(matches!(
            relay_outbound(&data, &transport),
            Err(ContractViolation::Oversized { .. })
        ));
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn collaboration_data_containing_the_prefix_goes_to_the_engine() {
        let (engine, mut registry, mut lifecycle) = inbound_env();
        let peer = PeerHandle::generate();
        let data = CollaborationData::new(Priority::Critical, b"SessionID:not-a-handshake".to_vec());
        let bytes = codec::encode_collaboration(&data).unwrap();

        let dispatched = relay_inbound(&bytes, peer, engine.as_ref(), &mut registry, &mut lifecycle);
        assert_eq!(dispatched, Dispatched::Collaboration);
        assert_eq!(engine.applied(), vec![data]);
        assert!(registry.is_empty());
    }

    #[test]
    fn handshake_text_goes_to_the_registry() {
        let (engine, mut registry, mut lifecycle) = inbound_env();
        let peer = PeerHandle::generate();
        let expected: SessionId = "abc-123".parse().unwrap();

        let dispatched =
            relay_inbound(b"SessionID:abc-123", peer, engine.as_ref(), &mut registry, &mut lifecycle);
        assert_eq!(dispatched, Dispatched::Handshake(expected.clone(), HandshakeOutcome::New));
        assert_eq!(registry.session_of(&peer), Some(&expected));
        assert!(engine.applied().is_empty());
    }

    #[test]
    fn garbage_is_discarded_without_side_effects() {
        let (engine, mut registry, mut lifecycle) = inbound_env();
        let peer = PeerHandle::generate();
        engine.insert(Anchor::local(None, Transform::identity()));

        let garbage: [&[u8]; 4] = [&[0xff, 0x00, 0x9c, 0x42], b"hello", b"ARCD", b""];
        for bytes in garbage.iter() {
            let dispatched = relay_inbound(bytes, peer, engine.as_ref(), &mut registry, &mut lifecycle);
            assert_eq!(dispatched, Dispatched::Discarded);
        }
        assert!(engine.applied().is_empty());
        assert!(engine.removed().is_empty());
        assert_eq!(engine.anchors().len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn new_handshake_from_known_peer_retracts_old_anchors() {
        let (engine, mut registry, mut lifecycle) = inbound_env();
        let peer = PeerHandle::generate();
        let old = SessionId::generate();
        let new = SessionId::generate();
        engine.insert(Anchor::participant(old.clone(), Transform::identity()));

        let _ = relay_inbound(&codec::encode_handshake(&old), peer, engine.as_ref(), &mut registry, &mut lifecycle);
        assert_eq!(engine.anchors().len(), 1);

        let dispatched =
            relay_inbound(&codec::encode_handshake(&new), peer, engine.as_ref(), &mut registry, &mut lifecycle);
        assert_eq!(dispatched, Dispatched::Handshake(new.clone(), HandshakeOutcome::Replaced(old)));
        assert!(engine.anchors().is_empty());
        assert_eq!(registry.session_of(&peer), Some(&new));
    }
}

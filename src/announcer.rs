//! Tells peers which tracking session this device is running.
use crate::peer::PeerHandle;
use crate::relay::codec;
use crate::session_id::SessionId;
use crate::transport::{Destination, Reliability, Transport};

use tracing::{debug, info, warn};

pub struct SessionAnnouncer {
    local: SessionId,
}

impl SessionAnnouncer {
    pub fn new(local: SessionId) -> Self {
        SessionAnnouncer { local }
    }

    pub fn local(&self) -> &SessionId {
        &self.local
    }

    /// Announces `session_id` to every connected peer if it differs from the current one.
    /// Returns the number of peers addressed.
    pub fn on_local_session_changed(&mut self, session_id: SessionId, transport: &dyn Transport) -> usize {
        if session_id == self.local {
            debug!("session {} unchanged, nothing to announce", session_id);
            return 0;
        }
        info!("local session changed {} -> {}", self.local, session_id);
        self.local = session_id;
        let peers = transport.connected_peers();
        if peers.is_empty() {
            return 0;
        }
        let n = peers.len();
        self.announce(Destination::Peers(peers), transport);
        n
    }

    /// Sends the current session to a peer that just joined.
    pub fn on_peer_joined(&self, peer: PeerHandle, transport: &dyn Transport) {
        self.announce(Destination::Peers(vec![peer]), transport);
    }

    fn announce(&self, destination: Destination, transport: &dyn Transport) {
        let handshake = codec::encode_handshake(&self.local);
        if let Err(err) = transport.send(handshake, Reliability::Reliable, destination) {
            warn!("handshake for {} not sent: {:?}", self.local, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Result;

    use bytes::Bytes;

    use std::sync::Mutex;

    struct StubTransport {
        peers: Vec<PeerHandle>,
        sent: Mutex<Vec<(Bytes, Reliability, Destination)>>,
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

    fn transport(n: usize) -> StubTransport {
        StubTransport { peers: (0..n).map(|_| PeerHandle::generate()).collect(), sent: Mutex::new(vec![]) }
    }

    #[test]
    fn change_is_announced_reliably_to_all_peers() {
        let transport = transport(3);
        let mut announcer = SessionAnnouncer::new(SessionId::generate());
        let next = SessionId::generate();

        assert_eq!(announcer.on_local_session_changed(next.clone(), &transport), 3);
        assert_eq!(announcer.local(), &next);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (bytes, reliability, destination) = &sent[0];
        assert_eq!(&bytes[..], format!("SessionID:{}", next).as_bytes());
        assert_eq!(*reliability, Reliability::Reliable);
        assert_eq!(*destination, Destination::Peers(transport.peers.clone()));
    }

    #[test]
    fn unchanged_session_is_not_announced() {
        let transport = transport(2);
        let local = SessionId::generate();
        let mut announcer = SessionAnnouncer::new(local.clone());
        assert_eq!(announcer.on_local_session_changed(local, &transport), 0);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn change_without_peers_only_updates_local() {
        let transport = transport(0);
        let mut announcer = SessionAnnouncer::new(SessionId::generate());
        let next = SessionId::generate();
        assert_eq!(announcer.on_local_session_changed(next.clone(), &transport), 0);
        assert_eq!(announcer.local(), &next);
        assert!(transport.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn late_joiner_gets_the_current_session_alone() {
        let transport = transport(3);
        let local = SessionId::generate();
        let announcer = SessionAnnouncer::new(local.clone());
        let joiner = transport.peers[1];

        announcer.on_peer_joined(joiner, &transport);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, codec::encode_handshake(&local));
        assert_eq!(sent[0].2, Destination::Peers(vec![joiner]));
    }
}

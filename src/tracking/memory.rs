//! In-process tracking engine used by tests and the demo node.
//!
//! Collaboration payloads produced by `MemoryEngine::share` are bincode encoded anchor
//! lists; applying one upserts those anchors the way a real engine materialises the
//! anchors of remote participants. Shared anchors without an origin go out stamped with
//! the sharing engine's session, so peers can retract them when that session ends.
use super::{AnchorsAdded, CollaborationData, Priority, TrackingEngine};

use crate::anchor::{Anchor, AnchorId};
use crate::session_id::SessionId;
use crate::Result;

use actix::Recipient;
use tracing::{debug, warn};

use std::sync::{Mutex, MutexGuard};

#[derive(Debug)]
struct EngineState {
    session_id: SessionId,
    anchors: Vec<Anchor>,
    applied: Vec<CollaborationData>,
    removed: Vec<AnchorId>,
}

pub struct MemoryEngine {
    state: Mutex<EngineState>,
    subscriber: Mutex<Option<Recipient<AnchorsAdded>>>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        MemoryEngine::new()
    }
}

impl MemoryEngine {
    pub fn new() -> Self {
        MemoryEngine::with_session(SessionId::generate())
    }

    pub fn with_session(session_id: SessionId) -> Self {
        MemoryEngine {
            state: Mutex::new(EngineState {
                session_id,
                anchors: vec![],
                applied: vec![],
                removed: vec![],
            }),
            subscriber: Mutex::new(None),
        }
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Delivers `AnchorsAdded` to `recipient` from now on.
    pub fn subscribe(&self, recipient: Recipient<AnchorsAdded>) {
        let mut subscriber = self.subscriber.lock().unwrap_or_else(|p| p.into_inner());
        *subscriber = Some(recipient);
    }

    fn notify(&self, anchors: Vec<Anchor>) {
        if anchors.is_empty() {
            return;
        }
        let subscriber = self.subscriber.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(recipient) = subscriber.as_ref() {
            let _ = recipient.do_send(AnchorsAdded { anchors });
        }
    }

    /// Inserts an anchor without notifying the subscriber.
    pub fn insert(&self, anchor: Anchor) {
        self.state().anchors.push(anchor);
    }

    /// Restarts tracking under a fresh session id. Anchors are kept.
    pub fn reset(&self) -> SessionId {
        let session_id = SessionId::generate();
        self.state().session_id = session_id.clone();
        session_id
    }

    /// Packs `anchors` into a payload other `MemoryEngine`s can apply.
    pub fn share(&self, anchors: &[Anchor], priority: Priority) -> Result<CollaborationData> {
        let session_id = self.session_id();
        let stamped: Vec<Anchor> = anchors
            .iter()
            .cloned()
            .map(|mut anchor| {
                if anchor.origin.is_none() {
                    anchor.origin = Some(session_id.clone());
                }
                anchor
            })
            .collect();
        let payload = bincode::serialize(&stamped)?;
        Ok(CollaborationData::new(priority, payload))
    }

    pub fn applied(&self) -> Vec<CollaborationData> {
        self.state().applied.clone()
    }

    pub fn removed(&self) -> Vec<AnchorId> {
        self.state().removed.clone()
    }

    pub fn anchor(&self, id: &AnchorId) -> Option<Anchor> {
        self.state().anchors.iter().find(|a| a.id == *id).cloned()
    }
}

impl TrackingEngine for MemoryEngine {
    fn session_id(&self) -> SessionId {
        self.state().session_id.clone()
    }

    fn update_with_collaboration_data(&self, data: CollaborationData) {
        let shared: Vec<Anchor> = match bincode::deserialize(&data.payload) {
            Ok(anchors) => anchors,
            Err(_) => {
                // Payloads of other engines are applied opaquely
                debug!("applied {} opaque bytes", data.payload.len());
                self.state().applied.push(data);
                return;
            }
        };
        let mut added = vec![];
        {
            let mut state = self.state();
            for anchor in shared {
                match state.anchors.iter_mut().find(|a| a.id == anchor.id) {
                    Some(existing) => existing.transform = anchor.transform,
                    None => {
                        state.anchors.push(anchor.clone());
                        added.push(anchor);
                    }
                }
            }
            state.applied.push(data);
        }
        self.notify(added);
    }

    fn anchors(&self) -> Vec<Anchor> {
        self.state().anchors.clone()
    }

    fn add_anchor(&self, anchor: Anchor) {
        self.state().anchors.push(anchor.clone());
        self.notify(vec![anchor]);
    }

    fn remove_anchor(&self, id: AnchorId) {
        let mut state = self.state();
        let before = state.anchors.len();
        state.anchors.retain(|a| a.id != id);
        if state.anchors.len() == before {
            warn!("remove requested for unknown anchor {:?}", id);
            return;
        }
        state.removed.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::Transform;

    #[test]
    fn shared_anchors_are_upserted() {
        let remote = SessionId::generate();
        let marker = Anchor::participant(remote.clone(), Transform::identity());
        let data = MemoryEngine::new().share(&[marker.clone()], Priority::Critical).unwrap();

        let engine = MemoryEngine::new();
        engine.update_with_collaboration_data(data.clone());
        // Duplicate delivery does not duplicate the anchor
        engine.update_with_collaboration_data(data);

        assert_eq!(engine.anchors(), vec![marker]);
        assert_eq!(engine.applied().len(), 2);
    }

    #[test]
    fn unowned_anchors_are_shared_under_the_local_session() {
        let sender = MemoryEngine::new();
        let placed = Anchor::placed("Laser", None, Transform::identity());
        sender.insert(placed.clone());
        let data = sender.share(&[placed.clone()], Priority::Critical).unwrap();

        let receiver = MemoryEngine::new();
        receiver.update_with_collaboration_data(data);

        assert_eq!(receiver.anchor(&placed.id).and_then(|a| a.origin), Some(sender.session_id()));
        // The local copy stays unowned
        assert_eq!(sender.anchor(&placed.id).and_then(|a| a.origin), None);
    }

    #[test]
    fn opaque_payloads_are_recorded() {
        let engine = MemoryEngine::new();
        engine.update_with_collaboration_data(CollaborationData::new(Priority::Normal, vec![1]));
        assert!(engine.anchors().is_empty());
        assert_eq!(engine.applied().len(), 1);
    }

    #[test]
    fn reset_rotates_the_session() {
        let engine = MemoryEngine::new();
        let before = engine.session_id();
        assert_ne!(engine.reset(), before);
        assert_ne!(engine.session_id(), before);
    }

    #[test]
    fn removing_unknown_anchor_is_absorbed() {
        let engine = MemoryEngine::new();
        engine.remove_anchor(AnchorId::generate());
        assert!(engine.removed().is_empty());
    }
}

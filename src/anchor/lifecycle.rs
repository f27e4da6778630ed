use super::AnchorId;

use crate::registry::Retract;
use crate::session_id::SessionId;
use crate::tracking::TrackingEngine;

use tracing::debug;

use std::sync::Arc;

/// Retracts the anchors a departed session contributed.
///
/// Works on the engine's current snapshot and only issues remove requests, so running it
/// twice for the same session is harmless.
pub struct AnchorLifecycle {
    engine: Arc<dyn TrackingEngine>,
}

impl AnchorLifecycle {
    pub fn new(engine: Arc<dyn TrackingEngine>) -> Self {
        AnchorLifecycle { engine }
    }

    pub fn retract_from(&self, session_id: &SessionId) -> Vec<AnchorId> {
        let retracted: Vec<AnchorId> = self
            .engine
            .anchors()
            .into_iter()
            .filter(|anchor| anchor.is_from(session_id))
            .map(|anchor| anchor.id)
            .collect();
        for id in retracted.iter() {
            debug!("removing anchor {:?} of {}", id, session_id);
            self.engine.remove_anchor(*id);
        }
        retracted
    }
}

impl Retract for AnchorLifecycle {
    fn retract_anchors_from(&mut self, session_id: &SessionId) -> usize {
        self.retract_from(session_id).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::{Anchor, Transform};
    use crate::tracking::memory::MemoryEngine;

    use std::collections::HashSet;

    #[test]
    fn retracts_exactly_the_departed_sessions_anchors() {
        let engine = Arc::new(MemoryEngine::new());
        let departed = SessionId::generate();
        let staying = SessionId::generate();

        let mut expected_left = HashSet::new();
        for i in 0..3 {
            engine.insert(Anchor::participant(departed.clone(), Transform::identity()));
            engine.insert(Anchor::placed("Laser", Some(departed.clone()), Transform::identity()));
            let kept = Anchor::participant(staying.clone(), Transform::translation(i as f32, 0.0, 0.0));
            let _ = expected_left.insert(kept.id);
            engine.insert(kept);
        }
        let local = Anchor::local(Some("plane"), Transform::identity());
        let _ = expected_left.insert(local.id);
        engine.insert(local);

        let mut lifecycle = AnchorLifecycle::new(engine.clone());
        assert_eq!(lifecycle.retract_anchors_from(&departed), 6);

        let left: HashSet<AnchorId> = engine.anchors().into_iter().map(|a| a.id).collect();
        assert_eq!(left, expected_left);
        assert_eq!(engine.removed().len(), 6);
    }

    #[test]
    fn rerunning_a_retraction_is_harmless() {
        let engine = Arc::new(MemoryEngine::new());
        let departed = SessionId::generate();
        engine.insert(Anchor::participant(departed.clone(), Transform::identity()));

        let lifecycle = AnchorLifecycle::new(engine.clone());
        assert_eq!(lifecycle.retract_from(&departed).len(), 1);
        assert!(lifecycle.retract_from(&departed).is_empty());
        assert!(engine.anchors().is_empty());
    }
}

//! Boundary with the local spatial-tracking engine.
//!
//! The engine owns the anchor set and produces opaque collaboration payloads. This
//! crate only reads anchor snapshots, issues add/remove requests and passes payloads
//! through.
pub mod memory;

use crate::anchor::{Anchor, AnchorId, Transform};
use crate::relay::{ContractViolation, Relayed};
use crate::session_id::SessionId;

/// Delivery priority the engine assigns to a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Must eventually reach every peer (e.g. new map anchors).
    Critical,
    /// Superseded by the next delta, fine to lose.
    Normal,
}

/// Incremental world-map update produced and consumed by tracking engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborationData {
    pub priority: Priority,
    pub payload: Vec<u8>,
}

impl CollaborationData {
    pub fn new(priority: Priority, payload: Vec<u8>) -> Self {
        CollaborationData { priority, payload }
    }

    pub fn is_critical(&self) -> bool {
        self.priority == Priority::Critical
    }
}

pub trait TrackingEngine: Sync + Send {
    /// Identifier of the current tracking run.
    fn session_id(&self) -> SessionId;

    fn update_with_collaboration_data(&self, data: CollaborationData);

    /// Snapshot of all anchors currently in the world.
    fn anchors(&self) -> Vec<Anchor>;

    fn add_anchor(&self, anchor: Anchor);

    fn remove_anchor(&self, anchor: AnchorId);
}

//-- Events the engine delivers to the session actor

/// The engine produced collaboration data for the other peers.
#[derive(Debug, Clone, Message)]
#[rtype(result = "Result<Relayed, ContractViolation>")]
pub struct CollaborationDataReady {
    pub data: CollaborationData,
}

/// The engine added anchors to the world (local, synced or relayed).
#[derive(Debug, Clone, Message)]
#[rtype(result = "()")]
pub struct AnchorsAdded {
    pub anchors: Vec<Anchor>,
}

/// The engine restarted its session, e.g. after a tracking reset.
#[derive(Debug, Clone, Message)]
#[rtype(result = "()")]
pub struct SessionIdChanged {
    pub session_id: SessionId,
}

/// User gesture asking for an object at `transform`.
#[derive(Debug, Clone, Message)]
#[rtype(result = "AnchorId")]
pub struct PlaceMarker {
    pub transform: Transform,
}

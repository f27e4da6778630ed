//! Anchors of the shared world and their retraction.
mod lifecycle;
pub mod palette;

pub use lifecycle::AnchorLifecycle;
pub use palette::{color_for, Color};

use crate::session_id::SessionId;

use uuid::Uuid;

use std::fmt;

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone)]
#[derive(Serialize, Deserialize, MessageResponse)]
pub struct AnchorId(Uuid);

impl AnchorId {
    pub fn generate() -> AnchorId {
        AnchorId(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> AnchorId {
        AnchorId(uuid)
    }
}

impl fmt::Debug for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", &self.0.simple().to_string()[..8])
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an anchor came to exist, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorKind {
    /// Marks a remote participant; materialised by collaboration sync.
    Participant,
    /// A placed object, from a local gesture or relayed from a participant.
    Placed,
    /// Any other anchor the local engine created for itself.
    Local,
}

/// Column-major 4x4 pose, owned by the tracking engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform(pub [f32; 16]);

impl Transform {
    pub fn identity() -> Self {
        let mut m = [0f32; 16];
        m[0] = 1.0;
        m[5] = 1.0;
        m[10] = 1.0;
        m[15] = 1.0;
        Transform(m)
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut t = Transform::identity();
        t.0[12] = x;
        t.0[13] = y;
        t.0[14] = z;
        t
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::identity()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub id: AnchorId,
    pub kind: AnchorKind,
    /// Human-readable tag, e.g. the model name of a placed object.
    pub name: Option<String>,
    /// The session that created the anchor; `None` for local anchors.
    pub origin: Option<SessionId>,
    pub transform: Transform,
}

impl Anchor {
    pub fn participant(origin: SessionId, transform: Transform) -> Self {
        Anchor {
            id: AnchorId::generate(),
            kind: AnchorKind::Participant,
            name: None,
            origin: Some(origin),
            transform,
        }
    }

    pub fn placed(name: &str, origin: Option<SessionId>, transform: Transform) -> Self {
        Anchor {
            id: AnchorId::generate(),
            kind: AnchorKind::Placed,
            name: Some(name.to_owned()),
            origin,
            transform,
        }
    }

    pub fn local(name: Option<&str>, transform: Transform) -> Self {
        Anchor {
            id: AnchorId::generate(),
            kind: AnchorKind::Local,
            name: name.map(str::to_owned),
            origin: None,
            transform,
        }
    }

    pub fn is_from(&self, session_id: &SessionId) -> bool {
        self.origin.as_ref() == Some(session_id)
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

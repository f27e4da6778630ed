//! What the presentation layer is asked to show when anchors appear.
use crate::anchor::{color_for, Anchor, AnchorId, AnchorKind, Color};
use crate::peer::PeerHandle;

use tracing::debug;

/// Rendering requests for the 3-D scene.
#[derive(Debug, Clone, PartialEq, Message)]
#[rtype(result = "()")]
pub enum SceneCommand {
    /// A colored marker following a remote participant.
    ShowParticipant { anchor: AnchorId, color: Color },
    /// A transient object effect, removed again after the object lifetime.
    PlaceObject { anchor: AnchorId, model: String, color: Color },
    Remove { anchor: AnchorId },
}

/// User-facing notices (alerts, status lines).
#[derive(Debug, Clone, PartialEq, Message)]
#[rtype(result = "()")]
pub enum Notice {
    /// The first participant appeared on this device.
    FirstConnection,
    PeerJoining(PeerHandle),
    PeerLeft(PeerHandle),
    /// A peer was refused because the session is full.
    CapacityReached(PeerHandle),
}

#[derive(Debug, Default, PartialEq)]
pub struct SceneUpdate {
    pub commands: Vec<SceneCommand>,
    pub first_connection: bool,
}

/// Turns added anchors into scene commands.
pub struct SceneDirector {
    object_model: String,
    participant_seen: bool,
}

impl SceneDirector {
    pub fn new(object_model: &str) -> Self {
        SceneDirector { object_model: object_model.to_owned(), participant_seen: false }
    }

    pub fn object_model(&self) -> &str {
        &self.object_model
    }

    pub fn on_anchors_added(&mut self, anchors: &[Anchor]) -> SceneUpdate {
        let mut update = SceneUpdate::default();
        for anchor in anchors {
            match anchor.kind {
                AnchorKind::Participant => {
                    if !self.participant_seen {
                        self.participant_seen = true;
                        update.first_connection = true;
                    }
                    let color = anchor.origin.as_ref().map(color_for).unwrap_or(Color::White);
                    update.commands.push(SceneCommand::ShowParticipant { anchor: anchor.id, color });
                }
                AnchorKind::Placed | AnchorKind::Local => (),
            }
            if anchor.is_named(&self.object_model) {
                // Objects from a known participant take its color, local ones are white
                let color = anchor.origin.as_ref().map(color_for).unwrap_or(Color::White);
                update.commands.push(SceneCommand::PlaceObject {
                    anchor: anchor.id,
                    model: self.object_model.clone(),
                    color,
                });
            }
        }
        debug!("{} anchors -> {} scene commands", anchors.len(), update.commands.len());
        update
    }
}

use crate::prelude::*;

use crate::announcer::SessionAnnouncer;
use crate::anchor::{Anchor, AnchorId, AnchorLifecycle};
use crate::peer::PeerTable;
use crate::registry::PeerRegistry;
use crate::relay::{self, ContractViolation, Dispatched, Relayed};
use crate::scene::{Notice, SceneCommand, SceneDirector};
use crate::settings::Settings;
use crate::tracking::{
    AnchorsAdded, CollaborationDataReady, PlaceMarker, SessionIdChanged, TrackingEngine,
};
use crate::transport::{DataReceived, PeerDiscovered, PeerEvents, PeerJoined, PeerLeft, Transport};


/// The per-device collaboration session.
///
/// Every transport and tracking event arrives as a message, so the registry, the peer
/// table and the anchor bookkeeping are only ever touched from this actor's mailbox.
pub struct Session {
    transport: Arc<dyn Transport>,
    engine: Arc<dyn TrackingEngine>,
    /// Rendering requests for the presentation layer.
    scene: Recipient<SceneCommand>,
    /// Alerts and status updates for the user.
    notices: Recipient<Notice>,
    registry: PeerRegistry,
    announcer: SessionAnnouncer,
    lifecycle: AnchorLifecycle,
    director: SceneDirector,
    peers: PeerTable,
    /// How long placed object effects stay in the scene.
    object_lifetime: Duration,
}

impl Session {
    pub fn new(
        settings: &Settings,
        transport: Arc<dyn Transport>,
        engine: Arc<dyn TrackingEngine>,
        scene: Recipient<SceneCommand>,
        notices: Recipient<Notice>,
    ) -> Self {
        Session {
            announcer: SessionAnnouncer::new(engine.session_id()),
            lifecycle: AnchorLifecycle::new(engine.clone()),
            registry: PeerRegistry::new(settings.max_peers),
            director: SceneDirector::new(&settings.placed_object_model),
            peers: PeerTable::new(),
            object_lifetime: settings.object_lifetime(),
            transport,
            engine,
            scene,
            notices,
        }
    }

    /// Recipients a transport delivers this session's peer events to.
    pub fn peer_events(addr: &Addr<Session>) -> PeerEvents {
        PeerEvents {
            discovered: addr.clone().recipient(),
            joined: addr.clone().recipient(),
            left: addr.clone().recipient(),
            data: addr.clone().recipient(),
        }
    }

    fn notify(&self, notice: Notice) {
        let _ = self.notices.do_send(notice);
    }
}

impl Actor for Session {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Context<Self>) {
        info!(
            "{} {:?} running {}",
            "[session]".cyan(),
            self.transport.local_peer(),
            self.announcer.local()
        );
    }
}

impl Handler<PeerDiscovered> for Session {
    type Result = bool;

    fn handle(&mut self, PeerDiscovered { peer }: PeerDiscovered, _ctx: &mut Context<Self>) -> bool {
        self.peers.discovered(peer);
        let mut occupied = self.transport.connected_peers();
        occupied.extend(self.peers.pending());
        if self.registry.admit(&peer, &occupied) {
            let state = self.peers.admitted(peer);
            debug!("{} admitting {:?} ({:?})", "[session]".cyan(), peer, state);
            true
        } else {
            let _ = self.peers.refused(&peer);
            self.notify(Notice::CapacityReached(peer));
            false
        }
    }
}

impl Handler<PeerJoined> for Session {
    type Result = ();

    fn handle(&mut self, PeerJoined { peer }: PeerJoined, _ctx: &mut Context<Self>) {
        let _ = self.peers.connected(peer);
        info!("{} {:?} joined", "[session]".cyan(), peer);
        self.notify(Notice::PeerJoining(peer));
        self.announcer.on_peer_joined(peer, self.transport.as_ref());
    }
}

impl Handler<PeerLeft> for Session {
    type Result = ();

    fn handle(&mut self, PeerLeft { peer }: PeerLeft, _ctx: &mut Context<Self>) {
        if let Some(session_id) = self.registry.on_peer_left(&peer, &mut self.lifecycle) {
            info!("{} {:?} left, was running {}", "[session]".cyan(), peer, session_id);
        }
        match self.peers.left(&peer) {
            Some(previous) if previous.is_joined() => self.notify(Notice::PeerLeft(peer)),
            Some(previous) => {
                debug!("{} {:?} never joined ({:?}), slot released", "[session]".cyan(), peer, previous)
            }
            None => debug!("{} {:?} left while unknown", "[session]".cyan(), peer),
        }
    }
}

impl Handler<DataReceived> for Session {
    type Result = Dispatched;

    fn handle(
        &mut self,
        DataReceived { peer, bytes }: DataReceived,
        _ctx: &mut Context<Self>,
    ) -> Dispatched {
        if !self.peers.get(&peer).map_or(false, PeerState::holds_slot) {
            warn!("{} discarding {} bytes from unadmitted {:?}", "[session]".cyan(), bytes.len(), peer);
            return Dispatched::Discarded;
        }
        let dispatched = relay::relay_inbound(
            &bytes,
            peer,
            self.engine.as_ref(),
            &mut self.registry,
            &mut self.lifecycle,
        );
        if let Dispatched::Handshake(session_id, _) = &dispatched {
            let _ = self.peers.handshake_known(peer, session_id.clone());
        }
        dispatched
    }
}

impl Handler<CollaborationDataReady> for Session {
    type Result = std::result::Result<Relayed, ContractViolation>;

    fn handle(&mut self, msg: CollaborationDataReady, _ctx: &mut Context<Self>) -> Self::Result {
        let relayed = relay::relay_outbound(&msg.data, self.transport.as_ref());
        if let Err(violation) = &relayed {
            error!("{} {}", "[session]".cyan(), violation);
        }
        relayed
    }
}

impl Handler<SessionIdChanged> for Session {
    type Result = ();

    fn handle(&mut self, SessionIdChanged { session_id }: SessionIdChanged, _ctx: &mut Context<Self>) {
        let _ = self.announcer.on_local_session_changed(session_id, self.transport.as_ref());
    }
}

impl Handler<AnchorsAdded> for Session {
    type Result = ();

    fn handle(&mut self, AnchorsAdded { anchors }: AnchorsAdded, ctx: &mut Context<Self>) {
        let update = self.director.on_anchors_added(&anchors);
        if update.first_connection {
            self.notify(Notice::FirstConnection);
        }
        for command in update.commands {
            if let SceneCommand::PlaceObject { anchor, .. } = &command {
                let anchor = *anchor;
                let _ = ctx.run_later(self.object_lifetime, move |act, _ctx| {
                    let _ = act.scene.do_send(SceneCommand::Remove { anchor });
                });
            }
            let _ = self.scene.do_send(command);
        }
    }
}

impl Handler<PlaceMarker> for Session {
    type Result = AnchorId;

    fn handle(&mut self, PlaceMarker { transform }: PlaceMarker, _ctx: &mut Context<Self>) -> AnchorId {
        // Unowned locally; the engine stamps the session when the anchor is shared
        let anchor = Anchor::placed(self.director.object_model(), None, transform);
        let id = anchor.id;
        debug!("{} placing {:?}", "[session]".cyan(), id);
        self.engine.add_anchor(anchor);
        id
    }
}

//-- Introspection

#[derive(Debug, Clone, Message)]
#[rtype(result = "Option<PeerState>")]
pub struct GetPeerState {
    pub peer: PeerHandle,
}

impl Handler<GetPeerState> for Session {
    type Result = MessageResult<GetPeerState>;

    fn handle(&mut self, GetPeerState { peer }: GetPeerState, _ctx: &mut Context<Self>) -> Self::Result {
        MessageResult(self.peers.get(&peer).cloned())
    }
}

#[derive(Debug, Clone, Message)]
#[rtype(result = "RegistrySnapshot")]
pub struct GetRegistry;

#[derive(Debug, Clone, PartialEq, MessageResponse)]
pub struct RegistrySnapshot {
    pub sessions: Vec<(PeerHandle, SessionId)>,
}

impl RegistrySnapshot {
    pub fn session_of(&self, peer: &PeerHandle) -> Option<&SessionId> {
        self.sessions.iter().find(|(p, _)| p == peer).map(|(_, s)| s)
    }
}

impl Handler<GetRegistry> for Session {
    type Result = RegistrySnapshot;

    fn handle(&mut self, _msg: GetRegistry, _ctx: &mut Context<Self>) -> RegistrySnapshot {
        let mut sessions: Vec<(PeerHandle, SessionId)> =
            self.registry.iter().map(|(p, s)| (*p, s.clone())).collect();
        sessions.sort();
        RegistrySnapshot { sessions }
    }
}

#[derive(Debug, Clone, Message)]
#[rtype(result = "LocalSession")]
pub struct GetLocalSession;

#[derive(Debug, Clone, PartialEq, MessageResponse)]
pub struct LocalSession(pub SessionId);

impl Handler<GetLocalSession> for Session {
    type Result = LocalSession;

    fn handle(&mut self, _msg: GetLocalSession, _ctx: &mut Context<Self>) -> LocalSession {
        LocalSession(self.announcer.local().clone())
    }
}

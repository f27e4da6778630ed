//! A scripted multi-device session over the in-memory hub.
use crate::anchor::{Anchor, Transform};
use crate::colored::Colorize;
use crate::peer::PeerHandle;
use crate::relay::Relayed;
use crate::scene::{Notice, SceneCommand};
use crate::session::{GetRegistry, Session};
use crate::settings::Settings;
use crate::tracking::memory::MemoryEngine;
use crate::tracking::{
    CollaborationDataReady, PlaceMarker, Priority, SessionIdChanged, TrackingEngine,
};
use crate::transport::memory::MemoryHub;
use crate::Result;

use actix::{Actor, Addr, Context, Handler};
use tracing::{error, info};

use std::sync::Arc;
use std::time::Duration;

/// Prints what a device would render or alert.
pub struct Console {
    name: String,
}

impl Actor for Console {
    type Context = Context<Self>;
}

impl Handler<SceneCommand> for Console {
    type Result = ();

    fn handle(&mut self, msg: SceneCommand, _ctx: &mut Context<Self>) -> Self::Result {
        match msg {
            SceneCommand::ShowParticipant { anchor, color } => {
                info!("[{}] {} participant {:?} in {:?}", self.name, "show".green(), anchor, color)
            }
            SceneCommand::PlaceObject { anchor, model, color } => {
                info!("[{}] {} {} {:?} in {:?}", self.name, "place".green(), model, anchor, color)
            }
            SceneCommand::Remove { anchor } => info!("[{}] {} {:?}", self.name, "remove".red(), anchor),
        }
    }
}

impl Handler<Notice> for Console {
    type Result = ();

    fn handle(&mut self, msg: Notice, _ctx: &mut Context<Self>) -> Self::Result {
        match msg {
            Notice::FirstConnection => info!("[{}] {}", self.name, "Connected!".green().bold()),
            Notice::PeerJoining(peer) => info!("[{}] {:?} is joining", self.name, peer),
            Notice::PeerLeft(peer) => info!("[{}] {:?} left", self.name, peer),
            Notice::CapacityReached(peer) => {
                info!("[{}] {} {:?} refused", self.name, "session full:".yellow(), peer)
            }
        }
    }
}

/// One simulated phone: its engine and session actor.
pub struct Device {
    pub name: String,
    pub peer: PeerHandle,
    pub engine: Arc<MemoryEngine>,
    pub session: Addr<Session>,
}

impl Device {
    pub fn spawn(hub: &MemoryHub, settings: &Settings, name: &str) -> Device {
        let peer = PeerHandle::new(name.as_bytes());
        let engine = Arc::new(MemoryEngine::new());
        let console = Console { name: name.to_owned() }.start();
        let session = Session::new(
            settings,
            hub.transport(peer),
            engine.clone(),
            console.clone().recipient(),
            console.recipient(),
        )
        .start();
        hub.attach(peer, Session::peer_events(&session));
        engine.subscribe(session.clone().recipient());
        Device { name: name.to_owned(), peer, engine, session }
    }

    /// Shares a participant marker for the current session with every peer.
    pub async fn share_presence(&self, transform: Transform) -> Result<()> {
        let marker = Anchor::participant(self.engine.session_id(), transform);
        self.engine.insert(marker.clone());
        self.share(&[marker], Priority::Critical).await
    }

    pub async fn place_object(&self, transform: Transform) -> Result<()> {
        let id = self.session.send(PlaceMarker { transform }).await?;
        if let Some(anchor) = self.engine.anchor(&id) {
            self.share(&[anchor], Priority::Critical).await?;
        }
        Ok(())
    }

    /// Restarts tracking and announces the new session.
    pub async fn reset(&self) -> Result<()> {
        let session_id = self.engine.reset();
        self.session.send(SessionIdChanged { session_id }).await?;
        Ok(())
    }

    async fn share(&self, anchors: &[Anchor], priority: Priority) -> Result<()> {
        let data = self.engine.share(anchors, priority)?;
        match self.session.send(CollaborationDataReady { data }).await? {
            Ok(Relayed::Broadcast { peers, reliability }) => {
                let n = anchors.len();
                info!("[{}] shared {} anchors with {} peers ({:?})", self.name, n, peers, reliability)
            }
            Ok(Relayed::Dropped) => info!("[{}] nobody to share with", self.name),
            Err(violation) => error!("[{}] {}", self.name, violation),
        }
        Ok(())
    }
}

async fn settle() {
    actix::clock::sleep(Duration::from_millis(50)).await;
}

/// Connects `devices` phones to the first one, exchanges markers, places an object,
/// resets one session and drops the last phone.
pub async fn run_demo(settings: Settings, devices: usize) -> Result<()> {
    settings.validate()?;
    info!("{} {} with {} devices", "starting".green(), settings.service_name, devices);
    let hub = MemoryHub::new(settings.unreliable_loss);
    let fleet: Vec<Device> =
        (0..devices).map(|i| Device::spawn(&hub, &settings, &format!("device-{}", i))).collect();
    let host = match fleet.first() {
        Some(host) => host,
        None => return Ok(()),
    };

    for guest in fleet.iter().skip(1) {
        let _ = hub.connect(host.peer, guest.peer).await?;
    }
    settle().await;

    for (i, device) in fleet.iter().enumerate() {
        device.share_presence(Transform::translation(i as f32, 0.0, -1.0)).await?;
    }
    settle().await;

    host.place_object(Transform::translation(0.0, 0.5, -2.0)).await?;
    settle().await;

    if let Some(guest) = fleet.get(1) {
        guest.reset().await?;
        guest.share_presence(Transform::translation(1.0, 0.0, -1.5)).await?;
        settle().await;
    }

    if let Some(last) = fleet.last().filter(|d| d.peer != host.peer) {
        info!("{} {}", "detaching".red(), last.name);
        hub.detach(last.peer).await?;
    }
    actix::clock::sleep(settings.object_lifetime() + Duration::from_millis(50)).await;

    for device in fleet.iter() {
        let registry = device.session.send(GetRegistry).await?;
        info!(
            "[{}] knows {} sessions, holds {} anchors",
            device.name,
            registry.sessions.len(),
            device.engine.anchors().len()
        );
    }
    info!("{} {} frames exchanged", "done:".green(), hub.frames().len());
    Ok(())
}

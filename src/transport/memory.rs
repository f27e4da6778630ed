//! In-process mesh transport.
//!
//! Devices attach their event recipients to a `MemoryHub` and obtain a `MemoryTransport`
//! for sending. Connections go through discovery admission on both ends before the join
//! is reported. Every frame is recorded, and best-effort frames can be dropped to exercise
//! lossy delivery.
use super::{
    DataReceived, Destination, PeerDiscovered, PeerEvents, PeerJoined, PeerLeft, Reliability,
    Transport,
};

use crate::colored::Colorize;
use crate::peer::PeerHandle;
use crate::{Error, Result};

use bytes::Bytes;
use rand::Rng;
use tracing::{debug, info};

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub from: PeerHandle,
    pub to: PeerHandle,
    pub reliability: Reliability,
    pub bytes: Bytes,
    /// `false` when the frame was lost in transit.
    pub delivered: bool,
}

struct Device {
    events: Option<PeerEvents>,
    links: BTreeSet<PeerHandle>,
}

struct HubState {
    devices: HashMap<PeerHandle, Device>,
    frames: Vec<Frame>,
    unreliable_loss: f64,
}

impl HubState {
    fn events(&self, peer: &PeerHandle) -> Result<PeerEvents> {
        self.devices
            .get(peer)
            .and_then(|device| device.events.clone())
            .ok_or(Error::UnknownPeer(*peer))
    }
}

#[derive(Clone)]
pub struct MemoryHub {
    state: Arc<Mutex<HubState>>,
}

fn lock(state: &Mutex<HubState>) -> MutexGuard<'_, HubState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MemoryHub {
    /// `unreliable_loss` is the probability in `[0, 1]` of losing a best-effort frame.
    pub fn new(unreliable_loss: f64) -> Self {
        let state = HubState {
            devices: HashMap::new(),
            frames: vec![],
            unreliable_loss: unreliable_loss.max(0.0).min(1.0),
        };
        MemoryHub { state: Arc::new(Mutex::new(state)) }
    }

    /// Creates the sending side for a new device.
    pub fn transport(&self, peer: PeerHandle) -> Arc<MemoryTransport> {
        let _ = lock(&self.state)
            .devices
            .entry(peer)
            .or_insert(Device { events: None, links: BTreeSet::new() });
        Arc::new(MemoryTransport { local: peer, state: self.state.clone() })
    }

    /// Registers where the events of `peer` are delivered.
    pub fn attach(&self, peer: PeerHandle, events: PeerEvents) {
        let mut state = lock(&self.state);
        let device = state.devices.entry(peer).or_insert(Device { events: None, links: BTreeSet::new() });
        device.events = Some(events);
    }

    /// Runs discovery on both ends and joins `a` and `b` if both admit.
    pub async fn connect(&self, a: PeerHandle, b: PeerHandle) -> Result<bool> {
        let (a_events, b_events) = {
            let state = lock(&self.state);
            (state.events(&a)?, state.events(&b)?)
        };
        let (a_admits, b_admits) = futures::future::join(
            a_events.discovered.send(PeerDiscovered { peer: b }),
            b_events.discovered.send(PeerDiscovered { peer: a }),
        )
        .await;
        let (a_admits, b_admits) = (a_admits?, b_admits?);
        if !(a_admits && b_admits) {
            info!("{} {:?} <-> {:?}", "refused".yellow(), a, b);
            // The side that admitted gives its reserved slot back
            if a_admits {
                a_events.left.send(PeerLeft { peer: b }).await?;
            }
            if b_admits {
                b_events.left.send(PeerLeft { peer: a }).await?;
            }
            return Ok(false);
        }
        {
            let mut state = lock(&self.state);
            for (from, to) in [(a, b), (b, a)].iter() {
                if let Some(device) = state.devices.get_mut(from) {
                    let _ = device.links.insert(*to);
                }
            }
        }
        a_events.joined.send(PeerJoined { peer: b }).await?;
        b_events.joined.send(PeerJoined { peer: a }).await?;
        info!("{} {:?} <-> {:?}", "connected".green(), a, b);
        Ok(true)
    }

    /// Drops the link between `a` and `b`, notifying both.
    pub async fn disconnect(&self, a: PeerHandle, b: PeerHandle) -> Result<()> {
        let (a_events, b_events) = {
            let mut state = lock(&self.state);
            let linked = state.devices.get_mut(&a).map(|d| d.links.remove(&b)).unwrap_or(false);
            if let Some(device) = state.devices.get_mut(&b) {
                let _ = device.links.remove(&a);
            }
            if !linked {
                return Ok(());
            }
            (state.events(&a)?, state.events(&b)?)
        };
        a_events.left.send(PeerLeft { peer: b }).await?;
        b_events.left.send(PeerLeft { peer: a }).await?;
        info!("{} {:?} <-> {:?}", "disconnected".red(), a, b);
        Ok(())
    }

    /// Removes `peer` from the mesh as if the device vanished.
    pub async fn detach(&self, peer: PeerHandle) -> Result<()> {
        let links: Vec<PeerHandle> = match lock(&self.state).devices.get(&peer) {
            Some(device) => device.links.iter().cloned().collect(),
            None => return Err(Error::UnknownPeer(peer)),
        };
        for other in links {
            self.disconnect(peer, other).await?;
        }
        let _ = lock(&self.state).devices.remove(&peer);
        Ok(())
    }

    pub fn frames(&self) -> Vec<Frame> {
        lock(&self.state).frames.clone()
    }

    pub fn clear_frames(&self) {
        lock(&self.state).frames.clear();
    }
}

pub struct MemoryTransport {
    local: PeerHandle,
    state: Arc<Mutex<HubState>>,
}

impl Transport for MemoryTransport {
    fn local_peer(&self) -> PeerHandle {
        self.local
    }

    fn connected_peers(&self) -> Vec<PeerHandle> {
        match lock(&self.state).devices.get(&self.local) {
            Some(device) => device.links.iter().cloned().collect(),
            None => vec![],
        }
    }

    fn send(&self, bytes: Bytes, reliability: Reliability, destination: Destination) -> Result<()> {
        let mut state = lock(&self.state);
        let links = match state.devices.get(&self.local) {
            Some(device) => device.links.clone(),
            None => return Err(Error::UnknownPeer(self.local)),
        };
        let targets: Vec<PeerHandle> = match destination {
            Destination::All => links.iter().cloned().collect(),
            Destination::Peers(peers) => {
                if let Some(missing) = peers.iter().find(|p| !links.contains(*p)) {
                    return Err(Error::PeerNotConnected(*missing));
                }
                peers
            }
        };
        let mut rng = rand::thread_rng();
        for to in targets {
            let lost = reliability == Reliability::BestEffort
                && state.unreliable_loss > 0.0
                && rng.gen::<f64>() < state.unreliable_loss;
            if lost {
                debug!("lost best-effort frame {:?} -> {:?}", self.local, to);
            } else if let Ok(events) = state.events(&to) {
                let _ = events.data.do_send(DataReceived { peer: self.local, bytes: bytes.clone() });
            }
            state.frames.push(Frame {
                from: self.local,
                to,
                reliability,
                bytes: bytes.clone(),
                delivered: !lost,
            });
        }
        Ok(())
    }
}

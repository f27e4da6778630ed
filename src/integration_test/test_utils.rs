use crate::node::Device;
use crate::settings::Settings;
use crate::transport::memory::MemoryHub;

use std::time::Duration;

// Hub deliveries and engine notifications are fire-and-forget
pub async fn settle() {
    actix::clock::sleep(Duration::from_millis(40)).await;
}

pub fn spawn_devices(hub: &MemoryHub, settings: &Settings, n: usize) -> Vec<Device> {
    (0..n).map(|i| Device::spawn(hub, settings, &format!("test-device-{}", i))).collect()
}

/// Connects every pair of `devices`.
pub async fn full_mesh(hub: &MemoryHub, devices: &[Device]) {
    for (i, a) in devices.iter().enumerate() {
        for b in devices.iter().skip(i + 1) {
            assert!(hub.connect(a.peer, b.peer).await.unwrap());
        }
    }
    settle().await;
}

//! Device discovery worker.
//!
//! Lists devices on a fixed interval. While nothing is selected the first
//! listed device is selected; a selected device that disappears from the
//! list is dropped so the next poll can pick another.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use rip_core::AddressSpace;

use crate::device::{Device, DeviceClient, DeviceInfo, DeviceSlot};
use crate::events::{DeviceEvent, Event, EventBus};

pub struct DiscoveryWorker {
    client: Arc<dyn DeviceClient>,
    devices: DeviceSlot,
    events: EventBus,
    interval: Duration,
    space: AddressSpace,
    shutdown: watch::Receiver<bool>,
    last_listing: Option<Vec<DeviceInfo>>,
}

impl DiscoveryWorker {
    pub fn new(
        client: Arc<dyn DeviceClient>,
        devices: DeviceSlot,
        events: EventBus,
        interval: Duration,
        space: AddressSpace,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            client,
            devices,
            events,
            interval,
            space,
            shutdown,
            last_listing: None,
        }
    }

    /// Main worker loop.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.poll().await,
                _ = self.shutdown.changed() => break,
            }
        }
        debug!("Discovery worker stopped");
    }

    async fn poll(&mut self) {
        let listing = match self.client.list_devices().await {
            Ok(listing) => listing,
            Err(e) => {
                debug!("Device listing failed: {}", e);
                return;
            }
        };

        if self.last_listing.as_ref() != Some(&listing) {
            self.events.publish(Event::Device(DeviceEvent::Discovered {
                devices: listing.clone(),
            }));
            self.last_listing = Some(listing.clone());
        }

        if let Some(current) = self.devices.get().await {
            if listing.iter().any(|info| info.uri == current.uri()) {
                return;
            }
            warn!("Device {} is no longer listed", current.uri());
            self.devices.clear().await;
            self.events.publish(Event::Device(DeviceEvent::Lost {
                uri: current.uri().to_string(),
            }));
        }

        if let Some(first) = listing.first() {
            info!("Selected device {} ({})", first.display_name, first.uri);
            self.devices
                .set(Device::new(Arc::clone(&self.client), first.uri.clone(), self.space))
                .await;
            self.events.publish(Event::Device(DeviceEvent::Selected {
                uri: first.uri.clone(),
            }));
        }
    }
}

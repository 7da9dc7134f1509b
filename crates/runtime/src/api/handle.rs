//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers for
//! managing runs, triggering deliveries, managing stored configurations, and
//! streaming events from specific topics.
use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};

use rip_content::Content;
use rip_core::{AddressSpace, DeviceSnapshot, ItemCatalog, RunRecord, WriteRecord};

use super::errors::{Result, RuntimeError};
use crate::device::{Device, DeviceClient, DeviceInfo, DeviceSlot};
use crate::events::{DeviceEvent, Event, EventBus, Topic};
use crate::repository::ConfigRepository;
use crate::session::SessionView;
use crate::workers::Command;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
    client: Arc<dyn DeviceClient>,
    devices: DeviceSlot,
    space: AddressSpace,
    configs: Arc<dyn ConfigRepository>,
    content: Arc<Content>,
}

impl RuntimeHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<Command>,
        event_bus: EventBus,
        client: Arc<dyn DeviceClient>,
        devices: DeviceSlot,
        space: AddressSpace,
        configs: Arc<dyn ConfigRepository>,
        content: Arc<Content>,
    ) -> Self {
        Self {
            command_tx,
            event_bus,
            client,
            devices,
            space,
            configs,
            content,
        }
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Start a run on the loaded ROM using the stored configuration `config`.
    ///
    /// A seeded run uses the ROM identity as its seed, so every player on the
    /// same ROM receives the same items; otherwise a random seed is drawn.
    pub async fn start_run(&self, config: &str, seeded: bool) -> Result<RunRecord> {
        self.request(|reply| Command::StartRun {
            config: config.to_string(),
            seeded,
            reply,
        })
        .await?
    }

    /// Delete the current run and clear its queue and history.
    pub async fn reset_run(&self) -> Result<()> {
        self.request(|reply| Command::ResetRun { reply }).await?
    }

    /// Start draining the queue now.
    ///
    /// Fails with `Busy` while a drain is running and with `NothingToSend`
    /// on an empty queue; neither touches the device.
    pub async fn drain(&self) -> Result<()> {
        self.request(|reply| Command::Drain { reply }).await?
    }

    /// Deliver one item outside the schedule.
    pub async fn send_item(&self, item: &str) -> Result<WriteRecord> {
        self.request(|reply| Command::SendItem {
            item: item.to_string(),
            reply,
        })
        .await?
    }

    /// Run a snapshot pass without waiting for the next tick.
    pub async fn refresh(&self) -> Result<()> {
        self.request(|reply| Command::Refresh { reply }).await?
    }

    /// Query the active session (read-only copy)
    pub async fn query_session(&self) -> Result<Option<SessionView>> {
        self.request(|reply| Command::QuerySession { reply }).await
    }

    /// Query the most recent device snapshot
    pub async fn query_snapshot(&self) -> Result<Option<DeviceSnapshot>> {
        self.request(|reply| Command::QuerySnapshot { reply }).await
    }

    pub async fn list_devices(&self) -> Result<Vec<DeviceInfo>> {
        Ok(self.client.list_devices().await?)
    }

    /// Select a device by URI, replacing the current selection.
    pub async fn select_device(&self, uri: &str) {
        self.devices
            .set(Device::new(Arc::clone(&self.client), uri, self.space))
            .await;
        self.event_bus
            .publish(Event::Device(DeviceEvent::Selected {
                uri: uri.to_string(),
            }));
    }

    pub async fn selected_device(&self) -> Option<String> {
        self.devices
            .get()
            .await
            .map(|device| device.uri().to_string())
    }

    /// Store a configuration after checking it resolves against the content.
    pub fn save_config(&self, name: &str, text: &str) -> Result<()> {
        self.content
            .schedule(text)
            .map_err(|e| RuntimeError::InvalidSchedule {
                name: name.to_string(),
                reason: format!("{e:#}"),
            })?;
        self.configs.save(name, text)?;
        Ok(())
    }

    pub fn load_config(&self, name: &str) -> Result<Option<String>> {
        Ok(self.configs.load(name)?)
    }

    pub fn delete_config(&self, name: &str) -> Result<()> {
        Ok(self.configs.delete(name)?)
    }

    pub fn list_configs(&self) -> Result<Vec<String>> {
        Ok(self.configs.list()?)
    }

    /// Item catalog, for sprite positions and identifiers.
    pub fn catalog(&self) -> &ItemCatalog {
        &self.content.catalog
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Device` - Discovery, selection, and snapshots
    /// - `Topic::Schedule` - Run lifecycle and scheduling passes
    /// - `Topic::Delivery` - Drain progress and single sends
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::Topic;
    ///
    /// let mut delivery_rx = handle.subscribe(Topic::Delivery);
    /// while let Ok(event) = delivery_rx.recv().await {
    ///     // Handle delivery events
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> std::collections::HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}

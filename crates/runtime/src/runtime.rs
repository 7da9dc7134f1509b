//! High-level runtime orchestrator.
//!
//! The runtime owns background workers, wires up command/event channels, and
//! exposes a builder-based API for clients to drive deliveries.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use rip_content::Content;
use rip_core::AddressSpace;

use crate::api::{Result, RuntimeError, RuntimeHandle};
use crate::delivery::{DeliveryProtocol, DeliveryTimings};
use crate::device::{DeviceClient, DeviceSlot};
use crate::events::{Event, EventBus, Topic};
use crate::repository::{
    ConfigRepository, InMemoryConfigRepository, InMemoryRunRepository, RunRepository,
};
use crate::workers::{Command, DiscoveryWorker, SessionContext, SessionWorker};

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// How often devices are listed.
    pub discovery_interval: Duration,
    /// How often the snapshot is read and the schedule replayed.
    pub snapshot_interval: Duration,
    pub delivery: DeliveryTimings,
    pub address_space: AddressSpace,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            discovery_interval: Duration::from_millis(1000),
            snapshot_interval: Duration::from_millis(750),
            delivery: DeliveryTimings::default(),
            address_space: AddressSpace::default(),
            event_buffer_size: 100,
            command_buffer_size: 32,
        }
    }
}

/// Main runtime that orchestrates discovery, scheduling, and delivery
///
/// Design: Runtime owns workers and coordinates execution.
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    shutdown_tx: watch::Sender<bool>,
    discovery_worker_handle: JoinHandle<()>,
    session_worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    /// Subscribe to events from a topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    /// Stop the workers and wait for them to finish.
    ///
    /// A drain or single send still in flight is aborted before the session
    /// worker exits; anything it had not yet written stays undelivered.
    pub async fn shutdown(self) -> Result<()> {
        // Receivers may already be gone; either way the workers stop.
        let _ = self.shutdown_tx.send(true);

        self.discovery_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;
        self.session_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)?;

        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    client: Option<Arc<dyn DeviceClient>>,
    content: Option<Content>,
    runs: Option<Arc<dyn RunRepository>>,
    configs: Option<Arc<dyn ConfigRepository>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            client: None,
            content: None,
            runs: None,
            configs: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the required device client
    pub fn device_client(mut self, client: Arc<dyn DeviceClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the catalog and categories (defaults to the built-in content)
    pub fn content(mut self, content: Content) -> Self {
        self.content = Some(content);
        self
    }

    /// Set the run record store (defaults to in-memory)
    pub fn run_repository(mut self, runs: Arc<dyn RunRepository>) -> Self {
        self.runs = Some(runs);
        self
    }

    /// Set the configuration store (defaults to in-memory)
    pub fn config_repository(mut self, configs: Arc<dyn ConfigRepository>) -> Self {
        self.configs = Some(configs);
        self
    }

    /// Build the runtime and spawn its workers
    pub async fn build(self) -> Result<Runtime> {
        let client = self.client.ok_or(RuntimeError::MissingDeviceClient)?;
        let content = match self.content {
            Some(content) => content,
            None => Content::builtin().map_err(|e| RuntimeError::Content(format!("{e:#}")))?,
        };
        let content = Arc::new(content);
        let runs = self
            .runs
            .unwrap_or_else(|| Arc::new(InMemoryRunRepository::new()));
        let configs = self
            .configs
            .unwrap_or_else(|| Arc::new(InMemoryConfigRepository::new()));

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);
        let devices = DeviceSlot::new();

        let handle = RuntimeHandle::new(
            command_tx,
            event_bus.clone(),
            Arc::clone(&client),
            devices.clone(),
            self.config.address_space,
            Arc::clone(&configs),
            Arc::clone(&content),
        );

        let discovery_worker = DiscoveryWorker::new(
            client,
            devices.clone(),
            event_bus.clone(),
            self.config.discovery_interval,
            self.config.address_space,
            shutdown_rx.clone(),
        );
        let discovery_worker_handle = tokio::spawn(async move {
            discovery_worker.run().await;
        });

        let protocol = DeliveryProtocol::new(
            self.config.delivery,
            Arc::new(content.catalog.clone()),
            event_bus.clone(),
        );
        let session_worker = SessionWorker::new(
            SessionContext {
                content,
                runs,
                configs,
                devices,
                protocol,
                events: event_bus,
            },
            self.config.snapshot_interval,
            command_rx,
            shutdown_rx,
        );
        let session_worker_handle = tokio::spawn(async move {
            session_worker.run().await;
        });

        tracing::info!("Runtime started");

        Ok(Runtime {
            handle,
            shutdown_tx,
            discovery_worker_handle,
            session_worker_handle,
        })
    }
}

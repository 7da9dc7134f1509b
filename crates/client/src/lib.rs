//! Top-level client wiring the runtime to a console report.
//!
//! # Architecture
//!
//! ```text
//! Client (Top-level container)
//!   ├─→ Runtime (discovery, scheduling, delivery)
//!   └─→ Report  (prints events as they arrive)
//! ```
//!
//! The client starts a run as soon as a compatible ROM without one is
//! detected, using the configured schedule, and otherwise only observes.

mod builder;
mod report;

pub use builder::ClientBuilder;
pub use report::describe;

use std::future::Future;

use anyhow::Result;
use rip_core::RomIdentity;
use runtime::{Event, Runtime, RuntimeHandle, ScheduleEvent, Topic};
use tokio::sync::broadcast::error::RecvError;

/// Top-level client container.
pub struct Client {
    runtime: Runtime,
    config_name: String,
    seeded: bool,
}

impl Client {
    /// Create a new ClientBuilder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Run until Ctrl-C, then shut the runtime down.
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
            }
        })
        .await
    }

    /// Run until `stop` completes, then shut the runtime down.
    pub async fn run_until(self, stop: impl Future<Output = ()>) -> Result<()> {
        let handle = self.runtime.handle();
        let mut device_rx = handle.subscribe(Topic::Device);
        let mut schedule_rx = handle.subscribe(Topic::Schedule);
        let mut delivery_rx = handle.subscribe(Topic::Delivery);
        tokio::pin!(stop);

        loop {
            let received = tokio::select! {
                _ = &mut stop => break,
                event = device_rx.recv() => event,
                event = schedule_rx.recv() => event,
                event = delivery_rx.recv() => event,
            };
            let event = match received {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Report fell behind, skipped {} events", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            if let Event::Schedule(ScheduleEvent::AwaitingStart { rom }) = &event {
                self.start_run(&handle, rom).await;
            }
            if let Some(line) = describe(&event) {
                println!("{line}");
            }
        }

        tracing::info!("Shutting down runtime");
        self.runtime.shutdown().await?;
        Ok(())
    }

    async fn start_run(&self, handle: &RuntimeHandle, rom: &RomIdentity) {
        match handle.start_run(&self.config_name, self.seeded).await {
            Ok(record) => tracing::info!(
                "Started run on {} with seed {} ({})",
                rom,
                record.seed,
                record.schedule_ref
            ),
            Err(e) => tracing::warn!("Could not start a run on {}: {}", rom, e),
        }
    }
}

//! Device delivery protocol.
//!
//! A drain moves the session queue into device memory one entry at a time:
//!
//! ```text
//! Idle -> WaitInGame -> { WaitAck -> Write }* -> Cooldown -> Idle
//! ```
//!
//! Each write lands at `last acknowledged index + 1` and only once the
//! device reports the previous item as consumed. The caller must hold the
//! session's [`DrainPermit`]; it is released when the drain returns, whether
//! it succeeded or failed.

mod error;

pub use error::{DeliveryError, Result};

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use rip_core::{AckRecord, EventIndex, ItemCatalog, QueueEntry, WriteFlag, WriteRecord};

use crate::device::Device;
use crate::events::{DeliveryEvent, Event, EventBus};
use crate::session::{DrainPermit, RunSession};

/// Timers used by the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryTimings {
    /// Delay between polls while waiting for game mode or an idle ack.
    pub poll_interval: Duration,
    /// Pause after dropping an entry whose index does not follow the ack.
    pub mismatch_backoff: Duration,
    /// Hold after the queue empties before the permit is released.
    pub cooldown: Duration,
}

impl Default for DeliveryTimings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            mismatch_backoff: Duration::from_millis(50),
            cooldown: Duration::from_millis(1000),
        }
    }
}

/// Protocol phase, published with [`DeliveryEvent::Phase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum DeliveryPhase {
    Idle,
    WaitInGame,
    WaitAck,
    Write,
    Cooldown,
}

/// What a finished drain did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainReport {
    pub delivered: Vec<QueueEntry>,
    /// Entries popped whose index did not follow the device's ack.
    pub dropped: Vec<QueueEntry>,
}

/// Drives deliveries against a connected device.
#[derive(Clone)]
pub struct DeliveryProtocol {
    timings: DeliveryTimings,
    catalog: Arc<ItemCatalog>,
    events: EventBus,
}

impl DeliveryProtocol {
    pub fn new(timings: DeliveryTimings, catalog: Arc<ItemCatalog>, events: EventBus) -> Self {
        Self {
            timings,
            catalog,
            events,
        }
    }

    pub fn timings(&self) -> &DeliveryTimings {
        &self.timings
    }

    /// Takes the session's permit and drains its queue.
    ///
    /// Fails fast with [`DeliveryError::Busy`] while another drain runs and
    /// with [`DeliveryError::NothingToSend`] on an empty queue; neither
    /// touches the device.
    pub async fn run_drain(&self, device: &Device, session: &RunSession) -> Result<DrainReport> {
        let permit = self.begin(session)?;
        self.drain(device, session, permit).await
    }

    /// Takes the permit for a drain that will run later.
    pub fn begin(&self, session: &RunSession) -> Result<DrainPermit> {
        let permit = session.try_begin_drain()?;
        if session.queue_len() == 0 {
            return Err(DeliveryError::NothingToSend);
        }
        Ok(permit)
    }

    /// Drains the queue. `permit` is released on return.
    pub async fn drain(
        &self,
        device: &Device,
        session: &RunSession,
        permit: DrainPermit,
    ) -> Result<DrainReport> {
        let result = self.drain_inner(device, session).await;
        match &result {
            Ok(report) => {
                self.events.publish(Event::Delivery(DeliveryEvent::DrainFinished {
                    delivered: report.delivered.len(),
                    dropped: report.dropped.len(),
                }));
            }
            Err(err) => {
                warn!("Drain aborted: {}", err);
                self.events.publish(Event::Delivery(DeliveryEvent::DrainFailed {
                    reason: err.to_string(),
                }));
            }
        }
        self.phase(DeliveryPhase::Idle);
        drop(permit);
        result
    }

    async fn drain_inner(&self, device: &Device, session: &RunSession) -> Result<DrainReport> {
        info!("Draining {} queued item(s)", session.queue_len());
        self.events.publish(Event::Delivery(DeliveryEvent::DrainStarted {
            queued: session.queue_len(),
        }));

        self.wait_in_game(device).await?;

        let mut report = DrainReport::default();
        while let Some(entry) = session.pop_front() {
            let ack = self.wait_ack(device).await?;
            let expected = ack.index.next();

            if entry.index != expected {
                debug!(
                    "Dropping {} {}: device expects {}",
                    entry.item, entry.index, expected
                );
                self.events.publish(Event::Delivery(DeliveryEvent::Dropped {
                    entry: entry.clone(),
                    expected,
                }));
                report.dropped.push(entry);
                sleep(self.timings.mismatch_backoff).await;
                continue;
            }

            let Some(item) = self.catalog.id_of(&entry.item) else {
                warn!("Dropping {} {}: not in the item catalog", entry.item, entry.index);
                report.dropped.push(entry);
                continue;
            };

            self.phase(DeliveryPhase::Write);
            device
                .write_record(WriteRecord {
                    index: expected,
                    item,
                    flag: WriteFlag::QueueDrain,
                })
                .await?;
            info!("Delivered {} {}", entry.item, entry.index);
            self.events.publish(Event::Delivery(DeliveryEvent::Delivered {
                entry: entry.clone(),
                flag: WriteFlag::QueueDrain,
            }));
            session.record_delivered(entry.clone());
            report.delivered.push(entry);
        }

        self.phase(DeliveryPhase::Cooldown);
        sleep(self.timings.cooldown).await;
        Ok(report)
    }

    /// Delivers one item outside the queue, at `last acknowledged + 1`.
    ///
    /// Does not take the drain permit and does not touch the session.
    pub async fn send_single(&self, device: &Device, item: &str) -> Result<WriteRecord> {
        let id = self
            .catalog
            .id_of(item)
            .ok_or_else(|| DeliveryError::UnknownItem(item.to_string()))?;

        self.wait_in_game(device).await?;
        let ack = self.wait_ack(device).await?;

        let record = WriteRecord {
            index: ack.index.next(),
            item: id,
            flag: WriteFlag::SingleSend,
        };
        device.write_record(record).await?;
        info!("Sent {} {} outside the schedule", item, record.index);
        self.events.publish(Event::Delivery(DeliveryEvent::Delivered {
            entry: QueueEntry::new(item, record.index),
            flag: WriteFlag::SingleSend,
        }));
        Ok(record)
    }

    /// Polls the game mode until the device accepts deliveries.
    async fn wait_in_game(&self, device: &Device) -> Result<()> {
        self.phase(DeliveryPhase::WaitInGame);
        loop {
            let mode = device.read_game_mode().await?;
            if rip_core::is_delivery_mode(mode) {
                return Ok(());
            }
            debug!("Game mode {:#04x} not ready for delivery", mode);
            sleep(self.timings.poll_interval).await;
        }
    }

    /// Polls the ack record until the last item has been consumed.
    ///
    /// An idle record at index zero is the ROM mid state change, never a real
    /// position, so it is polled again until a non-zero index returns.
    async fn wait_ack(&self, device: &Device) -> Result<AckRecord> {
        self.phase(DeliveryPhase::WaitAck);
        loop {
            let ack = device.read_ack().await?;
            if ack.is_idle() && ack.index != EventIndex::ZERO {
                return Ok(ack);
            }
            if ack.is_idle() {
                debug!("Ack record reads zero, waiting for the ROM to settle");
            }
            sleep(self.timings.poll_interval).await;
        }
    }

    fn phase(&self, phase: DeliveryPhase) {
        self.events
            .publish(Event::Delivery(DeliveryEvent::Phase(phase)));
    }
}

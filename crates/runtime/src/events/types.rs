//! Event types for different topics.

use serde::{Deserialize, Serialize};

use rip_core::{
    DeviceSnapshot, EventIndex, ItemHistory, QueueEntry, RomIdentity, RunSeed, WriteFlag,
};

use crate::delivery::DeliveryPhase;
use crate::device::DeviceInfo;

/// Device discovery and snapshot events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeviceEvent {
    /// Devices listed by the discovery poll.
    Discovered { devices: Vec<DeviceInfo> },
    Selected { uri: String },
    /// The selected device stopped being listed.
    Lost { uri: String },
    Snapshot(DeviceSnapshot),
    /// A snapshot read failed.
    ReadFailed { reason: String },
    /// The loaded ROM does not support deliveries.
    Incompatible { rom: RomIdentity },
}

/// Run lifecycle and scheduling events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScheduleEvent {
    RunStarted {
        rom: RomIdentity,
        seed: RunSeed,
        config: String,
    },
    /// A stored run was loaded for the current ROM.
    RunRehydrated {
        rom: RomIdentity,
        seed: RunSeed,
        config: String,
    },
    RunReset { rom: RomIdentity },
    /// A compatible ROM has no run yet.
    AwaitingStart { rom: RomIdentity },
    /// A scheduling pass replaced the history.
    Updated {
        history: ItemHistory,
        enqueued: Vec<QueueEntry>,
        queued: usize,
    },
}

/// Delivery protocol events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DeliveryEvent {
    Phase(DeliveryPhase),
    DrainStarted { queued: usize },
    Delivered { entry: QueueEntry, flag: WriteFlag },
    /// A popped entry did not follow the device's ack and was discarded.
    Dropped {
        entry: QueueEntry,
        expected: EventIndex,
    },
    DrainFinished { delivered: usize, dropped: usize },
    DrainFailed { reason: String },
}

//! Deterministic item scheduling and the device data model.
//!
//! `rip-core` holds everything that can be computed without touching a
//! device or a disk: the item catalog and category table, schedule
//! resolution, the Alea generator, the selection policy, the scheduler, and
//! the codecs for the device's fixed memory fields. The runtime crate builds
//! the delivery protocol and the polling workers on top of these types.
pub mod catalog;
pub mod category;
pub mod device;
pub mod error;
pub mod item_ref;
pub mod queue;
pub mod rng;
pub mod run;
pub mod schedule;
pub mod scheduler;
pub mod selection;
pub mod time;

pub use catalog::{ItemCatalog, ItemId, ItemInfo, SpritePos};
pub use category::CategoryTable;
pub use device::{
    ACK_POLL_SIZE, AckRecord, AddressSpace, DELIVERY_MODES, DeviceSnapshot, MemoryField,
    RomIdentity, SNAPSHOT_FIELDS, SnapshotError, WriteFlag, WriteRecord, is_clock_mode,
    is_delivery_mode,
};
pub use error::{Result, ScheduleError};
pub use item_ref::{ItemRef, WILDCARD};
pub use queue::{EventIndex, ItemHistory, QueueEntry};
pub use rng::Alea;
pub use run::{RunRecord, RunSeed};
pub use schedule::{END_SENTINEL, Interval, IntervalSpec, MIN_FREQUENCY, Rule, RuleSpec, Schedule};
pub use scheduler::{SchedulePass, ScheduleRequest, compute};
pub use selection::Streams;

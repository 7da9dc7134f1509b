//! Runtime orchestration for scheduled item delivery.
//!
//! This crate wires together the device client abstraction, the delivery
//! protocol, run sessions, repositories, and worker tasks into a cohesive
//! runtime API. Consumers embed [`Runtime`] to discover a device, start or
//! resume a run, and subscribe to events through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`device`] defines the device client seam and a simulated device
//! - [`delivery`] implements the drain and single-send protocol
//! - [`session`] holds per-ROM queue, history, and the drain token
//! - [`events`] provides topic-based event bus for flexible event routing
//! - [`repository`] persists run records and configurations
//! - `workers` keeps background tasks internal to the crate
pub mod api;
pub mod delivery;
pub mod device;
pub mod events;
pub mod repository;
pub mod runtime;
pub mod session;

mod workers;

pub use api::{Result, RuntimeError, RuntimeHandle};
pub use delivery::{DeliveryError, DeliveryPhase, DeliveryProtocol, DeliveryTimings, DrainReport};
pub use device::{
    Device, DeviceClient, DeviceError, DeviceInfo, DeviceSlot, ReadRequest, SimulatedDevice,
};
pub use events::{DeliveryEvent, DeviceEvent, Event, EventBus, ScheduleEvent, Topic};
pub use repository::{
    ConfigRepository, FileConfigRepository, FileRunRepository, InMemoryConfigRepository,
    InMemoryRunRepository, RepositoryError, RunRepository,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use session::{DrainPermit, PassOutcome, RunSession, SessionView};

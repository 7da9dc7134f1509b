//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, repositories, the device, and
//! the delivery protocol so clients can bubble them up with consistent
//! context.
use thiserror::Error;
use tokio::sync::oneshot;

use rip_core::RomIdentity;

pub use crate::delivery::DeliveryError;
pub use crate::device::DeviceError;
pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("session worker command channel closed")]
    CommandChannelClosed,

    #[error("session worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error("runtime requires a device client before building")]
    MissingDeviceClient,

    #[error("failed to load content: {0}")]
    Content(String),

    #[error("no ROM detected yet")]
    NoRom,

    #[error("ROM `{rom}` does not support deliveries")]
    IncompatibleRom { rom: RomIdentity },

    #[error("a run already exists for `{rom}`")]
    RunAlreadyStarted { rom: RomIdentity },

    #[error("no active run")]
    NoActiveRun,

    #[error("configuration `{name}` not found")]
    ConfigNotFound { name: String },

    #[error("configuration `{name}` is invalid: {reason}")]
    InvalidSchedule { name: String, reason: String },
}

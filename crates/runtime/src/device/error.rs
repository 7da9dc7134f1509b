//! Error types raised by device access.

use thiserror::Error;

use rip_core::SnapshotError;

#[derive(Debug, Clone, Error)]
pub enum DeviceError {
    #[error("device did not respond to {operation}")]
    NoResponse { operation: &'static str },

    #[error("no device selected")]
    NoDeviceSelected,

    #[error("device transport failed: {0}")]
    Transport(String),

    #[error("malformed device reply: {0}")]
    Decode(#[from] SnapshotError),
}

pub type Result<T> = std::result::Result<T, DeviceError>;

//! Error types raised by the delivery protocol.

use thiserror::Error;

use crate::device::DeviceError;

#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    #[error("a drain is already running")]
    Busy,

    #[error("nothing to send")]
    NothingToSend,

    #[error("`{0}` is not in the item catalog")]
    UnknownItem(String),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

pub type Result<T> = std::result::Result<T, DeliveryError>;

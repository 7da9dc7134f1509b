//! Device access.
//!
//! [`DeviceClient`] is the seam to the RPC service that fronts the hardware:
//! it lists attached devices and performs raw reads and writes against a
//! device addressed by URI. [`Device`] binds a client to one selected device
//! and speaks in terms of the fixed memory fields. [`DeviceSlot`] holds the
//! current selection shared by the workers and the handle.
mod error;
mod simulated;

pub use error::{DeviceError, Result};
pub use simulated::SimulatedDevice;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use rip_core::{
    ACK_POLL_SIZE, AckRecord, AddressSpace, DeviceSnapshot, MemoryField, SNAPSHOT_FIELDS,
    WriteRecord,
};

/// A device reported by [`DeviceClient::list_devices`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub uri: String,
    pub display_name: String,
    pub kind: String,
}

/// One entry of a multi-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    pub address: u32,
    pub space: AddressSpace,
    pub size: usize,
}

/// RPC client for the device service.
///
/// Every call is a single request/response. An implementation reports a
/// missing reply as [`DeviceError::NoResponse`]; callers never retry.
#[async_trait]
pub trait DeviceClient: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<DeviceInfo>>;

    async fn read_one(
        &self,
        uri: &str,
        address: u32,
        space: AddressSpace,
        size: usize,
    ) -> Result<Vec<u8>>;

    /// Reads several regions in one request; replies are in request order.
    async fn read_many(&self, uri: &str, requests: &[ReadRequest]) -> Result<Vec<Vec<u8>>>;

    async fn write_one(&self, uri: &str, address: u32, space: AddressSpace, data: &[u8])
    -> Result<()>;
}

/// A client bound to one selected device.
#[derive(Clone)]
pub struct Device {
    client: Arc<dyn DeviceClient>,
    uri: String,
    space: AddressSpace,
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("uri", &self.uri)
            .field("space", &self.space)
            .finish()
    }
}

impl Device {
    pub fn new(client: Arc<dyn DeviceClient>, uri: impl Into<String>, space: AddressSpace) -> Self {
        Self {
            client,
            uri: uri.into(),
            space,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub async fn read_game_mode(&self) -> Result<u8> {
        let bytes = self.read(MemoryField::GameMode, 1).await?;
        Ok(bytes[0])
    }

    /// Polls the `{hi, lo, item}` prefix of the ack record.
    pub async fn read_ack(&self) -> Result<AckRecord> {
        let bytes = self.read(MemoryField::MultiInfo, ACK_POLL_SIZE).await?;
        Ok(AckRecord::decode(&bytes)?)
    }

    /// Writes a delivery record into the ack field.
    pub async fn write_record(&self, record: WriteRecord) -> Result<()> {
        self.client
            .write_one(
                &self.uri,
                MemoryField::MultiInfo.address(),
                self.space,
                &record.encode(),
            )
            .await
    }

    /// Reads and decodes every snapshot field in one request.
    pub async fn snapshot(&self) -> Result<DeviceSnapshot> {
        let requests: Vec<ReadRequest> = SNAPSHOT_FIELDS
            .iter()
            .map(|field| ReadRequest {
                address: field.address(),
                space: self.space,
                size: field.size(),
            })
            .collect();

        let replies = self.client.read_many(&self.uri, &requests).await?;
        if replies.len() != SNAPSHOT_FIELDS.len() {
            return Err(DeviceError::NoResponse {
                operation: "read_many",
            });
        }

        let snapshot = DeviceSnapshot::decode(
            SNAPSHOT_FIELDS
                .iter()
                .copied()
                .zip(replies.iter().map(Vec::as_slice)),
        )?;
        Ok(snapshot)
    }

    async fn read(&self, field: MemoryField, size: usize) -> Result<Vec<u8>> {
        let bytes = self
            .client
            .read_one(&self.uri, field.address(), self.space, size)
            .await?;
        if bytes.len() < size {
            return Err(DeviceError::NoResponse {
                operation: "read_one",
            });
        }
        Ok(bytes)
    }
}

/// Currently selected device, shared across tasks.
#[derive(Clone, Default)]
pub struct DeviceSlot {
    current: Arc<RwLock<Option<Device>>>,
}

impl DeviceSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<Device> {
        self.current.read().await.clone()
    }

    /// The selected device, or [`DeviceError::NoDeviceSelected`].
    pub async fn require(&self) -> Result<Device> {
        self.get().await.ok_or(DeviceError::NoDeviceSelected)
    }

    pub async fn set(&self, device: Device) {
        *self.current.write().await = Some(device);
    }

    pub async fn clear(&self) -> Option<Device> {
        self.current.write().await.take()
    }
}

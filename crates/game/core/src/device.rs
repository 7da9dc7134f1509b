//! Device memory layout and the records exchanged with it.
//!
//! The device exposes a handful of fixed addresses. A periodic multi-read of
//! all of them yields a [`DeviceSnapshot`]; deliveries are single 4-byte
//! writes of a [`WriteRecord`] into the ack record field.

use std::fmt;

use thiserror::Error;

use crate::catalog::ItemId;
use crate::queue::EventIndex;

/// Address space requests are issued in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum AddressSpace {
    #[default]
    FxPakPro,
    SnesABus,
    Raw,
}

/// Fixed memory fields read from or written to the device.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum MemoryField {
    GameMode,
    RomName,
    TotalTime,
    GoalComplete,
    MultiInfo,
}

impl MemoryField {
    pub const fn address(self) -> u32 {
        match self {
            Self::GameMode => 0xF5_0010,
            Self::RomName => 0xE0_2000,
            Self::TotalTime => 0xF5_F43E,
            Self::GoalComplete => 0xF5_F443,
            Self::MultiInfo => 0xF5_F4D0,
        }
    }

    pub const fn size(self) -> usize {
        match self {
            Self::GameMode => 1,
            Self::RomName => 0x15,
            Self::TotalTime => 3,
            Self::GoalComplete => 1,
            Self::MultiInfo => 4,
        }
    }

    pub fn from_address(address: u32) -> Option<Self> {
        SNAPSHOT_FIELDS
            .iter()
            .copied()
            .find(|field| field.address() == address)
    }
}

/// Fields read on every snapshot refresh, in request order.
pub const SNAPSHOT_FIELDS: [MemoryField; 5] = [
    MemoryField::GameMode,
    MemoryField::RomName,
    MemoryField::TotalTime,
    MemoryField::GoalComplete,
    MemoryField::MultiInfo,
];

/// Bytes of the ack record polled before each delivery: `{hi, lo, item}`.
pub const ACK_POLL_SIZE: usize = 3;

/// Game mode codes in which the device accepts deliveries.
pub const DELIVERY_MODES: [u8; 3] = [0x07, 0x09, 0x0B];

/// Whether the device is ready to receive items in `mode`.
pub fn is_delivery_mode(mode: u8) -> bool {
    DELIVERY_MODES.contains(&mode)
}

/// Whether the in-game clock counts toward the schedule in `mode`.
pub fn is_clock_mode(mode: u8) -> bool {
    (0x05..=0x1B).contains(&mode) && mode != 0x14
}

/// ROM title with NUL padding removed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RomIdentity(String);

impl RomIdentity {
    /// Prefix carried by ROMs built with delivery support.
    pub const COMPATIBLE_PREFIX: &'static str = "OR";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Decodes a raw ROM name field, one character per byte.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(
            bytes
                .iter()
                .filter(|&&byte| byte != 0)
                .map(|&byte| char::from(byte))
                .collect(),
        )
    }

    pub fn is_compatible(&self) -> bool {
        self.0.starts_with(Self::COMPATIBLE_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RomIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Device-side record of the last delivered event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AckRecord {
    pub index: EventIndex,
    /// Non-zero while the device is still consuming the last item.
    pub item_id: u8,
    pub flag: u8,
}

impl AckRecord {
    /// Decodes a 3- or 4-byte read of the ack field.
    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        if bytes.len() < ACK_POLL_SIZE {
            return Err(SnapshotError::ShortRead {
                field: MemoryField::MultiInfo,
                expected: ACK_POLL_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            index: EventIndex::from_bytes(bytes[0], bytes[1]),
            item_id: bytes[2],
            flag: bytes.get(3).copied().unwrap_or(0),
        })
    }

    /// The previous item has been fully consumed.
    pub fn is_idle(&self) -> bool {
        self.item_id == 0
    }
}

/// Flag byte written with each delivery.
///
/// The two values are what each delivery path has always written; the
/// device-side meaning is not interpreted here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum WriteFlag {
    /// Written by queue drains.
    QueueDrain,
    /// Written by single-item sends.
    SingleSend,
}

impl WriteFlag {
    pub const fn byte(self) -> u8 {
        match self {
            Self::QueueDrain => 0,
            Self::SingleSend => 1,
        }
    }
}

/// The 4-byte record written into the ack field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteRecord {
    pub index: EventIndex,
    pub item: ItemId,
    pub flag: WriteFlag,
}

impl WriteRecord {
    pub fn encode(&self) -> [u8; 4] {
        let [hi, lo] = self.index.to_bytes();
        [hi, lo, self.item.byte(), self.flag.byte()]
    }
}

/// Errors decoding raw device reads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("snapshot is missing the {0} field")]
    MissingField(MemoryField),

    #[error("{field} read returned {actual} bytes, expected {expected}")]
    ShortRead {
        field: MemoryField,
        expected: usize,
        actual: usize,
    },
}

/// Decoded view of all snapshot fields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceSnapshot {
    pub game_mode: u8,
    pub rom: RomIdentity,
    /// Frames of play, from a 3-byte little-endian counter.
    pub elapsed_frames: u32,
    pub goal_complete: bool,
    pub ack: AckRecord,
}

impl DeviceSnapshot {
    /// Decodes `(field, bytes)` pairs returned by a multi-read.
    pub fn decode<'a, I>(reads: I) -> Result<Self, SnapshotError>
    where
        I: IntoIterator<Item = (MemoryField, &'a [u8])>,
    {
        let mut game_mode = None;
        let mut rom = None;
        let mut frames = None;
        let mut goal = None;
        let mut ack = None;

        for (field, bytes) in reads {
            let bytes = expect_len(field, bytes)?;
            match field {
                MemoryField::GameMode => game_mode = Some(bytes[0]),
                MemoryField::RomName => rom = Some(RomIdentity::from_bytes(bytes)),
                MemoryField::TotalTime => {
                    frames = Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]))
                }
                MemoryField::GoalComplete => goal = Some(bytes[0] != 0),
                MemoryField::MultiInfo => ack = Some(AckRecord::decode(bytes)?),
            }
        }

        Ok(Self {
            game_mode: game_mode.ok_or(SnapshotError::MissingField(MemoryField::GameMode))?,
            rom: rom.ok_or(SnapshotError::MissingField(MemoryField::RomName))?,
            elapsed_frames: frames.ok_or(SnapshotError::MissingField(MemoryField::TotalTime))?,
            goal_complete: goal.unwrap_or(false),
            ack: ack.ok_or(SnapshotError::MissingField(MemoryField::MultiInfo))?,
        })
    }

    pub fn in_delivery_mode(&self) -> bool {
        is_delivery_mode(self.game_mode)
    }

    /// Elapsed minutes for scheduling; zero while the clock is not running.
    pub fn elapsed_minutes(&self) -> f64 {
        if is_clock_mode(self.game_mode) {
            crate::time::frames_to_minutes(self.elapsed_frames)
        } else {
            0.0
        }
    }
}

fn expect_len(field: MemoryField, bytes: &[u8]) -> Result<&[u8], SnapshotError> {
    if bytes.len() < field.size() {
        return Err(SnapshotError::ShortRead {
            field,
            expected: field.size(),
            actual: bytes.len(),
        });
    }
    Ok(&bytes[..field.size()])
}

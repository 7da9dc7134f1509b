//! Per-ROM run metadata.

use std::fmt;

/// Seed of a run's primary stream.
///
/// Random runs draw a number once at start; seeded runs reuse the ROM
/// identity so two players on the same ROM receive the same items.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum RunSeed {
    Random(u32),
    Rom(String),
}

impl RunSeed {
    /// Whether this run is seeded from the ROM identity.
    pub fn is_rom_seeded(&self) -> bool {
        matches!(self, Self::Rom(_))
    }
}

impl fmt::Display for RunSeed {
    /// The string fed to the primary Alea stream.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random(value) => write!(f, "{value}"),
            Self::Rom(name) => f.write_str(name),
        }
    }
}

/// What is persisted for a started run, keyed by ROM identity.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunRecord {
    pub seed: RunSeed,
    /// Name of the schedule configuration the run was started with.
    #[cfg_attr(feature = "serde", serde(rename = "config"))]
    pub schedule_ref: String,
}

impl RunRecord {
    pub fn new(seed: RunSeed, schedule_ref: impl Into<String>) -> Self {
        Self {
            seed,
            schedule_ref: schedule_ref.into(),
        }
    }
}

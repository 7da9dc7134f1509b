//! Repository contracts for run records and schedule configurations.

use rip_core::{RomIdentity, RunRecord};

use crate::repository::Result;

/// Run records keyed by ROM identity.
///
/// A record is written once when a run starts and removed only by an
/// explicit reset; the seed never changes in between.
pub trait RunRepository: Send + Sync {
    fn load(&self, rom: &RomIdentity) -> Result<Option<RunRecord>>;

    fn save(&self, rom: &RomIdentity, record: &RunRecord) -> Result<()>;

    fn delete(&self, rom: &RomIdentity) -> Result<()>;

    /// Identities with a stored run, sorted.
    fn list(&self) -> Result<Vec<RomIdentity>>;

    fn exists(&self, rom: &RomIdentity) -> Result<bool> {
        Ok(self.load(rom)?.is_some())
    }
}

/// Named schedule documents, stored as raw text.
pub trait ConfigRepository: Send + Sync {
    fn load(&self, name: &str) -> Result<Option<String>>;

    fn save(&self, name: &str, text: &str) -> Result<()>;

    fn delete(&self, name: &str) -> Result<()>;

    /// Stored names, sorted.
    fn list(&self) -> Result<Vec<String>>;
}

//! In-memory repositories for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;

use rip_core::{RomIdentity, RunRecord};

use crate::repository::{ConfigRepository, RepositoryError, Result, RunRepository};

/// In-memory implementation of RunRepository.
#[derive(Default)]
pub struct InMemoryRunRepository {
    runs: RwLock<HashMap<RomIdentity, RunRecord>>,
}

impl InMemoryRunRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunRepository for InMemoryRunRepository {
    fn load(&self, rom: &RomIdentity) -> Result<Option<RunRecord>> {
        let runs = self.runs.read().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(runs.get(rom).cloned())
    }

    fn save(&self, rom: &RomIdentity, record: &RunRecord) -> Result<()> {
        let mut runs = self
            .runs
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        runs.insert(rom.clone(), record.clone());
        Ok(())
    }

    fn delete(&self, rom: &RomIdentity) -> Result<()> {
        let mut runs = self
            .runs
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        runs.remove(rom);
        Ok(())
    }

    fn list(&self) -> Result<Vec<RomIdentity>> {
        let runs = self.runs.read().map_err(|_| RepositoryError::LockPoisoned)?;
        let mut roms: Vec<RomIdentity> = runs.keys().cloned().collect();
        roms.sort();
        Ok(roms)
    }
}

/// In-memory implementation of ConfigRepository.
#[derive(Default)]
pub struct InMemoryConfigRepository {
    configs: RwLock<HashMap<String, String>>,
}

impl InMemoryConfigRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository holding `configs`.
    pub fn with_configs<I, K, V>(configs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            configs: RwLock::new(
                configs
                    .into_iter()
                    .map(|(name, text)| (name.into(), text.into()))
                    .collect(),
            ),
        }
    }
}

impl ConfigRepository for InMemoryConfigRepository {
    fn load(&self, name: &str) -> Result<Option<String>> {
        let configs = self
            .configs
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(configs.get(name).cloned())
    }

    fn save(&self, name: &str, text: &str) -> Result<()> {
        let mut configs = self
            .configs
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        configs.insert(name.to_string(), text.to_string());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        let mut configs = self
            .configs
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        configs.remove(name);
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        let configs = self
            .configs
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        let mut names: Vec<String> = configs.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

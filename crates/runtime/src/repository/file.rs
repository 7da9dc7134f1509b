//! File-backed repositories.
//!
//! Each key maps to one file named by the hex encoding of the key, so ROM
//! titles and configuration names with arbitrary characters are safe on any
//! filesystem. Writes go to a temp file first and are renamed into place.

use std::fs;
use std::path::{Path, PathBuf};

use rip_core::{RomIdentity, RunRecord};

use crate::repository::{ConfigRepository, RepositoryError, Result, RunRepository};

fn key_path(dir: &Path, key: &str, extension: &str) -> PathBuf {
    dir.join(format!("{}.{}", hex::encode(key.as_bytes()), extension))
}

fn key_from_path(path: &Path, extension: &str) -> Result<Option<String>> {
    if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
        return Ok(None);
    }
    let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
        return Ok(None);
    };
    let bytes = hex::decode(stem)
        .map_err(|e| RepositoryError::CorruptedData(format!("{}: {}", path.display(), e)))?;
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| RepositoryError::CorruptedData(format!("{}: {}", path.display(), e)))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, bytes)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(RepositoryError::Io(e)),
    }
}

fn remove_optional(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(RepositoryError::Io(e)),
    }
}

fn list_keys(dir: &Path, extension: &str) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(key) = key_from_path(&path, extension)? {
            keys.push(key);
        }
    }
    keys.sort();
    Ok(keys)
}

/// File-based implementation of RunRepository.
///
/// Records are stored as `{hex(rom)}.json`.
pub struct FileRunRepository {
    base_dir: PathBuf,
}

impl FileRunRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn run_path(&self, rom: &RomIdentity) -> PathBuf {
        key_path(&self.base_dir, rom.as_str(), "json")
    }
}

impl RunRepository for FileRunRepository {
    fn load(&self, rom: &RomIdentity) -> Result<Option<RunRecord>> {
        let path = self.run_path(rom);
        let Some(bytes) = read_optional(&path)? else {
            return Ok(None);
        };
        let record = serde_json::from_slice(&bytes)?;
        tracing::debug!("Loaded run[{}] from {}", rom, path.display());
        Ok(Some(record))
    }

    fn save(&self, rom: &RomIdentity, record: &RunRecord) -> Result<()> {
        let path = self.run_path(rom);
        let bytes = serde_json::to_vec_pretty(record)?;
        write_atomic(&path, &bytes)?;
        tracing::debug!("Saved run[{}] to {}", rom, path.display());
        Ok(())
    }

    fn delete(&self, rom: &RomIdentity) -> Result<()> {
        if remove_optional(&self.run_path(rom))? {
            tracing::debug!("Deleted run[{}]", rom);
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<RomIdentity>> {
        Ok(list_keys(&self.base_dir, "json")?
            .into_iter()
            .map(RomIdentity::new)
            .collect())
    }
}

/// File-based implementation of ConfigRepository.
///
/// Documents are stored verbatim as `{hex(name)}.json`.
pub struct FileConfigRepository {
    base_dir: PathBuf,
}

impl FileConfigRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn config_path(&self, name: &str) -> PathBuf {
        key_path(&self.base_dir, name, "json")
    }
}

impl ConfigRepository for FileConfigRepository {
    fn load(&self, name: &str) -> Result<Option<String>> {
        let Some(bytes) = read_optional(&self.config_path(name))? else {
            return Ok(None);
        };
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| RepositoryError::CorruptedData(format!("config `{}`: {}", name, e)))
    }

    fn save(&self, name: &str, text: &str) -> Result<()> {
        let path = self.config_path(name);
        write_atomic(&path, text.as_bytes())?;
        tracing::debug!("Saved config[{}] to {}", name, path.display());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        if remove_optional(&self.config_path(name))? {
            tracing::debug!("Deleted config[{}]", name);
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        list_keys(&self.base_dir, "json")
    }
}

#[cfg(test)]
mod tests {
    use rip_core::RunSeed;

    use super::*;

    #[test]
    fn run_records_persist_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let rom = RomIdentity::new("OR 1/2: seed?");
        let record = RunRecord::new(RunSeed::Rom(rom.to_string()), "league");

        FileRunRepository::new(dir.path())
            .unwrap()
            .save(&rom, &record)
            .unwrap();

        let reopened = FileRunRepository::new(dir.path()).unwrap();
        assert_eq!(reopened.load(&rom).unwrap(), Some(record));
        assert_eq!(reopened.list().unwrap(), [rom.clone()]);

        reopened.delete(&rom).unwrap();
        assert_eq!(reopened.load(&rom).unwrap(), None);
        // Deleting twice is fine.
        reopened.delete(&rom).unwrap();
    }

    #[test]
    fn run_record_json_layout() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileRunRepository::new(dir.path()).unwrap();
        let rom = RomIdentity::new("ORx");
        repo.save(&rom, &RunRecord::new(RunSeed::Random(42), "default"))
            .unwrap();

        let raw = fs::read_to_string(repo.run_path(&rom)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["seed"], 42);
        assert_eq!(value["config"], "default");
    }

    #[test]
    fn configs_are_stored_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileConfigRepository::new(dir.path()).unwrap();
        let text = r#"{"settings": {"intervals": []}}"#;

        repo.save("my config", text).unwrap();
        repo.save("another", "{}").unwrap();
        assert_eq!(repo.load("my config").unwrap().as_deref(), Some(text));
        assert_eq!(repo.list().unwrap(), ["another", "my config"]);
        assert!(!dir.path().join("my config.json").exists());
    }

    #[test]
    fn stray_files_are_ignored_but_bad_names_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileConfigRepository::new(dir.path()).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        assert!(repo.list().unwrap().is_empty());

        fs::write(dir.path().join("zz.json"), "{}").unwrap();
        assert!(matches!(repo.list(), Err(RepositoryError::CorruptedData(_))));
    }
}

//! Client configuration structures and loaders.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, anyhow};
use directories::ProjectDirs;
use rip_core::time::GAME_FPS;
use runtime::RuntimeConfig;

/// Configuration name used when none is given.
pub const DEFAULT_CONFIG_NAME: &str = "default";

/// Configuration required to bootstrap a client runtime.
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub runtime: RuntimeConfig,
    /// Base directory for runs, configurations, and content overrides.
    pub data_dir: Option<PathBuf>,
    /// Stored configuration new runs are started with.
    pub config_name: String,
    /// Seed new runs from the ROM identity instead of a random number.
    pub seeded_run: bool,
    /// Frame rate of the simulated device's clock; `None` freezes it.
    pub simulate_fps: Option<f64>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeConfig::default(),
            data_dir: None,
            config_name: DEFAULT_CONFIG_NAME.to_string(),
            seeded_run: false,
            simulate_fps: Some(GAME_FPS),
        }
    }
}

impl CliConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `RIP_DATA_DIR` - Directory for runs and configurations (default: platform-specific)
    /// - `RIP_SNAPSHOT_INTERVAL_MS` - Snapshot and scheduling period (default: 750)
    /// - `RIP_DISCOVERY_INTERVAL_MS` - Device listing period (default: 1000)
    /// - `RIP_POLL_INTERVAL_MS` - Delivery poll period (default: 250)
    /// - `RIP_COOLDOWN_MS` - Pause after each drain (default: 1000)
    /// - `RIP_CONFIG_NAME` - Configuration new runs use (default: "default")
    /// - `RIP_SEEDED_RUN` - Seed runs from the ROM identity (default: false)
    /// - `RIP_SIMULATE_FPS` - Simulated frame rate, 0 freezes the clock (default: 60.0988)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`CliConfig::from_env`], reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let read_ms = |key: &str| read_env::<u64>(&lookup, key).map(Duration::from_millis);

        if let Some(dir) = lookup("RIP_DATA_DIR").filter(|dir| !dir.is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }

        // Worker periods never drop to zero; a zero interval panics in tokio.
        if let Some(interval) = read_ms("RIP_SNAPSHOT_INTERVAL_MS") {
            config.runtime.snapshot_interval = interval.max(Duration::from_millis(1));
        }
        if let Some(interval) = read_ms("RIP_DISCOVERY_INTERVAL_MS") {
            config.runtime.discovery_interval = interval.max(Duration::from_millis(1));
        }
        if let Some(interval) = read_ms("RIP_POLL_INTERVAL_MS") {
            config.runtime.delivery.poll_interval = interval;
        }
        if let Some(cooldown) = read_ms("RIP_COOLDOWN_MS") {
            config.runtime.delivery.cooldown = cooldown;
        }

        if let Some(name) = lookup("RIP_CONFIG_NAME").filter(|name| !name.is_empty()) {
            config.config_name = name;
        }

        if let Some(seeded) = read_env::<bool>(&lookup, "RIP_SEEDED_RUN") {
            config.seeded_run = seeded;
        } else if lookup("RIP_SEEDED_RUN").is_some() {
            // Accept the bare variable as "true"
            config.seeded_run = true;
        }

        if let Some(fps) = read_env::<f64>(&lookup, "RIP_SIMULATE_FPS") {
            config.simulate_fps = (fps > 0.0).then_some(fps);
        }

        config
    }

    /// Resolved data directory: `RIP_DATA_DIR` or the platform data dir.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        ProjectDirs::from("", "", "rip")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| anyhow!("no home directory to place data in; set RIP_DATA_DIR"))
    }
}

fn read_env<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    lookup(key)?.parse().ok()
}

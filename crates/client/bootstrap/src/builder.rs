//! Builds the runtime, stores, and content bundle used by front-ends.
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use rip_content::{Content, ContentFactory};
use runtime::{
    ConfigRepository, DeviceClient, FileConfigRepository, FileRunRepository, Runtime,
    SimulatedDevice,
};

use crate::config::CliConfig;

/// Schedule stored under the configured name when no such configuration
/// exists yet: an item every two minutes for the first half hour, then
/// weighted toward major items every three minutes.
pub const DEFAULT_SCHEDULE: &str = r#"{
  "settings": {
    "intervals": [
      { "start": 0, "end": 30, "frequency": 2, "items": ["all"] },
      {
        "start": 30,
        "frequency": 3,
        "weightedItems": { "majorItems": 3, "upgrades": 2, "junk": 1 }
      }
    ]
  }
}"#;

/// Builder that assembles the runtime, its stores, and content for clients.
pub struct RuntimeBuilder {
    config: CliConfig,
    client: Option<Arc<dyn DeviceClient>>,
}

impl RuntimeBuilder {
    pub fn new(config: CliConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    /// Provide a device client; defaults to a [`SimulatedDevice`] in play.
    pub fn device_client(mut self, client: Arc<dyn DeviceClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub async fn build(self) -> Result<RuntimeSetup> {
        let data_dir = self.config.data_dir()?;
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;
        tracing::info!("Data directory: {}", data_dir.display());

        let content = ContentFactory::new(&data_dir)
            .load()
            .context("failed to load item content")?;
        tracing::debug!(
            "Loaded {} items and {} categories",
            content.catalog.len(),
            content.categories.len()
        );

        let runs = FileRunRepository::new(data_dir.join("runs"))
            .context("failed to open run store")?;
        let configs = FileConfigRepository::new(data_dir.join("configs"))
            .context("failed to open configuration store")?;
        if configs.load(&self.config.config_name)?.is_none() {
            content
                .schedule(DEFAULT_SCHEDULE)
                .context("built-in schedule does not resolve")?;
            configs.save(&self.config.config_name, DEFAULT_SCHEDULE)?;
            tracing::info!(
                "Stored default schedule as `{}`",
                self.config.config_name
            );
        }

        let (client, simulator) = match self.client {
            Some(client) => (client, None),
            None => {
                let simulator = Arc::new(SimulatedDevice::default());
                simulator.set_rom("ORsimulated");
                simulator.set_game_mode(0x07);
                // A zero counter is never written to, so start as a ROM in play.
                simulator.set_ack(1, 0);
                simulator.set_fps(self.config.simulate_fps);
                let client: Arc<dyn DeviceClient> = simulator.clone();
                (client, Some(simulator))
            }
        };

        let runtime = Runtime::builder()
            .config(self.config.runtime.clone())
            .device_client(client)
            .content(content.clone())
            .run_repository(Arc::new(runs))
            .config_repository(Arc::new(configs))
            .build()
            .await?;

        Ok(RuntimeSetup {
            config: self.config,
            data_dir,
            content,
            simulator,
            runtime,
        })
    }
}

pub struct RuntimeSetup {
    pub config: CliConfig,
    pub data_dir: PathBuf,
    pub content: Content,
    /// The built-in simulated device, when no client was provided.
    pub simulator: Option<Arc<SimulatedDevice>>,
    pub runtime: Runtime,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &std::path::Path) -> CliConfig {
        CliConfig {
            data_dir: Some(dir.to_path_buf()),
            ..CliConfig::default()
        }
    }

    #[tokio::test]
    async fn default_schedule_is_stored_once() {
        let dir = tempfile::tempdir().unwrap();

        let setup = RuntimeBuilder::new(config_in(dir.path())).build().await.unwrap();
        let handle = setup.runtime.handle();
        assert_eq!(handle.list_configs().unwrap(), ["default"]);
        assert_eq!(
            handle.load_config("default").unwrap().as_deref(),
            Some(DEFAULT_SCHEDULE)
        );
        handle.save_config("default", r#"{"settings":{"intervals":[]}}"#).unwrap();
        assert!(setup.simulator.is_some());
        setup.runtime.shutdown().await.unwrap();

        // A second start keeps the user's edit.
        let setup = RuntimeBuilder::new(config_in(dir.path())).build().await.unwrap();
        let stored = setup.runtime.handle().load_config("default").unwrap();
        assert_eq!(stored.as_deref(), Some(r#"{"settings":{"intervals":[]}}"#));
        setup.runtime.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn custom_client_skips_the_simulator() {
        let dir = tempfile::tempdir().unwrap();
        let client: Arc<dyn DeviceClient> = Arc::new(SimulatedDevice::default());

        let setup = RuntimeBuilder::new(config_in(dir.path()))
            .device_client(client)
            .build()
            .await
            .unwrap();

        assert!(setup.simulator.is_none());
        assert!(setup.data_dir.join("configs").is_dir());
        setup.runtime.shutdown().await.unwrap();
    }

    #[test]
    fn default_schedule_resolves_against_builtin_content() {
        let content = Content::builtin().unwrap();
        let schedule = content.schedule(DEFAULT_SCHEDULE).unwrap();
        assert_eq!(schedule.intervals().len(), 2);
    }
}

//! Client builder with dependency injection pattern.

use anyhow::{Context, Result};
use client_bootstrap::{DEFAULT_CONFIG_NAME, RuntimeSetup};

use crate::Client;

/// Builder for constructing a Client with proper validation.
///
/// The runtime is required; the configuration name and seeding default to
/// the values carried by a [`RuntimeSetup`] when one is given.
pub struct ClientBuilder {
    runtime: Option<runtime::Runtime>,
    config_name: String,
    seeded: bool,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            runtime: None,
            config_name: DEFAULT_CONFIG_NAME.to_string(),
            seeded: false,
        }
    }
}

impl ClientBuilder {
    /// Create a new ClientBuilder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the runtime and run settings from a bootstrap setup.
    pub fn setup(mut self, setup: RuntimeSetup) -> Self {
        self.config_name = setup.config.config_name;
        self.seeded = setup.config.seeded_run;
        self.runtime = Some(setup.runtime);
        self
    }

    /// Set the runtime (required).
    pub fn runtime(mut self, runtime: runtime::Runtime) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Configuration new runs are started with.
    pub fn config_name(mut self, name: impl Into<String>) -> Self {
        self.config_name = name.into();
        self
    }

    /// Seed new runs from the ROM identity.
    pub fn seeded(mut self, seeded: bool) -> Self {
        self.seeded = seeded;
        self
    }

    /// Build the Client.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime is not set.
    pub fn build(self) -> Result<Client> {
        let runtime = self
            .runtime
            .context("Runtime is required. Use .runtime() or .setup() to set it.")?;

        Ok(Client {
            runtime,
            config_name: self.config_name,
            seeded: self.seeded,
        })
    }
}

//! Randomized item delivery client binary.
//!
//! This binary is the composition root that assembles:
//! 1. Configuration from the environment (after `.env`)
//! 2. Logging to stderr and a per-run log file
//! 3. Runtime via the bootstrap `RuntimeBuilder`
//! 4. The console client that starts runs and reports deliveries
//!
//! Without a device transport configured the runtime talks to the built-in
//! simulated device, whose clock advances at `RIP_SIMULATE_FPS`.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use client_bootstrap::{CliConfig, RuntimeBuilder};
use directories::ProjectDirs;
use rip_client::Client;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = CliConfig::from_env();
    let _guard = setup_logging()?;

    tracing::info!("Starting rip client");
    tracing::info!("Configuration: {}", config.config_name);
    tracing::info!("Seeded runs: {}", config.seeded_run);

    let setup = RuntimeBuilder::new(config).build().await?;
    tracing::info!("Runtime built successfully");

    let client = Client::builder().setup(setup).build()?;
    client.run().await?;

    tracing::info!("Client shutdown complete");
    Ok(())
}

/// Setup logging to both stderr and a file in a per-run log directory.
fn setup_logging() -> Result<WorkerGuard> {
    let started = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    let run_log_dir = log_directory().join(format!("run_{started}"));
    std::fs::create_dir_all(&run_log_dir)
        .with_context(|| format!("failed to create log directory {}", run_log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&run_log_dir, "client.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    tracing::info!("Log file: {}/client.log", run_log_dir.display());
    Ok(guard)
}

/// Platform cache directory for logs, falling back to the temp dir.
fn log_directory() -> PathBuf {
    ProjectDirs::from("", "", "rip")
        .map(|dirs| dirs.cache_dir().join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("rip").join("logs"))
}

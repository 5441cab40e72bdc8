//! Daemon configuration
//!
//! Sources, lowest precedence first: built-in defaults, an optional file named
//! by `GOVERNOR_CONFIG_FILE`, then `GOVERNOR__*` environment variables
//! (`GOVERNOR__API_PORT`, `GOVERNOR__GOVERNOR__TARGET_FRAME_RATE`, ...).

use anyhow::{Context, Result};
use governor_lib::GovernorConfig;
use serde::Deserialize;
use std::path::Path;

/// Environment variable naming an optional config file
pub const CONFIG_FILE_ENV: &str = "GOVERNOR_CONFIG_FILE";

#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Name attached to every structured log event
    #[serde(default = "default_device_name")]
    pub device_name: String,

    /// Port for the health, metrics and control API
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Generate display refresh ticks locally at the target frame rate.
    /// Disable when a real display host feeds ticks.
    #[serde(default = "default_simulate_display")]
    pub simulate_display: bool,

    #[serde(default)]
    pub governor: GovernorConfig,
}

fn default_device_name() -> String {
    std::env::var("DEVICE_NAME").unwrap_or_else(|_| "wearable".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_simulate_display() -> bool {
    true
}

impl DaemonConfig {
    /// Load configuration from the environment and optional config file
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_FILE_ENV).ok();
        Self::load_from(file.as_deref().map(Path::new))
    }

    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::with_prefix("GOVERNOR")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration")?;

        let daemon: DaemonConfig = config
            .try_deserialize()
            .context("failed to parse configuration")?;
        daemon.governor.validate()?;

        Ok(daemon)
    }
}

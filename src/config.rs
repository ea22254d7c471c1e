//! Configuration loader for the `cloudwatcher-solo` service.
//!
//! This module centralizes all runtime configuration values and their defaults,
//! loading from environment variables (with optional `.env` file support
//! provided by the caller). The station address is the only setting the driver
//! itself persists; the values here only decide how the standalone host runs.
//!
use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

/// Parse an optional integer environment variable with a default value.
macro_rules! parse_env_u32 {
    ($var_name:expr, $default:expr) => {
        env::var($var_name)
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .map_err(|e| anyhow!("Invalid {}: {}", $var_name, e))?
            .unwrap_or($default)
    };
}

/// Read an optional string environment variable; empty counts as unset.
macro_rules! optional_env {
    ($var_name:expr) => {
        env::var($var_name).ok().filter(|v| !v.trim().is_empty())
    };
}

pub const DEFAULT_CONFIG_PATH: &str = "cloudwatcher.json";

/// Strongly typed application configuration.
///
/// All fields are immutable after loading, ensuring a consistent configuration
/// snapshot for the lifetime of the application.
#[derive(Debug, Clone)]
pub struct Config {
    // ---
    /// Station report URL. Overrides the persisted address when set.
    pub address: Option<String>,

    /// JSON file holding persisted device settings.
    pub config_path: PathBuf,

    /// Seconds between two poll cycles.
    pub poll_secs: u32,

    /// Port of the status HTTP server.
    pub listen_port: u16,
}

/// Load configuration from environment variables with defaults.
///
/// Optional:
/// - `CWS_ADDRESS` – station report URL (default: persisted value)
/// - `CWS_CONFIG_PATH` – settings file (default: `cloudwatcher.json`)
/// - `CWS_POLL_SECS` – poll period in seconds (default: 60)
/// - `CWS_LISTEN_PORT` – status server port (default: 8080)
///
/// Returns an error if any variable is present but invalid.
pub fn load_from_env() -> Result<Config> {
    // ---
    let address = optional_env!("CWS_ADDRESS");
    let config_path = optional_env!("CWS_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let poll_secs = parse_env_u32!("CWS_POLL_SECS", 60);
    let listen_port = parse_env_u32!("CWS_LISTEN_PORT", 8080);

    if poll_secs == 0 {
        return Err(anyhow!("Invalid CWS_POLL_SECS: must be at least 1"));
    }
    let listen_port = u16::try_from(listen_port)
        .map_err(|_| anyhow!("Invalid CWS_LISTEN_PORT: {} is not a port", listen_port))?;

    Ok(Config {
        address,
        config_path,
        poll_secs,
        listen_port,
    })
}

impl Config {
    /// Log the loaded configuration for debugging purposes.
    pub fn log_config(&self) {
        // ---
        tracing::info!("Configuration loaded:");
        tracing::info!(
            "  CWS_ADDRESS     : {}",
            self.address.as_deref().unwrap_or("(persisted)")
        );
        tracing::info!("  CWS_CONFIG_PATH : {}", self.config_path.display());
        tracing::info!("  CWS_POLL_SECS   : {}", self.poll_secs);
        tracing::info!("  CWS_LISTEN_PORT : {}", self.listen_port);
    }
}

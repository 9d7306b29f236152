/// `load_config` module: loads the static YAML config and injects secrets from the environment.
///
/// This is the only place where user-supplied YAML is parsed into the core's [`SyncConfig`].
///
/// # Responsibilities
/// - Parse the YAML file (`catalog`, `lake`, `creation` sections) with defaults filled in by serde
/// - Inject the Databricks and Fabric bearer tokens from `DATABRICKS_TOKEN` and
///   `FABRIC_BEARER_TOKEN` (a `.env` file is honoured); tokens are never read from YAML
/// - Validate the result so a bad config fails before any network call
///
/// # Errors
/// All errors use `anyhow::Error` with context, surfaced at the CLI boundary.
use anyhow::{Context, Result};
use shortcut_sync_core::config::{Secret, SyncConfig};
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const DATABRICKS_TOKEN_ENV: &str = "DATABRICKS_TOKEN";
pub const FABRIC_TOKEN_ENV: &str = "FABRIC_BEARER_TOKEN";

/// Parses YAML text into a [`SyncConfig`] without touching the environment.
pub fn parse_config(content: &str) -> Result<SyncConfig> {
    let config: SyncConfig =
        serde_yaml::from_str(content).context("Failed to parse config YAML")?;
    Ok(config)
}

fn secret_from_env(name: &str) -> Result<Secret> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(Secret::new(value.trim())),
        Ok(_) => {
            error!(var = name, "Environment variable is empty");
            Err(anyhow::anyhow!("{name} is set but empty"))
        }
        Err(e) => {
            error!(error = ?e, var = name, "Environment variable missing");
            Err(anyhow::anyhow!("{name} missing in environment"))
        }
    }
}

/// Loads a static YAML config file and injects the bearer tokens from the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SyncConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e)
    })?;

    let mut config = parse_config(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
        e
    })?;
    info!(config_path = ?path_ref, "Parsed config YAML successfully");

    config.catalog.token = secret_from_env(DATABRICKS_TOKEN_ENV)?;
    config.lake.token = secret_from_env(FABRIC_TOKEN_ENV)?;

    config.validate()?;
    config.trace_loaded();
    Ok(config)
}

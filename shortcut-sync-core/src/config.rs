use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contract::ConflictPolicy;
use crate::error::SyncError;

/// A credential that never shows up in `Debug` output or logs.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(<unset>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}

/// Everything one sync run needs. Defaults are resolved once, at deserialisation.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub catalog: CatalogConfig,
    pub lake: LakeConfig,
    #[serde(default)]
    pub creation: CreationConfig,
    /// Stop dispatching new items once this many seconds have passed.
    #[serde(default)]
    pub run_deadline_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Databricks workspace URL, e.g. `https://adb-123.azuredatabricks.net`.
    pub endpoint: String,
    /// Injected from the environment; never read from the config file.
    #[serde(skip)]
    pub token: Secret,
    pub catalog_name: String,
    pub schemas: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LakeConfig {
    pub workspace_id: String,
    pub lakehouse_id: String,
    pub connection_id: String,
    #[serde(default = "default_skip_if_exists")]
    pub skip_if_exists: bool,
    #[serde(default = "default_fabric_endpoint")]
    pub api_endpoint: String,
    #[serde(skip)]
    pub token: Secret,
}

impl LakeConfig {
    pub fn conflict_policy(&self) -> ConflictPolicy {
        ConflictPolicy::from_skip_if_exists(self.skip_if_exists)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreationConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Only tables stored in this format are mirrored.
    #[serde(default = "default_supported_format")]
    pub supported_format: String,
    /// Shortcut name template; understands `{catalog}`, `{schema}` and `{table}`.
    #[serde(default = "default_shortcut_name")]
    pub shortcut_name: String,
    /// Wait after a 429 without `Retry-After`.
    #[serde(default = "default_rate_limit_wait_secs")]
    pub rate_limit_default_wait_secs: u64,
    /// Added on top of a server-provided `Retry-After`.
    #[serde(default = "default_rate_limit_margin_secs")]
    pub rate_limit_margin_secs: u64,
}

impl Default for CreationConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            max_workers: default_max_workers(),
            supported_format: default_supported_format(),
            shortcut_name: default_shortcut_name(),
            rate_limit_default_wait_secs: default_rate_limit_wait_secs(),
            rate_limit_margin_secs: default_rate_limit_margin_secs(),
        }
    }
}

impl CreationConfig {
    /// How long to wait after a 429 answer.
    pub fn rate_limit_wait(&self, retry_after_secs: Option<u64>) -> Duration {
        match retry_after_secs {
            Some(secs) => Duration::from_secs(secs + self.rate_limit_margin_secs),
            None => Duration::from_secs(self.rate_limit_default_wait_secs),
        }
    }

    /// Exponential backoff before the attempt following `attempt_index`.
    pub fn backoff(&self, attempt_index: u32) -> Duration {
        Duration::from_secs(2u64.saturating_pow(attempt_index))
    }
}

fn default_skip_if_exists() -> bool {
    true
}

fn default_fabric_endpoint() -> String {
    "https://api.fabric.microsoft.com".to_string()
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_workers() -> usize {
    2
}

fn default_supported_format() -> String {
    "DELTA".to_string()
}

fn default_shortcut_name() -> String {
    "{table}".to_string()
}

fn default_rate_limit_wait_secs() -> u64 {
    60
}

fn default_rate_limit_margin_secs() -> u64 {
    5
}

impl SyncConfig {
    pub fn run_deadline(&self) -> Option<Duration> {
        self.run_deadline_secs.map(Duration::from_secs)
    }

    /// Rejects configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.catalog.schemas.is_empty() {
            return Err(SyncError::InvalidConfig(
                "catalog.schemas must list at least one schema".into(),
            ));
        }
        if self.creation.max_workers == 0 {
            return Err(SyncError::InvalidConfig(
                "creation.max_workers must be at least 1".into(),
            ));
        }
        if self.creation.max_retries == 0 {
            return Err(SyncError::InvalidConfig(
                "creation.max_retries must be at least 1".into(),
            ));
        }
        if !self.creation.shortcut_name.contains("{table}") {
            return Err(SyncError::InvalidConfig(
                "creation.shortcut_name must contain the {table} placeholder".into(),
            ));
        }
        Ok(())
    }

    pub fn trace_loaded(&self) {
        info!(
            catalog = %self.catalog.catalog_name,
            schemas_count = self.catalog.schemas.len(),
            workspace_id = %self.lake.workspace_id,
            lakehouse_id = %self.lake.lakehouse_id,
            max_workers = self.creation.max_workers,
            max_retries = self.creation.max_retries,
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}

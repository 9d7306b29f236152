//! # contract: collaborator interfaces and the data they exchange
//!
//! The engine never talks HTTP itself. It is driven through three traits:
//!
//! - [`CatalogReader`]: lists the tables of one Unity Catalog schema.
//! - [`LakeLister`]: lists the shortcuts already present in the lakehouse.
//! - [`ShortcutApi`]: issues a single create-shortcut call and hands back the raw response.
//!
//! ## Mocking & Testing
//! - All traits are annotated for `mockall`; the mocks are exported under the
//!   `test-export-mocks` feature so integration tests and the CLI crate can use them.
//!
//! ## Implementors
//! - The `shortcut-sync` crate carries the `reqwest` clients for Databricks and Fabric.

use std::fmt;

use async_trait::async_trait;
#[allow(unused_imports)]
use mockall::{automock, predicate::*};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CollaboratorError, TransportError};

/// Kind of a catalog table as reported by Unity Catalog (`table_type`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TableKind {
    External,
    Managed,
    View,
    /// Anything the catalog reports that we do not model explicitly.
    Other(String),
}

impl From<String> for TableKind {
    fn from(s: String) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "EXTERNAL" => TableKind::External,
            "MANAGED" => TableKind::Managed,
            "VIEW" => TableKind::View,
            _ => TableKind::Other(s),
        }
    }
}

impl From<TableKind> for String {
    fn from(kind: TableKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::External => f.write_str("EXTERNAL"),
            TableKind::Managed => f.write_str("MANAGED"),
            TableKind::View => f.write_str("VIEW"),
            TableKind::Other(s) => f.write_str(s),
        }
    }
}

/// One table row from the source catalog. Field names follow the Unity Catalog REST shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub catalog_name: String,
    pub schema_name: String,
    pub name: String,
    pub table_type: TableKind,
    #[serde(default)]
    pub data_source_format: Option<String>,
    /// `abfss://container@host/path` for external tables; absent for views.
    #[serde(default)]
    pub storage_location: Option<String>,
}

/// A shortcut that already exists in the lakehouse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExistingShortcut {
    /// Folder the shortcut lives in, e.g. `Tables/sales`.
    pub path: String,
    pub name: String,
}

/// Everything needed to create one shortcut, derived from an eligible [`TableDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedShortcutRequest {
    pub catalog_name: String,
    pub schema_name: String,
    pub table_name: String,
    /// Name sent to the create call; also the name used for existence checks.
    pub desired_name: String,
    /// `Tables/{schema}`
    pub target_path: String,
    pub storage_host: String,
    pub storage_container: String,
    pub storage_subpath: String,
    pub connection_id: String,
}

impl NormalizedShortcutRequest {
    /// ADLS Gen2 account URL the shortcut points at.
    pub fn location(&self) -> String {
        format!("https://{}/{}", self.storage_host, self.storage_container)
    }

    /// JSON body for the Fabric create-shortcut endpoint.
    pub fn payload(&self) -> CreateShortcutBody<'_> {
        CreateShortcutBody {
            path: &self.target_path,
            name: &self.desired_name,
            target: ShortcutTarget {
                adls_gen2: AdlsGen2Target {
                    location: self.location(),
                    subpath: &self.storage_subpath,
                    connection_id: &self.connection_id,
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateShortcutBody<'a> {
    pub path: &'a str,
    pub name: &'a str,
    pub target: ShortcutTarget<'a>,
}

#[derive(Debug, Serialize)]
pub struct ShortcutTarget<'a> {
    #[serde(rename = "adlsGen2")]
    pub adls_gen2: AdlsGen2Target<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdlsGen2Target<'a> {
    pub location: String,
    pub subpath: &'a str,
    pub connection_id: &'a str,
}

/// What the lake should do when a shortcut with the same name already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Reject the call; the API answers 400 and the item is treated as already present.
    Abort,
    /// Let the lake pick a unique name.
    GenerateUniqueName,
}

impl ConflictPolicy {
    pub fn from_skip_if_exists(skip_if_exists: bool) -> Self {
        if skip_if_exists {
            ConflictPolicy::Abort
        } else {
            ConflictPolicy::GenerateUniqueName
        }
    }
}

/// Raw answer of a create-shortcut call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed `Retry-After` header, in seconds.
    pub retry_after_secs: Option<u64>,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            retry_after_secs: None,
            body: body.into(),
        }
    }

    pub fn with_retry_after(mut self, secs: u64) -> Self {
        self.retry_after_secs = Some(secs);
        self
    }
}

/// Reads table definitions from the source catalog.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CatalogReader: Send + Sync {
    /// All tables of `catalog.schema`. Any non-success answer is a [`CatalogError`].
    async fn list_tables(
        &self,
        catalog: &str,
        schema: &str,
    ) -> Result<Vec<TableDescriptor>, CatalogError>;
}

/// Lists shortcuts currently present in the target lakehouse.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait LakeLister: Send + Sync {
    /// Every shortcut whose path is `root` or lies below it.
    async fn list_shortcuts(&self, root: &str) -> Result<Vec<ExistingShortcut>, CollaboratorError>;
}

/// Performs create-shortcut calls against the lake.
///
/// Implementors must not interpret the status code: retry and classification
/// belong to the creator.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ShortcutApi: Send + Sync {
    async fn create_shortcut(
        &self,
        request: &NormalizedShortcutRequest,
        policy: ConflictPolicy,
    ) -> Result<ApiResponse, TransportError>;
}

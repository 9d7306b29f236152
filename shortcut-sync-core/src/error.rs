use thiserror::Error;

/// Boxed error for collaborator calls that have no structured failure shape.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// A catalog fetch that did not return a usable table listing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("catalog request failed (status {status:?}): {message}")]
pub struct CatalogError {
    /// HTTP status when the server answered; `None` for transport failures.
    pub status: Option<u16>,
    pub message: String,
}

/// The create-shortcut call never produced an HTTP response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Errors that abort a whole sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("cannot read Unity Catalog schema '{schema}': {source}")]
    CatalogUnreachable {
        schema: String,
        #[source]
        source: CatalogError,
    },

    #[error("cannot list lakehouse shortcuts: {0}")]
    LakeUnavailable(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

//! Descriptor normalization: decides whether a catalog table is eligible for a
//! shortcut and, if so, turns it into a [`NormalizedShortcutRequest`].

use thiserror::Error;

use crate::config::CreationConfig;
use crate::contract::{NormalizedShortcutRequest, TableDescriptor, TableKind};

/// Container, host and subpath of an `abfss://container@host/path` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLocation {
    pub container: String,
    pub host: String,
    pub subpath: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("table has no storage location")]
    Missing,
    #[error("storage location '{0}' has no scheme")]
    NoScheme(String),
    #[error("storage location '{0}' has no '@' between container and host")]
    NoContainer(String),
    #[error("storage location '{0}' has no '/' after the host")]
    NoPath(String),
}

/// Why a descriptor did not produce a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligible {
    NotExternal(TableKind),
    UnsupportedFormat(Option<String>),
    MalformedLocation(LocationError),
}

/// Splits `scheme://container@host/sub/path` at the first `@` and the first `/` after it.
pub fn parse_storage_location(uri: &str) -> Result<StorageLocation, LocationError> {
    let (_, without_scheme) = uri
        .split_once("://")
        .ok_or_else(|| LocationError::NoScheme(uri.to_string()))?;
    let (container, remainder) = without_scheme
        .split_once('@')
        .ok_or_else(|| LocationError::NoContainer(uri.to_string()))?;
    let (host, subpath) = remainder
        .split_once('/')
        .ok_or_else(|| LocationError::NoPath(uri.to_string()))?;
    if container.is_empty() {
        return Err(LocationError::NoContainer(uri.to_string()));
    }
    if host.is_empty() {
        return Err(LocationError::NoPath(uri.to_string()));
    }
    Ok(StorageLocation {
        container: container.to_string(),
        host: host.to_string(),
        subpath: subpath.trim_end_matches('/').to_string(),
    })
}

/// Renders the shortcut name template for one table.
pub fn shortcut_name(template: &str, descriptor: &TableDescriptor) -> String {
    template
        .replace("{catalog}", &descriptor.catalog_name)
        .replace("{schema}", &descriptor.schema_name)
        .replace("{table}", &descriptor.name)
}

pub fn target_path(schema: &str) -> String {
    format!("Tables/{schema}")
}

pub fn normalize(
    descriptor: &TableDescriptor,
    creation: &CreationConfig,
    connection_id: &str,
) -> Result<NormalizedShortcutRequest, Ineligible> {
    if descriptor.table_type != TableKind::External {
        return Err(Ineligible::NotExternal(descriptor.table_type.clone()));
    }

    let supported = descriptor
        .data_source_format
        .as_deref()
        .is_some_and(|f| f.eq_ignore_ascii_case(&creation.supported_format));
    if !supported {
        return Err(Ineligible::UnsupportedFormat(
            descriptor.data_source_format.clone(),
        ));
    }

    let uri = descriptor
        .storage_location
        .as_deref()
        .ok_or(Ineligible::MalformedLocation(LocationError::Missing))?;
    let location = parse_storage_location(uri).map_err(Ineligible::MalformedLocation)?;

    Ok(NormalizedShortcutRequest {
        catalog_name: descriptor.catalog_name.clone(),
        schema_name: descriptor.schema_name.clone(),
        table_name: descriptor.name.clone(),
        desired_name: shortcut_name(&creation.shortcut_name, descriptor),
        target_path: target_path(&descriptor.schema_name),
        storage_host: location.host,
        storage_container: location.container,
        storage_subpath: location.subpath,
        connection_id: connection_id.to_string(),
    })
}

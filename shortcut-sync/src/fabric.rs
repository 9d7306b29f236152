#![doc = "Fabric lakehouse client: lists existing shortcuts and creates new ones over the Fabric REST API."]
//
//! # Fabric client (CLI <-> Core)
//!
//! This module wires the core's [`LakeLister`] and [`ShortcutApi`] traits to the Fabric
//! REST API (`/v1/workspaces/{workspace}/items/{lakehouse}/shortcuts`).
//!
//! - [`FabricClient::create_shortcut`] returns the raw status, `Retry-After` and body; the
//!   core decides what a status means.
//! - [`FabricClient::list_shortcuts`] follows `continuationUri` and keeps only shortcuts
//!   under the requested root.

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::{debug, error, info};

use shortcut_sync_core::config::{LakeConfig, Secret};
use shortcut_sync_core::contract::{
    ApiResponse, ConflictPolicy, ExistingShortcut, LakeLister, NormalizedShortcutRequest,
    ShortcutApi,
};
use shortcut_sync_core::error::{CollaboratorError, TransportError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListShortcutsPage {
    #[serde(default)]
    pub value: Vec<ShortcutEntry>,
    #[serde(default)]
    pub continuation_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ShortcutEntry {
    pub name: String,
    pub path: String,
}

/// Entries of `page` whose path is `root` or below it, with the leading `/` dropped.
pub fn shortcuts_under(root: &str, page: ListShortcutsPage) -> Vec<ExistingShortcut> {
    let root = root.trim_matches('/');
    page.value
        .into_iter()
        .filter_map(|entry| {
            let path = entry.path.trim_matches('/');
            let under_root = path == root
                || path
                    .strip_prefix(root)
                    .is_some_and(|rest| rest.starts_with('/'));
            under_root.then(|| ExistingShortcut {
                path: path.to_string(),
                name: entry.name,
            })
        })
        .collect()
}

/// `Retry-After` in delta-seconds form. HTTP-date values are ignored.
pub fn parse_retry_after(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

pub struct FabricClient {
    client: Client,
    api_endpoint: String,
    workspace_id: String,
    lakehouse_id: String,
    token: Secret,
}

impl FabricClient {
    pub fn new(lake: &LakeConfig) -> Self {
        Self {
            client: Client::new(),
            api_endpoint: lake.api_endpoint.trim_end_matches('/').to_string(),
            workspace_id: lake.workspace_id.clone(),
            lakehouse_id: lake.lakehouse_id.clone(),
            token: lake.token.clone(),
        }
    }

    pub fn shortcuts_url(&self) -> String {
        format!(
            "{}/v1/workspaces/{}/items/{}/shortcuts",
            self.api_endpoint, self.workspace_id, self.lakehouse_id
        )
    }

    async fn into_api_response(resp: Response) -> ApiResponse {
        let status = resp.status().as_u16();
        let retry_after_secs = resp
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after);
        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
        ApiResponse {
            status,
            retry_after_secs,
            body,
        }
    }
}

#[async_trait]
impl ShortcutApi for FabricClient {
    async fn create_shortcut(
        &self,
        request: &NormalizedShortcutRequest,
        policy: ConflictPolicy,
    ) -> Result<ApiResponse, TransportError> {
        let url = self.shortcuts_url();
        let mut builder = self
            .client
            .post(&url)
            .bearer_auth(self.token.expose())
            .json(&request.payload());
        if policy == ConflictPolicy::GenerateUniqueName {
            builder = builder.query(&[("shortcutConflictPolicy", "GenerateUniqueName")]);
        }

        debug!(
            path = %request.target_path,
            name = %request.desired_name,
            location = %request.location(),
            subpath = %request.storage_subpath,
            "Creating shortcut"
        );
        match builder.send().await {
            Ok(resp) => Ok(Self::into_api_response(resp).await),
            Err(e) => {
                error!(error = ?e, url = %url, "Request failed");
                Err(TransportError(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl LakeLister for FabricClient {
    async fn list_shortcuts(&self, root: &str) -> Result<Vec<ExistingShortcut>, CollaboratorError> {
        let mut url = self.shortcuts_url();
        let mut shortcuts = Vec::new();

        loop {
            let resp = self
                .client
                .get(&url)
                .bearer_auth(self.token.expose())
                .send()
                .await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                error!(status = %status, url = %url, "Fabric API returned error listing shortcuts. Response body: {body}");
                return Err(format!("list shortcuts failed with status {status}: {body}").into());
            }
            let page: ListShortcutsPage = resp.json().await?;
            let next = page.continuation_uri.clone();
            shortcuts.extend(shortcuts_under(root, page));
            match next {
                Some(next) if !next.is_empty() => url = next,
                _ => break,
            }
        }

        info!(root, shortcuts = shortcuts.len(), "Listed lakehouse shortcuts");
        Ok(shortcuts)
    }
}

//! Unity Catalog reader backed by the Databricks REST API.
//!
//! `GET {workspace}/api/2.1/unity-catalog/tables?catalog_name=..&schema_name=..` with a
//! bearer token, following `next_page_token` until the listing is exhausted.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error, info};

use shortcut_sync_core::config::Secret;
use shortcut_sync_core::contract::{CatalogReader, TableDescriptor};
use shortcut_sync_core::error::CatalogError;

/// One page of the `tables` listing.
#[derive(Debug, Deserialize)]
pub struct ListTablesPage {
    #[serde(default)]
    pub tables: Vec<TableDescriptor>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

pub struct UnityCatalogClient {
    client: Client,
    endpoint: String,
    token: Secret,
}

impl UnityCatalogClient {
    pub fn new(endpoint: &str, token: Secret) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn tables_url(&self) -> String {
        format!("{}/api/2.1/unity-catalog/tables", self.endpoint)
    }
}

#[async_trait]
impl CatalogReader for UnityCatalogClient {
    async fn list_tables(
        &self,
        catalog: &str,
        schema: &str,
    ) -> Result<Vec<TableDescriptor>, CatalogError> {
        let url = self.tables_url();
        let mut tables = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("catalog_name", catalog), ("schema_name", schema)];
            if let Some(token) = page_token.as_deref() {
                query.push(("page_token", token));
            }
            debug!(url = %url, catalog, schema, page_token = ?page_token, "Fetching Unity Catalog tables");

            let resp = self
                .client
                .get(&url)
                .query(&query)
                .bearer_auth(self.token.expose())
                .send()
                .await
                .map_err(|e| {
                    error!(error = ?e, url = %url, "Failed to reach Unity Catalog");
                    CatalogError {
                        status: None,
                        message: e.to_string(),
                    }
                })?;

            let status = resp.status();
            if status != StatusCode::OK {
                let body = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
                error!(
                    status = %status,
                    url = %url,
                    "Unity Catalog returned error. Response body: {body}"
                );
                return Err(CatalogError {
                    status: Some(status.as_u16()),
                    message: body,
                });
            }

            let page: ListTablesPage = resp.json().await.map_err(|e| {
                error!(error = ?e, url = %url, "Failed to parse Unity Catalog tables JSON");
                CatalogError {
                    status: Some(status.as_u16()),
                    message: format!("invalid tables listing: {e}"),
                }
            })?;
            tables.extend(page.tables);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        info!(catalog, schema, tables = tables.len(), "Fetched Unity Catalog tables");
        Ok(tables)
    }
}

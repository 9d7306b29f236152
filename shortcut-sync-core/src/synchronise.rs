//! High-level pipeline: catalog → normalize → diff → create.
//!
//! This module is the top-level driver of a sync run. It:
//!   - Reads every configured schema through the [`CatalogReader`] (fail-fast: one failed
//!     schema aborts the run before any shortcut is created)
//!   - Lists the shortcuts already present through the [`LakeLister`], once
//!   - Normalizes descriptors and diffs them against the existing shortcuts
//!   - Hands the `Create` items to the [`ShortcutCreator`] worker pool
//!   - Aggregates a [`SyncReport`] with per-item outcomes and summary counts
//!
//! # Navigation
//! - Main entrypoint: [`synchronise`]
//! - Dry-run: [`plan`], then inspect the [`SyncPlan`]
//!
//! # Error Handling
//! Only catalog and lake listing failures are returned as [`SyncError`]. Everything that
//! goes wrong for a single table ends up as a [`FailureReason`] in the report.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::SyncConfig;
use crate::contract::{
    CatalogReader, LakeLister, NormalizedShortcutRequest, ShortcutApi, TableDescriptor,
};
use crate::creator::ShortcutCreator;
use crate::diff::{Decider, Decision, ShortcutSet};
use crate::error::{Result, SyncError};
use crate::normalize::{normalize, Ineligible};
use crate::report::{FailureReason, ItemReport, Outcome, SyncReport};

/// Lakehouse folder every shortcut is created under.
pub const TABLES_ROOT: &str = "Tables";

/// What the run intends to do with one catalog table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    Create(NormalizedShortcutRequest),
    SkipExisting(NormalizedShortcutRequest),
    /// Settled without any API call (not external, unsupported format, bad location).
    Settled(Outcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedItem {
    pub schema_name: String,
    pub table_name: String,
    pub action: PlannedAction,
}

/// Result of the read-only half of a run, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    pub items: Vec<PlannedItem>,
    pub existing_shortcuts: usize,
}

impl SyncPlan {
    pub fn to_create(&self) -> impl Iterator<Item = &NormalizedShortcutRequest> {
        self.items.iter().filter_map(|item| match &item.action {
            PlannedAction::Create(request) => Some(request),
            _ => None,
        })
    }

    pub fn create_count(&self) -> usize {
        self.to_create().count()
    }
}

fn ineligible_outcome(descriptor: &TableDescriptor, reason: Ineligible) -> Outcome {
    match reason {
        Ineligible::NotExternal(kind) => {
            info!(
                table = %descriptor.name,
                table_type = %kind,
                "[SYNC] Skipped: table type is not EXTERNAL"
            );
            Outcome::SkippedNotExternal
        }
        Ineligible::UnsupportedFormat(format) => {
            info!(
                table = %descriptor.name,
                format = ?format,
                "[SYNC] Skipped: format not supported"
            );
            Outcome::SkippedUnsupportedFormat
        }
        Ineligible::MalformedLocation(e) => {
            error!(
                table = %descriptor.name,
                error = %e,
                "[SYNC][ERROR] Malformed storage location"
            );
            Outcome::Failed(FailureReason::MalformedLocation(e.to_string()))
        }
    }
}

async fn fetch_descriptors<C>(config: &SyncConfig, catalog: &C) -> Result<Vec<TableDescriptor>>
where
    C: CatalogReader + ?Sized,
{
    let catalog_name = &config.catalog.catalog_name;
    let mut descriptors = Vec::new();
    for schema in &config.catalog.schemas {
        match catalog.list_tables(catalog_name, schema).await {
            Ok(tables) => {
                info!(
                    catalog = %catalog_name,
                    schema = %schema,
                    tables = tables.len(),
                    "[SYNC] Read schema from Unity Catalog"
                );
                descriptors.extend(tables);
            }
            Err(source) => {
                error!(
                    catalog = %catalog_name,
                    schema = %schema,
                    error = %source,
                    "[SYNC][ERROR] Cannot connect to Unity Catalog, aborting run"
                );
                return Err(SyncError::CatalogUnreachable {
                    schema: schema.clone(),
                    source,
                });
            }
        }
    }
    Ok(descriptors)
}

/// Reads the catalog and the lake and decides what to do with every table. No writes.
pub async fn plan<C, L>(config: &SyncConfig, catalog: &C, lake: &L) -> Result<SyncPlan>
where
    C: CatalogReader + ?Sized,
    L: LakeLister + ?Sized,
{
    config.validate()?;
    let descriptors = fetch_descriptors(config, catalog).await?;

    let existing = lake.list_shortcuts(TABLES_ROOT).await.map_err(|e| {
        error!(error = %e, "[SYNC][ERROR] Cannot list lakehouse shortcuts");
        SyncError::LakeUnavailable(e.to_string())
    })?;
    let existing: ShortcutSet = existing.iter().collect();
    info!(existing = existing.len(), "[SYNC] Listed existing shortcuts");

    let mut decider = Decider::new(&existing);
    let mut items = Vec::with_capacity(descriptors.len());
    for descriptor in &descriptors {
        let action = match normalize(descriptor, &config.creation, &config.lake.connection_id) {
            Err(reason) => PlannedAction::Settled(ineligible_outcome(descriptor, reason)),
            Ok(request) => {
                let item = decider.decide(request);
                match item.decision {
                    Decision::Create => PlannedAction::Create(item.request),
                    Decision::SkipExisting => {
                        info!(
                            table = %descriptor.name,
                            key = %item.key(),
                            "[SYNC] Skipped: shortcut with the same name exists"
                        );
                        PlannedAction::SkipExisting(item.request)
                    }
                }
            }
        };
        items.push(PlannedItem {
            schema_name: descriptor.schema_name.clone(),
            table_name: descriptor.name.clone(),
            action,
        });
    }

    Ok(SyncPlan {
        items,
        existing_shortcuts: existing.len(),
    })
}

/// Creates everything the plan marks as `Create` and assembles the report.
pub async fn execute<A>(
    config: &SyncConfig,
    plan: SyncPlan,
    api: Arc<A>,
    cancel: &CancellationToken,
) -> SyncReport
where
    A: ShortcutApi + 'static,
{
    let run_cancel = cancel.child_token();
    let deadline = config.run_deadline().map(|limit| {
        let token = run_cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            warn!(deadline_secs = limit.as_secs(), "[SYNC] Run deadline reached, stopping dispatch");
            token.cancel();
        })
    });

    let creator = ShortcutCreator::new(api, config.creation.clone(), config.lake.conflict_policy());
    let tally = creator.tally();

    let mut slots: Vec<Option<ItemReport>> = Vec::with_capacity(plan.items.len());
    let mut to_create = Vec::new();
    for item in plan.items {
        let settled = match item.action {
            PlannedAction::Create(request) => {
                to_create.push(request);
                slots.push(None);
                continue;
            }
            PlannedAction::SkipExisting(_) => Outcome::SkippedExisting,
            PlannedAction::Settled(outcome) => outcome,
        };
        tally.record(&settled);
        slots.push(Some(ItemReport::without_calls(
            &item.schema_name,
            &item.table_name,
            settled,
        )));
    }

    let mut created = creator.create_all(to_create, &run_cancel).await.into_iter();
    if let Some(handle) = deadline {
        handle.abort();
    }

    let items = slots
        .into_iter()
        .filter_map(|slot| slot.or_else(|| created.next()))
        .collect();
    let summary = tally.snapshot();
    info!(
        created = summary.created,
        skipped = summary.skipped,
        failed = summary.failed,
        "[SYNC] Sync finished"
    );
    SyncReport { summary, items }
}

/// Runs one full sync. Fails only when the catalog or the lake listing cannot be read.
pub async fn synchronise<C, L, A>(
    config: &SyncConfig,
    catalog: &C,
    lake: &L,
    api: Arc<A>,
    cancel: &CancellationToken,
) -> Result<SyncReport>
where
    C: CatalogReader + ?Sized,
    L: LakeLister + ?Sized,
    A: ShortcutApi + 'static,
{
    let run_id = Uuid::new_v4();
    let span = info_span!("sync_run", %run_id, catalog = %config.catalog.catalog_name);
    async move {
        info!("[SYNC] Started syncing from Unity Catalog to Fabric");
        let plan = plan(config, catalog, lake).await?;
        info!(
            planned = plan.items.len(),
            to_create = plan.create_count(),
            "[SYNC] Plan ready"
        );
        Ok::<_, SyncError>(execute(config, plan, api, cancel).await)
    }
    .instrument(span)
    .await
}

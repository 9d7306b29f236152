///
/// CLI interface for shortcut-sync: command parsing, wiring of the HTTP clients, and the
/// user-visible summary.
///
/// All reconciliation logic lives in the [`shortcut-sync-core`] crate; this module only
/// loads config, builds the Databricks and Fabric clients, and calls into the core.
///
/// ## How To Use
/// - From the shell: `shortcut-sync sync --config sync.yaml [--dry-run]`.
/// - Programmatically or from tests: call [`run`] with a constructed [`Cli`].
///
/// [`shortcut-sync-core`]: ../../shortcut-sync-core/
use crate::catalog::UnityCatalogClient;
use crate::fabric::FabricClient;
use crate::load_config::load_config;
use anyhow::Result;
use clap::{Parser, Subcommand};
use shortcut_sync_core::report::{Outcome, SyncReport};
use shortcut_sync_core::synchronise::{plan, synchronise, PlannedAction, SyncPlan};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Mirror Unity Catalog external tables as OneLake shortcuts.
#[derive(Parser)]
#[clap(
    name = "shortcut-sync",
    version,
    about = "Create missing OneLake shortcuts for Unity Catalog external Delta tables"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create every missing shortcut described by the given config file
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Only list what would be created; no shortcut is written
        #[clap(long)]
        dry_run: bool,
    },
}

pub fn render_plan(plan: &SyncPlan) -> String {
    let mut out = String::new();
    for item in &plan.items {
        let line = match &item.action {
            PlannedAction::Create(request) => format!(
                "create  {}/{} -> {}/{}",
                item.schema_name, item.table_name, request.target_path, request.desired_name
            ),
            PlannedAction::SkipExisting(request) => format!(
                "exists  {}/{} -> {}/{}",
                item.schema_name, item.table_name, request.target_path, request.desired_name
            ),
            PlannedAction::Settled(outcome) => format!(
                "skip    {}/{} ({:?})",
                item.schema_name, item.table_name, outcome
            ),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out.push_str(&format!(
        "Dry run: {} shortcuts to create, {} already present in the lakehouse.",
        plan.create_count(),
        plan.existing_shortcuts
    ));
    out
}

pub fn render_summary(report: &SyncReport) -> String {
    let mut out = String::new();
    for item in report.items.iter().filter(|i| i.outcome.is_failed()) {
        if let Outcome::Failed(reason) = &item.outcome {
            out.push_str(&format!(
                "failed  {}/{}: {:?}\n",
                item.schema_name, item.table_name, reason
            ));
        }
    }
    out.push_str(&format!(
        "Sync finished. {} shortcuts created, {} skipped, {} failed.",
        report.summary.created, report.summary.skipped, report.summary.failed
    ));
    out
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { config, dry_run } => {
            let config = load_config(config)?;
            let catalog = UnityCatalogClient::new(&config.catalog.endpoint, config.catalog.token.clone());
            let fabric = Arc::new(FabricClient::new(&config.lake));

            if dry_run {
                tracing::info!(command = "sync", dry_run, "Planning synchronisation");
                let plan = plan(&config, &catalog, fabric.as_ref()).await?;
                println!("{}", render_plan(&plan));
                return Ok(());
            }

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            let signal_task = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupt received, finishing in-flight shortcuts");
                    on_signal.cancel();
                }
            });

            tracing::info!(command = "sync", "Starting synchronisation process");
            let result = synchronise(&config, &catalog, fabric.as_ref(), Arc::clone(&fabric), &cancel).await;
            signal_task.abort();
            match result {
                Ok(report) => {
                    tracing::info!(command = "sync", summary = ?report.summary, "Synchronisation complete");
                    println!("{}", render_summary(&report));
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "sync", error = %e, "Synchronisation failed");
                    Err(e.into())
                }
            }
        }
    }
}

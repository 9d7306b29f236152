use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use tempfile::NamedTempFile;

use shortcut_sync::cli::{render_plan, render_summary};
use shortcut_sync_core::contract::NormalizedShortcutRequest;
use shortcut_sync_core::report::{FailureReason, ItemReport, Outcome, SummaryCounts, SyncReport};
use shortcut_sync_core::synchronise::{PlannedAction, PlannedItem, SyncPlan};

#[test]
fn help_lists_sync_command() {
    let mut cmd = Command::cargo_bin("shortcut-sync").expect("Binary exists");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("sync"));
}

#[test]
fn sync_with_missing_config_file_fails() {
    let mut cmd = Command::cargo_bin("shortcut-sync").expect("Binary exists");
    cmd.arg("sync")
        .arg("--config")
        .arg("/definitely/not/here.yaml")
        .env_remove("RUST_LOG");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn sync_without_tokens_fails_before_network() {
    let config = NamedTempFile::new().expect("Creating temp config file failed");
    write(
        config.path(),
        b"catalog:\n  endpoint: http://127.0.0.1:9\n  catalog_name: main\n  schemas: [sales]\nlake:\n  workspace_id: ws\n  lakehouse_id: lh\n  connection_id: conn\n",
    )
    .expect("Writing temp config failed");

    let mut cmd = Command::cargo_bin("shortcut-sync").expect("Binary exists");
    cmd.arg("sync")
        .arg("--config")
        .arg(config.path())
        .current_dir(std::env::temp_dir())
        .env_remove("DATABRICKS_TOKEN")
        .env_remove("FABRIC_BEARER_TOKEN");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("DATABRICKS_TOKEN"));
}

fn request(name: &str) -> NormalizedShortcutRequest {
    NormalizedShortcutRequest {
        catalog_name: "main".into(),
        schema_name: "sales".into(),
        table_name: name.into(),
        desired_name: name.into(),
        target_path: "Tables/sales".into(),
        storage_host: "acct".into(),
        storage_container: "lake".into(),
        storage_subpath: name.into(),
        connection_id: "conn".into(),
    }
}

#[test]
fn render_plan_lists_each_table() {
    let plan = SyncPlan {
        items: vec![
            PlannedItem {
                schema_name: "sales".into(),
                table_name: "orders".into(),
                action: PlannedAction::Create(request("orders")),
            },
            PlannedItem {
                schema_name: "sales".into(),
                table_name: "customers".into(),
                action: PlannedAction::SkipExisting(request("customers")),
            },
            PlannedItem {
                schema_name: "sales".into(),
                table_name: "v".into(),
                action: PlannedAction::Settled(Outcome::SkippedNotExternal),
            },
        ],
        existing_shortcuts: 1,
    };

    let text = render_plan(&plan);
    assert!(text.contains("create  sales/orders -> Tables/sales/orders"));
    assert!(text.contains("exists  sales/customers -> Tables/sales/customers"));
    assert!(text.contains("skip    sales/v (SkippedNotExternal)"));
    assert!(text.ends_with("Dry run: 1 shortcuts to create, 1 already present in the lakehouse."));
}

#[test]
fn render_summary_reports_counts_and_failures() {
    let report = SyncReport {
        summary: SummaryCounts {
            created: 2,
            skipped: 1,
            failed: 1,
        },
        items: vec![ItemReport::without_calls(
            "sales",
            "secret",
            Outcome::Failed(FailureReason::Forbidden),
        )],
    };

    let text = render_summary(&report);
    assert!(text.contains("failed  sales/secret: Forbidden"));
    assert!(text.ends_with("Sync finished. 2 shortcuts created, 1 skipped, 1 failed."));
}

use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        use std::fmt::Write as FmtWrite;
        let mut msg = String::new();
        let _ = write!(&mut msg, "{:?}", event);
        self.events.lock().unwrap().push(msg);
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use shortcut_sync::cli::{run, Cli, Commands};

    let cli = Cli {
        command: Commands::Sync {
            config: std::path::PathBuf::from("dummy.yaml"),
            dry_run: true,
        },
    };

    let result = run(cli).await;
    assert!(result.is_err(), "dummy.yaml does not exist");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}

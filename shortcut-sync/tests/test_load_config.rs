use serial_test::serial;
use std::env;
use std::fs::write;
use tempfile::NamedTempFile;

use shortcut_sync::load_config::{load_config, DATABRICKS_TOKEN_ENV, FABRIC_TOKEN_ENV};

const CONFIG_YAML: &str = r#"
catalog:
  endpoint: "https://adb-1234.azuredatabricks.net"
  catalog_name: main
  schemas:
    - sales
    - hr
lake:
  workspace_id: "11111111-2222-3333-4444-555555555555"
  lakehouse_id: "66666666-7777-8888-9999-000000000000"
  connection_id: "conn-1"
  skip_if_exists: false
creation:
  max_workers: 4
  shortcut_name: "{schema}_{table}"
run_deadline_secs: 600
"#;

fn config_file(content: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), content).expect("write config");
    file
}

/// A static config plus env secrets produces a complete SyncConfig.
#[test]
#[serial]
fn test_load_config_success_with_env_secrets() {
    let file = config_file(CONFIG_YAML);
    env::set_var(DATABRICKS_TOKEN_ENV, "dapi-test");
    env::set_var(FABRIC_TOKEN_ENV, "fabric-test");

    let config = load_config(file.path()).expect("Config should load");

    assert_eq!(config.catalog.endpoint, "https://adb-1234.azuredatabricks.net");
    assert_eq!(config.catalog.schemas, vec!["sales", "hr"]);
    assert_eq!(config.catalog.token.expose(), "dapi-test");
    assert_eq!(config.lake.token.expose(), "fabric-test");
    assert!(!config.lake.skip_if_exists);
    assert_eq!(config.creation.max_workers, 4);
    assert_eq!(config.creation.max_retries, 3, "unset fields keep defaults");
    assert_eq!(config.creation.shortcut_name, "{schema}_{table}");
    assert_eq!(config.run_deadline_secs, Some(600));
}

#[test]
#[serial]
fn test_load_config_requires_tokens_in_env() {
    let file = config_file(CONFIG_YAML);
    env::remove_var(DATABRICKS_TOKEN_ENV);
    env::set_var(FABRIC_TOKEN_ENV, "fabric-test");

    let err = load_config(file.path()).expect_err("missing token must fail");
    assert!(
        err.to_string().contains(DATABRICKS_TOKEN_ENV),
        "error should name the variable, got: {err}"
    );
}

#[test]
#[serial]
fn test_load_config_rejects_invalid_values() {
    let file = config_file(&CONFIG_YAML.replace("max_workers: 4", "max_workers: 0"));
    env::set_var(DATABRICKS_TOKEN_ENV, "dapi-test");
    env::set_var(FABRIC_TOKEN_ENV, "fabric-test");

    let err = load_config(file.path()).expect_err("zero workers must fail");
    assert!(err.to_string().contains("max_workers"), "got: {err}");
}

#[test]
#[serial]
fn test_load_config_reports_missing_file_and_bad_yaml() {
    let err = load_config("/definitely/not/here.yaml").expect_err("missing file");
    assert!(err.to_string().contains("Failed to read config file"));

    let file = config_file("catalog: [this is not a mapping");
    let err = load_config(file.path()).expect_err("bad yaml");
    assert!(err.to_string().contains("Failed to parse config YAML"));
}

use shortcut_sync::catalog::{ListTablesPage, UnityCatalogClient};
use shortcut_sync::fabric::{parse_retry_after, shortcuts_under, FabricClient, ListShortcutsPage};
use shortcut_sync_core::config::{LakeConfig, Secret};
use shortcut_sync_core::contract::{ExistingShortcut, TableKind};

#[test]
fn test_tables_page_parses_unity_catalog_listing() {
    let json = r#"{
        "tables": [
            {
                "name": "orders",
                "catalog_name": "main",
                "schema_name": "sales",
                "table_type": "EXTERNAL",
                "data_source_format": "DELTA",
                "storage_location": "abfss://lake@acct.dfs.core.windows.net/sales/orders",
                "columns": []
            },
            {
                "name": "v_orders",
                "catalog_name": "main",
                "schema_name": "sales",
                "table_type": "VIEW"
            }
        ],
        "next_page_token": "abc"
    }"#;
    let page: ListTablesPage = serde_json::from_str(json).expect("valid page");

    assert_eq!(page.tables.len(), 2);
    assert_eq!(page.tables[0].table_type, TableKind::External);
    assert_eq!(page.tables[1].table_type, TableKind::View);
    assert_eq!(page.tables[1].storage_location, None);
    assert_eq!(page.next_page_token.as_deref(), Some("abc"));

    let empty: ListTablesPage = serde_json::from_str("{}").expect("empty schema");
    assert!(empty.tables.is_empty());
}

#[test]
fn test_shortcuts_under_filters_by_root() {
    let page: ListShortcutsPage = serde_json::from_str(
        r#"{
            "value": [
                {"name": "orders", "path": "/Tables/sales", "target": {}},
                {"name": "raw", "path": "Files/landing"},
                {"name": "top", "path": "Tables"},
                {"name": "odd", "path": "TablesArchive/x"}
            ],
            "continuationUri": null
        }"#,
    )
    .expect("valid page");

    assert_eq!(
        shortcuts_under("Tables", page),
        vec![
            ExistingShortcut {
                path: "Tables/sales".into(),
                name: "orders".into()
            },
            ExistingShortcut {
                path: "Tables".into(),
                name: "top".into()
            },
        ]
    );
}

#[test]
fn test_parse_retry_after() {
    assert_eq!(parse_retry_after("10"), Some(10));
    assert_eq!(parse_retry_after(" 3 "), Some(3));
    assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
}

#[test]
fn test_client_urls() {
    let catalog = UnityCatalogClient::new("https://adb-1.azuredatabricks.net/", Secret::new("t"));
    assert_eq!(
        catalog.tables_url(),
        "https://adb-1.azuredatabricks.net/api/2.1/unity-catalog/tables"
    );

    let lake = LakeConfig {
        workspace_id: "ws".into(),
        lakehouse_id: "lh".into(),
        connection_id: "conn".into(),
        skip_if_exists: true,
        api_endpoint: "https://api.fabric.microsoft.com/".into(),
        token: Secret::new("t"),
    };
    assert_eq!(
        FabricClient::new(&lake).shortcuts_url(),
        "https://api.fabric.microsoft.com/v1/workspaces/ws/items/lh/shortcuts"
    );
}

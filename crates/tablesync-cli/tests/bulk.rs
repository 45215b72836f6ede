//! Bulk reconciliation through the CLI entry points.

use std::path::Path;
use std::sync::Arc;

use tablesync_cli::client::build_reconciler;
use tablesync_cli::commands::bulk::{parse_manifest, run_all};
use tablesync_cli::render::{render_reports, summary};
use tablesync_cli::{Config, OutputFormat};
use tablesync_core::{MemoryCatalog, RestCatalogConfig};
use tablesync_reconcile::Reconciler;
use tablesync_test_utils::{CatalogHttpServer, CatalogOpKind, TracingCatalog};

const MANIFEST: &str = r#"[
    {"database": "sales", "table": "orders", "ddl": "(id number, amt decimal(10,2))",
     "metadata_location": "s3://b/orders/metadata/v1.json"},
    {"database": "sales", "table": "broken", "ddl": "no columns here",
     "metadata_location": "s3://b/broken/metadata/v1.json"},
    {"database": "sales", "table": "refunds", "ddl": "(id int)",
     "metadata_location": "s3://b/refunds/metadata/v1.json"}
]"#;

#[tokio::test]
async fn bulk_rows_are_independent_and_ordered() {
    let catalog = TracingCatalog::new();
    let reconciler = Reconciler::new(Arc::new(catalog.clone()));
    let requests = parse_manifest(MANIFEST, Path::new(".")).expect("manifest");

    let reports = run_all(&reconciler, requests, 2).await;

    let tables: Vec<_> = reports.iter().map(|r| r.ident.table.as_str()).collect();
    assert_eq!(tables, ["orders", "broken", "refunds"]);
    let codes: Vec<_> = reports.iter().map(|r| r.code()).collect();
    assert_eq!(codes, [201, 400, 201]);

    assert_eq!(catalog.count(CatalogOpKind::CreateTable), 2);
    assert!(catalog.inner().table("sales", "refunds").is_some());
    assert!(catalog.inner().table("sales", "broken").is_none());
    assert_eq!(summary(&reports), "3 table(s): 2 succeeded, 1 failed");
}

#[tokio::test]
async fn bulk_over_http_with_cli_config() {
    let backing = MemoryCatalog::new();
    let server = CatalogHttpServer::start_with_token(Arc::new(backing.clone()), "secret")
        .await
        .expect("server");
    let config = Config {
        catalog: RestCatalogConfig {
            base_url: server.base_url().to_string(),
            retry_backoff_ms: 1,
            ..RestCatalogConfig::default()
        },
        catalog_token: Some("secret".into()),
        format: OutputFormat::Json,
        ..Config::default()
    };

    let reconciler = build_reconciler(&config).await.expect("reconciler");
    let requests = parse_manifest(MANIFEST, Path::new(".")).expect("manifest");
    let reports = run_all(&reconciler, requests, 4).await;

    assert_eq!(reports.iter().filter(|r| r.is_success()).count(), 2);
    assert_eq!(
        backing
            .table("sales", "orders")
            .expect("orders")
            .metadata_location(),
        Some("s3://b/orders/metadata/v1.json")
    );

    let rendered = render_reports(&reports, &config.format).expect("render");
    let json: serde_json::Value = serde_json::from_str(&rendered).expect("json");
    assert_eq!(json[1]["label"], "MALFORMED_DDL");
    assert_eq!(json[2]["code"], 201);
}

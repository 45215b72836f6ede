//! Bulk command - reconcile every table in a manifest.
//!
//! Rows are independent: each runs its own reconciliation and a failed row
//! does not stop the others. A manifest naming one table twice is rejected
//! before anything runs, so the same table is never reconciled concurrently.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tablesync_reconcile::{ReconcileReport, ReconcileRequest, Reconciler};

use crate::Config;
use crate::client::{build_reconciler, warn_unacknowledged};
use crate::render::{render_reports, summary};

/// Arguments for the bulk command.
#[derive(Debug, Args)]
pub struct BulkArgs {
    /// JSON manifest listing the tables to reconcile.
    #[arg(long)]
    pub manifest: PathBuf,

    /// Maximum reconciliations in flight.
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,
}

/// One manifest entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestRow {
    /// Target database.
    pub database: String,
    /// Target table.
    pub table: String,
    /// Inline DDL text.
    #[serde(default)]
    pub ddl: Option<String>,
    /// DDL file, relative to the manifest.
    #[serde(default)]
    pub ddl_file: Option<PathBuf>,
    /// Current snapshot pointer.
    pub metadata_location: String,
    /// Change log to clear after the catalog write.
    #[serde(default)]
    pub change_log: Option<String>,
}

/// Parses a manifest into requests.
///
/// `ddl_file` paths are resolved against `base_dir`.
///
/// # Errors
///
/// Returns an error if the JSON is invalid, a row has neither or both of
/// `ddl` and `ddl_file`, a DDL file cannot be read, or a table appears twice.
pub fn parse_manifest(json: &str, base_dir: &Path) -> Result<Vec<ReconcileRequest>> {
    let rows: Vec<ManifestRow> = serde_json::from_str(json).context("Invalid manifest JSON")?;
    let mut seen = BTreeSet::new();
    let mut requests = Vec::with_capacity(rows.len());

    for (index, row) in rows.into_iter().enumerate() {
        let ddl = match (row.ddl, row.ddl_file) {
            (Some(ddl), None) => ddl,
            (None, Some(file)) => {
                let path = base_dir.join(file);
                std::fs::read_to_string(&path).with_context(|| {
                    format!("Row {index}: failed to read DDL file {}", path.display())
                })?
            }
            _ => anyhow::bail!("Row {index}: exactly one of `ddl` or `ddl_file` is required"),
        };

        let mut request = ReconcileRequest::new(row.database, row.table, ddl, row.metadata_location);
        if let Some(handle) = row.change_log {
            request = request.with_change_log(handle);
        }
        if !seen.insert(request.ident.clone()) {
            anyhow::bail!("Row {index}: table {} appears more than once", request.ident);
        }
        requests.push(request);
    }

    Ok(requests)
}

/// Reconciles all requests with at most `concurrency` in flight.
///
/// Reports come back in manifest order.
pub async fn run_all(
    reconciler: &Reconciler,
    requests: Vec<ReconcileRequest>,
    concurrency: usize,
) -> Vec<ReconcileReport> {
    let mut indexed: Vec<(usize, ReconcileReport)> = stream::iter(requests.into_iter().enumerate())
        .map(|(index, request)| async move { (index, reconciler.reconcile(&request).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;
    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, report)| report).collect()
}

/// Execute the bulk command.
///
/// Returns whether every row succeeded.
///
/// # Errors
///
/// Returns an error if the manifest is unreadable or invalid, or the catalog
/// client cannot be built.
pub async fn execute(args: BulkArgs, config: &Config) -> Result<bool> {
    let json = std::fs::read_to_string(&args.manifest)
        .with_context(|| format!("Failed to read manifest {}", args.manifest.display()))?;
    let base_dir = args.manifest.parent().unwrap_or_else(|| Path::new("."));
    let requests = parse_manifest(&json, base_dir)?;
    warn_unacknowledged(config, &requests);
    tracing::info!(
        tables = requests.len(),
        concurrency = args.concurrency,
        "Starting bulk reconciliation"
    );

    let reconciler = build_reconciler(config).await?;
    let reports = run_all(&reconciler, requests, args.concurrency).await;

    println!("{}", render_reports(&reports, &config.format)?);
    eprintln!("{}", summary(&reports));
    Ok(reports.iter().all(ReconcileReport::is_success))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest_inline_rows() {
        let json = r#"[
            {"database": "sales", "table": "orders", "ddl": "(id int)",
             "metadata_location": "s3://b/o/metadata/v1.json", "change_log": "raw.orders_stream"},
            {"database": "sales", "table": "refunds", "ddl": "(id int)",
             "metadata_location": "s3://b/r/metadata/v1.json"}
        ]"#;
        let requests = parse_manifest(json, Path::new(".")).expect("manifest");
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].change_log.as_deref(), Some("raw.orders_stream"));
        assert_eq!(requests[1].ident.table, "refunds");
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let json = r#"[
            {"database": "sales", "table": "orders", "ddl": "(id int)", "metadata_location": "a/v1.json"},
            {"database": "sales", "table": "orders", "ddl": "(id int)", "metadata_location": "a/v2.json"}
        ]"#;
        let err = parse_manifest(json, Path::new(".")).expect_err("duplicate");
        assert!(err.to_string().contains("appears more than once"));
    }

    #[test]
    fn test_row_needs_exactly_one_ddl_source() {
        let neither = r#"[{"database": "s", "table": "t", "metadata_location": "a/v1.json"}]"#;
        assert!(parse_manifest(neither, Path::new(".")).is_err());

        let both = r#"[{"database": "s", "table": "t", "ddl": "(id int)", "ddl_file": "t.sql",
                        "metadata_location": "a/v1.json"}]"#;
        assert!(parse_manifest(both, Path::new(".")).is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let json = r#"[{"database": "s", "table": "t", "ddl": "(id int)",
                        "metadata_location": "a/v1.json", "pointer": "x"}]"#;
        assert!(parse_manifest(json, Path::new(".")).is_err());
    }

    #[test]
    fn test_ddl_file_resolved_against_base_dir() {
        let dir = std::env::temp_dir().join(format!("tablesync-bulk-{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("dir");
        std::fs::write(dir.join("orders.sql"), "create table orders (id int)").expect("write");

        let json = r#"[{"database": "sales", "table": "orders", "ddl_file": "orders.sql",
                        "metadata_location": "a/v1.json"}]"#;
        let requests = parse_manifest(json, &dir).expect("manifest");
        assert_eq!(requests[0].ddl, "create table orders (id int)");

        std::fs::remove_dir_all(&dir).expect("cleanup");
    }
}

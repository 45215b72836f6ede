//! Reconcile command - reconcile one table.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tablesync_reconcile::ReconcileRequest;

use crate::Config;
use crate::client::{build_reconciler, warn_unacknowledged};
use crate::render::render_reports;

/// Arguments for the reconcile command.
#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Target database.
    #[arg(long)]
    pub database: String,

    /// Target table.
    #[arg(long)]
    pub table: String,

    /// DDL text with the column list.
    #[arg(long, conflicts_with = "ddl_file", required_unless_present = "ddl_file")]
    pub ddl: Option<String>,

    /// File holding the DDL text.
    #[arg(long)]
    pub ddl_file: Option<PathBuf>,

    /// Current snapshot pointer of the source table.
    #[arg(long)]
    pub metadata_location: String,

    /// Change log to clear after the catalog write.
    #[arg(long)]
    pub change_log: Option<String>,
}

impl ReconcileArgs {
    /// Builds the request, reading the DDL file if one was given.
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL file cannot be read or no DDL was given.
    pub fn to_request(&self) -> Result<ReconcileRequest> {
        let ddl = match (&self.ddl, &self.ddl_file) {
            (Some(ddl), _) => ddl.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read DDL file {}", path.display()))?,
            (None, None) => anyhow::bail!("Either --ddl or --ddl-file is required"),
        };
        let mut request =
            ReconcileRequest::new(&self.database, &self.table, ddl, &self.metadata_location);
        if let Some(handle) = &self.change_log {
            request = request.with_change_log(handle);
        }
        Ok(request)
    }
}

/// Execute the reconcile command.
///
/// Returns whether the reconciliation succeeded.
///
/// # Errors
///
/// Returns an error if the request or the catalog client cannot be built.
pub async fn execute(args: ReconcileArgs, config: &Config) -> Result<bool> {
    let request = args.to_request()?;
    warn_unacknowledged(config, std::slice::from_ref(&request));
    let reconciler = build_reconciler(config).await?;
    let report = reconciler.reconcile(&request).await;
    println!("{}", render_reports(std::slice::from_ref(&report), &config.format)?);
    Ok(report.is_success())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ReconcileArgs {
        ReconcileArgs {
            database: "sales".into(),
            table: "orders".into(),
            ddl: Some("(id int)".into()),
            ddl_file: None,
            metadata_location: "s3://b/t/metadata/v1.json".into(),
            change_log: Some("raw.orders_stream".into()),
        }
    }

    #[test]
    fn test_to_request_inline_ddl() {
        let request = args().to_request().expect("request");
        assert_eq!(request.ident.to_string(), "sales.orders");
        assert_eq!(request.ddl, "(id int)");
        assert_eq!(request.change_log.as_deref(), Some("raw.orders_stream"));
    }

    #[test]
    fn test_to_request_missing_file() {
        let args = ReconcileArgs {
            ddl: None,
            ddl_file: Some(PathBuf::from("/nonexistent/tablesync/ddl.sql")),
            ..args()
        };
        let err = args.to_request().expect_err("missing file");
        assert!(err.to_string().contains("Failed to read DDL file"));
    }
}

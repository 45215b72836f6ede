//! The reconciliation orchestrator.
//!
//! One call walks `START -> DB_CHECKED -> TABLE_CHECKED -> CREATING | UPDATING
//! -> DONE` and stops at the first fatal failure. The catalog write is the
//! durable side effect; the change log is cleared only after it commits.
//!
//! Calls for different tables are independent. Calls for the same table are
//! not coordinated here: two concurrent get-then-update sequences can lose an
//! update, since the catalog is last-writer-wins on the full record.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tablesync_core::MemoryCatalog;
//! use tablesync_reconcile::{ReconcileRequest, Reconciler};
//!
//! # tokio_test_block_on(async {
//! let reconciler = Reconciler::new(Arc::new(MemoryCatalog::new()));
//! let request = ReconcileRequest::new(
//!     "sales",
//!     "orders",
//!     "create table orders (id number, name string)",
//!     "s3://b/t/metadata/v1.json",
//! );
//! let report = reconciler.reconcile(&request).await;
//! assert_eq!(report.code(), 201);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use tablesync_core::{
    CatalogClient, CreateDatabaseRequest, CreateTableRequest, EXTERNAL_TABLE_KIND,
    METADATA_LOCATION_KEY, TABLE_TYPE_KEY, TableIdent, TableInput, TableMetadataRecord,
    UpdateTableRequest, reconcile_span,
};
use tracing::Instrument;

use crate::changelog::{ChangeLogAcknowledger, ChangeLogHandle, NoopAcknowledger};
use crate::config::ReconcileConfig;
use crate::error::{SyncError, SyncResult};
use crate::metrics;
use crate::outcome::{Action, Outcome, ReconcileReport};
use crate::pointer::derive_root;
use crate::probe;
use crate::schema::{ParsedSchema, SchemaWarning, parse_schema};
use crate::stage::ReconcileStage;
use crate::update::TableInputBuilder;

/// Input for one reconciliation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileRequest {
    /// Target table.
    pub ident: TableIdent,
    /// DDL text carrying the source column list.
    pub ddl: String,
    /// Current snapshot pointer of the source table.
    pub metadata_location: String,
    /// Change log to clear after the catalog write, if any.
    pub change_log: Option<String>,
}

impl ReconcileRequest {
    /// Creates a request without a change log.
    #[must_use]
    pub fn new(
        database: impl Into<String>,
        table: impl Into<String>,
        ddl: impl Into<String>,
        metadata_location: impl Into<String>,
    ) -> Self {
        Self {
            ident: TableIdent::new(database, table),
            ddl: ddl.into(),
            metadata_location: metadata_location.into(),
            change_log: None,
        }
    }

    /// Sets the change log to clear once the catalog write commits.
    #[must_use]
    pub fn with_change_log(mut self, handle: impl Into<String>) -> Self {
        self.change_log = Some(handle.into());
        self
    }
}

/// Keeps catalog records in step with source tables.
///
/// Holds the catalog client it was constructed with; build a new reconciler
/// when credentials rotate.
#[derive(Clone)]
pub struct Reconciler {
    catalog: Arc<dyn CatalogClient>,
    acknowledger: Arc<dyn ChangeLogAcknowledger>,
    config: ReconcileConfig,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Mutable bookkeeping for one call.
struct Run {
    stage: ReconcileStage,
    warnings: Vec<SchemaWarning>,
}

impl Run {
    fn advance(&mut self, next: ReconcileStage) {
        debug_assert!(
            self.stage.can_transition_to(next),
            "illegal transition {} -> {next}",
            self.stage
        );
        tracing::debug!(from = %self.stage, to = %next, "Reconcile stage transition");
        self.stage = next;
    }

    fn absorb(&mut self, schema: ParsedSchema) -> Vec<tablesync_core::ColumnDef> {
        for warning in &schema.warnings {
            tracing::warn!(kind = warning.kind(), warning = %warning, "Schema warning");
        }
        metrics::record_schema_warnings(&schema.warnings);
        self.warnings.extend(schema.warnings);
        schema.columns
    }
}

impl Reconciler {
    /// Creates a reconciler with default configuration and no change-log
    /// acknowledgment.
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogClient>) -> Self {
        Self {
            catalog,
            acknowledger: Arc::new(NoopAcknowledger),
            config: ReconcileConfig::default(),
        }
    }

    /// Sets the change-log acknowledger.
    #[must_use]
    pub fn with_acknowledger(mut self, acknowledger: Arc<dyn ChangeLogAcknowledger>) -> Self {
        self.acknowledger = acknowledger;
        self
    }

    /// Replaces the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ReconcileConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ReconcileConfig {
        &self.config
    }

    /// Reconciles one table and reports the result.
    ///
    /// Never returns a success code when a fatal step failed. A change-log
    /// clear failure after a committed write yields code 207.
    pub async fn reconcile(&self, request: &ReconcileRequest) -> ReconcileReport {
        let span = reconcile_span(&request.ident.database, &request.ident.table);
        self.reconcile_inner(request).instrument(span).await
    }

    async fn reconcile_inner(&self, request: &ReconcileRequest) -> ReconcileReport {
        let started = Instant::now();
        let mut run = Run {
            stage: ReconcileStage::Start,
            warnings: Vec::new(),
        };

        let outcome = match self.apply(request, &mut run).await {
            Ok((action, columns)) => {
                run.advance(ReconcileStage::Done);
                let log_clear_error = self.clear_change_log(request).await.err();
                Outcome::Committed {
                    action,
                    columns,
                    log_clear_error,
                }
            }
            Err(err) => {
                run.advance(ReconcileStage::Error);
                Outcome::Failed(err)
            }
        };

        let report = ReconcileReport {
            ident: request.ident.clone(),
            metadata_location: request.metadata_location.clone(),
            stage: run.stage,
            outcome,
            warnings: run.warnings,
        };

        metrics::record_reconcile(
            report.outcome_label(),
            report.code(),
            started.elapsed().as_secs_f64(),
        );
        if report.is_success() {
            tracing::info!(
                code = report.code(),
                metadata_location = %request.metadata_location,
                warnings = report.warnings.len(),
                "Reconciliation committed"
            );
        } else {
            tracing::error!(code = report.code(), result = %report, "Reconciliation failed");
        }
        report
    }

    async fn apply(
        &self,
        request: &ReconcileRequest,
        run: &mut Run,
    ) -> SyncResult<(Action, usize)> {
        self.ensure_database(&request.ident.database).await?;
        run.advance(ReconcileStage::DbChecked);

        let current = probe::fetch_table(self.catalog.as_ref(), &request.ident).await?;
        run.advance(ReconcileStage::TableChecked);

        if let Some(current) = current {
            run.advance(ReconcileStage::Updating);
            let columns = self.update_table(request, &current, run).await?;
            Ok((Action::Updated, columns))
        } else {
            run.advance(ReconcileStage::Creating);
            let columns = self.create_table(request, run).await?;
            Ok((Action::Created, columns))
        }
    }

    async fn ensure_database(&self, database: &str) -> SyncResult<()> {
        if probe::database_exists(self.catalog.as_ref(), database).await? {
            return Ok(());
        }

        match self
            .catalog
            .create_database(&CreateDatabaseRequest::new(database))
            .await
        {
            Ok(()) => {
                tracing::info!(database, "Created database");
                Ok(())
            }
            Err(err) if err.is_already_exists() => {
                tracing::debug!(database, "Database created concurrently");
                Ok(())
            }
            Err(err) => Err(SyncError::DatabaseCreateFailed {
                database: database.to_string(),
                message: err.to_string(),
            }),
        }
    }

    async fn create_table(&self, request: &ReconcileRequest, run: &mut Run) -> SyncResult<usize> {
        let storage_location = derive_root(&request.metadata_location)?;
        let columns = run.absorb(parse_schema(&request.ddl)?);
        let column_count = columns.len();

        let input = TableInput {
            name: request.ident.table.clone(),
            storage_location,
            columns,
            parameters: BTreeMap::from([
                (
                    METADATA_LOCATION_KEY.to_string(),
                    request.metadata_location.clone(),
                ),
                (TABLE_TYPE_KEY.to_string(), self.config.table_type.clone()),
            ]),
            table_type: Some(EXTERNAL_TABLE_KIND.to_string()),
            attributes: BTreeMap::new(),
        };

        self.catalog
            .create_table(&CreateTableRequest::new(&request.ident.database, input))
            .await
            .map_err(|err| SyncError::TableCreateFailed {
                table: request.ident.to_string(),
                message: err.to_string(),
            })?;
        Ok(column_count)
    }

    async fn update_table(
        &self,
        request: &ReconcileRequest,
        current: &TableMetadataRecord,
        run: &mut Run,
    ) -> SyncResult<usize> {
        let columns = run.absorb(parse_schema(&request.ddl)?);
        let column_count = columns.len();

        let input = TableInputBuilder::from_current(current)
            .columns(columns)
            .metadata_location(request.metadata_location.as_str())
            .strip(&self.config.read_only_attributes)
            .build();

        self.catalog
            .update_table(&UpdateTableRequest::new(&request.ident.database, input))
            .await
            .map_err(|err| SyncError::TableUpdateFailed {
                table: request.ident.to_string(),
                message: err.to_string(),
            })?;
        Ok(column_count)
    }

    async fn clear_change_log(&self, request: &ReconcileRequest) -> SyncResult<()> {
        let Some(raw) = request.change_log.as_deref() else {
            return Ok(());
        };

        let result = match ChangeLogHandle::parse(raw) {
            Ok(handle) => {
                self.acknowledger
                    .clear(&handle, &self.config.marker_suffix)
                    .await
            }
            Err(err) => Err(err),
        };
        result.map_err(|err| {
            metrics::record_log_clear_failure();
            tracing::warn!(handle = raw, error = %err, "Change log not cleared");
            SyncError::LogClearFailed {
                handle: raw.to_string(),
                message: err.to_string(),
            }
        })
    }
}

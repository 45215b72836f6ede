//! Catalog double with operation recording and failure injection.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tablesync_core::{
    CatalogClient, CatalogError, CreateDatabaseRequest, CreateTableRequest, DatabaseRecord,
    GetDatabaseRequest, GetTableRequest, MemoryCatalog, Result, TableInput, TableMetadataRecord,
    UpdateTableRequest,
};

/// Catalog call kinds, used to target injected failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogOpKind {
    /// `get_database`.
    GetDatabase,
    /// `create_database`.
    CreateDatabase,
    /// `get_table`.
    GetTable,
    /// `create_table`.
    CreateTable,
    /// `update_table`.
    UpdateTable,
}

/// Record of a catalog call for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogOp {
    /// `get_database` call.
    GetDatabase {
        /// Database name.
        name: String,
    },
    /// `create_database` call.
    CreateDatabase {
        /// Database name.
        name: String,
    },
    /// `get_table` call.
    GetTable {
        /// Database name.
        database: String,
        /// Table name.
        name: String,
    },
    /// `create_table` call.
    CreateTable {
        /// Database name.
        database: String,
        /// Payload sent.
        table: TableInput,
    },
    /// `update_table` call.
    UpdateTable {
        /// Database name.
        database: String,
        /// Payload sent.
        table: TableInput,
    },
}

impl CatalogOp {
    /// Kind of this call.
    pub fn kind(&self) -> CatalogOpKind {
        match self {
            Self::GetDatabase { .. } => CatalogOpKind::GetDatabase,
            Self::CreateDatabase { .. } => CatalogOpKind::CreateDatabase,
            Self::GetTable { .. } => CatalogOpKind::GetTable,
            Self::CreateTable { .. } => CatalogOpKind::CreateTable,
            Self::UpdateTable { .. } => CatalogOpKind::UpdateTable,
        }
    }
}

/// [`MemoryCatalog`] wrapper that records every call and can fail on demand.
///
/// Calls are recorded before injected failures are applied, so a failed
/// attempt still shows up in [`TracingCatalog::operations`].
#[derive(Debug, Clone, Default)]
pub struct TracingCatalog {
    inner: MemoryCatalog,
    operations: Arc<Mutex<Vec<CatalogOp>>>,
    persistent: Arc<Mutex<HashMap<CatalogOpKind, CatalogError>>>,
    one_shot: Arc<Mutex<HashMap<CatalogOpKind, VecDeque<CatalogError>>>>,
}

impl TracingCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The wrapped catalog, for seeding and inspecting state.
    pub fn inner(&self) -> &MemoryCatalog {
        &self.inner
    }

    /// Returns all recorded operations.
    pub fn operations(&self) -> Vec<CatalogOp> {
        self.operations.lock().expect("lock").clone()
    }

    /// Returns the kinds of recorded operations, in call order.
    pub fn operation_kinds(&self) -> Vec<CatalogOpKind> {
        self.operations().iter().map(CatalogOp::kind).collect()
    }

    /// Counts recorded operations of one kind.
    pub fn count(&self, kind: CatalogOpKind) -> usize {
        self.operations()
            .iter()
            .filter(|op| op.kind() == kind)
            .count()
    }

    /// Fails every call of `kind` with `error` until cleared.
    pub fn inject_failure(&self, kind: CatalogOpKind, error: CatalogError) {
        self.persistent.lock().expect("lock").insert(kind, error);
    }

    /// Fails the next call of `kind` with `error`; queued errors apply in order.
    pub fn fail_next(&self, kind: CatalogOpKind, error: CatalogError) {
        self.one_shot
            .lock()
            .expect("lock")
            .entry(kind)
            .or_default()
            .push_back(error);
    }

    /// Clears all injected failures.
    pub fn clear_failures(&self) {
        self.persistent.lock().expect("lock").clear();
        self.one_shot.lock().expect("lock").clear();
    }

    fn record(&self, op: CatalogOp) -> Result<()> {
        let kind = op.kind();
        self.operations.lock().expect("lock").push(op);

        if let Some(err) = self
            .one_shot
            .lock()
            .expect("lock")
            .get_mut(&kind)
            .and_then(VecDeque::pop_front)
        {
            return Err(err);
        }
        match self.persistent.lock().expect("lock").get(&kind) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogClient for TracingCatalog {
    async fn get_database(&self, request: &GetDatabaseRequest) -> Result<DatabaseRecord> {
        self.record(CatalogOp::GetDatabase {
            name: request.name.clone(),
        })?;
        self.inner.get_database(request).await
    }

    async fn create_database(&self, request: &CreateDatabaseRequest) -> Result<()> {
        self.record(CatalogOp::CreateDatabase {
            name: request.name.clone(),
        })?;
        self.inner.create_database(request).await
    }

    async fn get_table(&self, request: &GetTableRequest) -> Result<TableMetadataRecord> {
        self.record(CatalogOp::GetTable {
            database: request.database.clone(),
            name: request.name.clone(),
        })?;
        self.inner.get_table(request).await
    }

    async fn create_table(&self, request: &CreateTableRequest) -> Result<()> {
        self.record(CatalogOp::CreateTable {
            database: request.database.clone(),
            table: request.table.clone(),
        })?;
        self.inner.create_table(request).await
    }

    async fn update_table(&self, request: &UpdateTableRequest) -> Result<()> {
        self.record(CatalogOp::UpdateTable {
            database: request.database.clone(),
            table: request.table.clone(),
        })?;
        self.inner.update_table(request).await
    }
}

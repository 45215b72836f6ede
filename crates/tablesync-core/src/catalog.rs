//! The catalog client capability.
//!
//! Reconciliation depends on exactly five catalog calls. Each call takes a typed
//! request so adapters, not callers, own the wire shape of a request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{DatabaseRecord, TableIdent, TableInput, TableMetadataRecord};

/// Request for [`CatalogClient::get_database`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetDatabaseRequest {
    /// Database name.
    pub name: String,
}

/// Request for [`CatalogClient::create_database`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDatabaseRequest {
    /// Database name.
    pub name: String,
}

/// Request for [`CatalogClient::get_table`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetTableRequest {
    /// Owning database.
    pub database: String,
    /// Table name.
    pub name: String,
}

/// Request for [`CatalogClient::create_table`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTableRequest {
    /// Owning database.
    pub database: String,
    /// Table to create.
    pub table: TableInput,
}

/// Request for [`CatalogClient::update_table`].
///
/// The input replaces the stored record as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateTableRequest {
    /// Owning database.
    pub database: String,
    /// Replacement table record.
    pub table: TableInput,
}

impl GetDatabaseRequest {
    /// Creates a lookup for the named database.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl CreateDatabaseRequest {
    /// Creates a request for the named database.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl GetTableRequest {
    /// Creates a lookup for the identified table.
    #[must_use]
    pub fn for_ident(ident: &TableIdent) -> Self {
        Self {
            database: ident.database.clone(),
            name: ident.table.clone(),
        }
    }
}

impl CreateTableRequest {
    /// Creates a request that adds `table` to `database`.
    #[must_use]
    pub fn new(database: impl Into<String>, table: TableInput) -> Self {
        Self {
            database: database.into(),
            table,
        }
    }
}

impl UpdateTableRequest {
    /// Creates a request that replaces `table` in `database`.
    #[must_use]
    pub fn new(database: impl Into<String>, table: TableInput) -> Self {
        Self {
            database: database.into(),
            table,
        }
    }
}

/// Synchronous request/response boundary to the external catalog.
///
/// Lookups of absent entities fail with [`CatalogError::NotFound`]; creates of
/// existing entities fail with [`CatalogError::AlreadyExists`].
///
/// [`CatalogError::NotFound`]: crate::error::CatalogError::NotFound
/// [`CatalogError::AlreadyExists`]: crate::error::CatalogError::AlreadyExists
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetches a database.
    async fn get_database(&self, request: &GetDatabaseRequest) -> Result<DatabaseRecord>;

    /// Creates a database.
    async fn create_database(&self, request: &CreateDatabaseRequest) -> Result<()>;

    /// Fetches a table record.
    async fn get_table(&self, request: &GetTableRequest) -> Result<TableMetadataRecord>;

    /// Creates a table.
    async fn create_table(&self, request: &CreateTableRequest) -> Result<()>;

    /// Replaces a table record.
    async fn update_table(&self, request: &UpdateTableRequest) -> Result<()>;
}

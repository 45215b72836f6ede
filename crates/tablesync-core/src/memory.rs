//! In-memory catalog for tests and local runs.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::catalog::{
    CatalogClient, CreateDatabaseRequest, CreateTableRequest, GetDatabaseRequest, GetTableRequest,
    UpdateTableRequest,
};
use crate::error::{CatalogError, Result};
use crate::model::{DatabaseRecord, TableInput, TableMetadataRecord};

/// Attributes the catalog manages itself and refuses on writes.
pub const CATALOG_MANAGED_ATTRIBUTES: &[&str] = &[
    "CreateTime",
    "UpdateTime",
    "CreatedBy",
    "DatabaseName",
    "CatalogId",
    "VersionId",
    "IsRegisteredWithLakeFormation",
    "IsMultiDialectView",
    "FederatedTable",
];

const MEMORY_CATALOG_ID: &str = "memory";

#[derive(Debug, Default)]
struct DatabaseState {
    tables: BTreeMap<String, StoredTable>,
}

#[derive(Debug, Clone)]
struct StoredTable {
    record: TableMetadataRecord,
    version: u64,
}

/// Thread-safe in-memory catalog.
///
/// Updates replace the whole stored record (last writer wins). Stored records
/// are stamped with catalog-managed attributes, and writes that carry any of
/// [`CATALOG_MANAGED_ATTRIBUTES`] are rejected, mirroring hosted catalogs.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    databases: Arc<RwLock<BTreeMap<String, DatabaseState>>>,
}

impl MemoryCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stored record for a table, if present.
    #[must_use]
    pub fn table(&self, database: &str, name: &str) -> Option<TableMetadataRecord> {
        let databases = self.databases.read().ok()?;
        databases
            .get(database)?
            .tables
            .get(name)
            .map(|stored| stored.record.clone())
    }

    /// Returns true when the database exists.
    #[must_use]
    pub fn has_database(&self, name: &str) -> bool {
        self.databases
            .read()
            .map(|databases| databases.contains_key(name))
            .unwrap_or(false)
    }

    fn poisoned() -> CatalogError {
        CatalogError::Internal {
            message: "lock poisoned".into(),
        }
    }

    fn reject_managed_attributes(input: &TableInput) -> Result<()> {
        let managed: Vec<&str> = CATALOG_MANAGED_ATTRIBUTES
            .iter()
            .copied()
            .filter(|key| input.attributes.contains_key(*key))
            .collect();
        if managed.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::Rejected {
                message: format!(
                    "table input contains read-only attributes: {}",
                    managed.join(", ")
                ),
            })
        }
    }

    fn stamp(
        database: &str,
        input: TableInput,
        version: u64,
        created: Option<&Value>,
    ) -> TableMetadataRecord {
        let now = Value::String(Utc::now().to_rfc3339());
        let mut record = input.into_record();
        record
            .attributes
            .insert("CreateTime".into(), created.cloned().unwrap_or_else(|| now.clone()));
        record.attributes.insert("UpdateTime".into(), now);
        record
            .attributes
            .insert("DatabaseName".into(), Value::String(database.to_string()));
        record
            .attributes
            .insert("CatalogId".into(), Value::String(MEMORY_CATALOG_ID.into()));
        record
            .attributes
            .insert("VersionId".into(), Value::String(version.to_string()));
        record
    }
}

#[async_trait]
impl CatalogClient for MemoryCatalog {
    async fn get_database(&self, request: &GetDatabaseRequest) -> Result<DatabaseRecord> {
        let databases = self.databases.read().map_err(|_| Self::poisoned())?;
        if databases.contains_key(&request.name) {
            Ok(DatabaseRecord {
                name: request.name.clone(),
            })
        } else {
            Err(CatalogError::database_not_found(&request.name))
        }
    }

    async fn create_database(&self, request: &CreateDatabaseRequest) -> Result<()> {
        let mut databases = self.databases.write().map_err(|_| Self::poisoned())?;
        if databases.contains_key(&request.name) {
            return Err(CatalogError::AlreadyExists {
                entity: "database",
                name: request.name.clone(),
            });
        }
        databases.insert(request.name.clone(), DatabaseState::default());
        Ok(())
    }

    async fn get_table(&self, request: &GetTableRequest) -> Result<TableMetadataRecord> {
        let databases = self.databases.read().map_err(|_| Self::poisoned())?;
        let database = databases
            .get(&request.database)
            .ok_or_else(|| CatalogError::database_not_found(&request.database))?;
        database
            .tables
            .get(&request.name)
            .map(|stored| stored.record.clone())
            .ok_or_else(|| CatalogError::table_not_found(&request.database, &request.name))
    }

    async fn create_table(&self, request: &CreateTableRequest) -> Result<()> {
        Self::reject_managed_attributes(&request.table)?;
        let mut databases = self.databases.write().map_err(|_| Self::poisoned())?;
        let database = databases
            .get_mut(&request.database)
            .ok_or_else(|| CatalogError::database_not_found(&request.database))?;
        let name = request.table.name.clone();
        if database.tables.contains_key(&name) {
            return Err(CatalogError::AlreadyExists {
                entity: "table",
                name: format!("{}.{name}", request.database),
            });
        }
        let record = Self::stamp(&request.database, request.table.clone(), 1, None);
        database
            .tables
            .insert(name, StoredTable { record, version: 1 });
        Ok(())
    }

    async fn update_table(&self, request: &UpdateTableRequest) -> Result<()> {
        Self::reject_managed_attributes(&request.table)?;
        let mut databases = self.databases.write().map_err(|_| Self::poisoned())?;
        let database = databases
            .get_mut(&request.database)
            .ok_or_else(|| CatalogError::database_not_found(&request.database))?;
        let stored = database
            .tables
            .get_mut(&request.table.name)
            .ok_or_else(|| CatalogError::table_not_found(&request.database, &request.table.name))?;
        let version = stored.version + 1;
        let created = stored.record.attributes.get("CreateTime").cloned();
        stored.record = Self::stamp(
            &request.database,
            request.table.clone(),
            version,
            created.as_ref(),
        );
        stored.version = version;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnDef, TypeToken};

    fn input(name: &str) -> TableInput {
        TableInput {
            name: name.to_string(),
            storage_location: "s3://b/t/metadata/".into(),
            columns: vec![ColumnDef::new("id", TypeToken::Double)],
            parameters: BTreeMap::new(),
            table_type: None,
            attributes: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn test_database_lifecycle() {
        let catalog = MemoryCatalog::new();
        let err = catalog
            .get_database(&GetDatabaseRequest::new("sales"))
            .await
            .expect_err("missing");
        assert!(err.is_not_found());

        catalog
            .create_database(&CreateDatabaseRequest::new("sales"))
            .await
            .expect("create");
        let again = catalog
            .create_database(&CreateDatabaseRequest::new("sales"))
            .await
            .expect_err("duplicate");
        assert!(again.is_already_exists());
        assert!(catalog.has_database("sales"));
    }

    #[tokio::test]
    async fn test_stored_tables_carry_managed_attributes() {
        let catalog = MemoryCatalog::new();
        catalog
            .create_database(&CreateDatabaseRequest::new("sales"))
            .await
            .expect("create db");
        catalog
            .create_table(&CreateTableRequest::new("sales", input("orders")))
            .await
            .expect("create table");

        let record = catalog.table("sales", "orders").expect("stored");
        assert_eq!(record.attributes.get("VersionId"), Some(&Value::String("1".into())));
        assert!(record.attributes.contains_key("CreateTime"));
        assert!(record.attributes.contains_key("DatabaseName"));
    }

    #[tokio::test]
    async fn test_update_rejects_managed_attributes_and_bumps_version() {
        let catalog = MemoryCatalog::new();
        catalog
            .create_database(&CreateDatabaseRequest::new("sales"))
            .await
            .expect("create db");
        catalog
            .create_table(&CreateTableRequest::new("sales", input("orders")))
            .await
            .expect("create table");

        let fetched = catalog.table("sales", "orders").expect("stored");
        let mut dirty = input("orders");
        dirty.attributes = fetched.attributes.clone();
        let err = catalog
            .update_table(&UpdateTableRequest::new("sales", dirty))
            .await
            .expect_err("managed attributes must be refused");
        assert!(matches!(err, CatalogError::Rejected { .. }));

        catalog
            .update_table(&UpdateTableRequest::new("sales", input("orders")))
            .await
            .expect("clean update");
        let updated = catalog.table("sales", "orders").expect("stored");
        assert_eq!(updated.attributes.get("VersionId"), Some(&Value::String("2".into())));
        assert_eq!(
            updated.attributes.get("CreateTime"),
            fetched.attributes.get("CreateTime")
        );
    }

    #[tokio::test]
    async fn test_update_missing_table_is_not_found() {
        let catalog = MemoryCatalog::new();
        catalog
            .create_database(&CreateDatabaseRequest::new("sales"))
            .await
            .expect("create db");
        let err = catalog
            .update_table(&UpdateTableRequest::new("sales", input("orders")))
            .await
            .expect_err("missing");
        assert!(err.is_not_found());
    }
}

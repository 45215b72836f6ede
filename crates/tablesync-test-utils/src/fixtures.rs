//! Pre-built records and DDL for common scenarios.

use std::collections::BTreeMap;

use tablesync_core::{
    CatalogClient, ColumnDef, CreateDatabaseRequest, CreateTableRequest, EXTERNAL_TABLE_KIND,
    ICEBERG_TABLE_TYPE, METADATA_LOCATION_KEY, TABLE_TYPE_KEY, TableInput,
};

/// Database used by fixtures.
pub const TEST_DATABASE: &str = "sales";

/// Table used by fixtures.
pub const TEST_TABLE: &str = "orders";

/// Snapshot pointer for version `n` of the fixture table.
pub fn pointer(version: u32) -> String {
    format!("s3://b/t/metadata/v{version}.json")
}

/// An Iceberg table input carrying `columns` and the pointer for `version`.
pub fn iceberg_table(name: &str, columns: Vec<ColumnDef>, version: u32) -> TableInput {
    TableInput {
        name: name.to_string(),
        storage_location: "s3://b/t/metadata/".to_string(),
        columns,
        parameters: BTreeMap::from([
            (METADATA_LOCATION_KEY.to_string(), pointer(version)),
            (TABLE_TYPE_KEY.to_string(), ICEBERG_TABLE_TYPE.to_string()),
        ]),
        table_type: Some(EXTERNAL_TABLE_KIND.to_string()),
        attributes: BTreeMap::new(),
    }
}

/// Creates `database` (if needed) and `table` in `catalog`.
pub async fn seed_table<C: CatalogClient + ?Sized>(catalog: &C, database: &str, table: TableInput) {
    match catalog
        .create_database(&CreateDatabaseRequest::new(database))
        .await
    {
        Ok(()) => {}
        Err(err) if err.is_already_exists() => {}
        Err(err) => panic!("seed database {database}: {err}"),
    }
    catalog
        .create_table(&CreateTableRequest::new(database, table))
        .await
        .expect("seed table");
}

//! Existence checks against the catalog.
//!
//! "Not found" is an answer, not a failure. Any other catalog error is
//! ambiguous and surfaces as [`SyncError::CatalogUnavailable`]: treating it
//! as absence would send the orchestrator down the create path over a table
//! that may exist.

use tablesync_core::{
    CatalogClient, CatalogError, GetDatabaseRequest, GetTableRequest, TableIdent,
    TableMetadataRecord,
};

use crate::error::{SyncError, SyncResult};

/// Returns whether the database exists.
///
/// # Errors
///
/// Returns [`SyncError::CatalogUnavailable`] for any lookup failure other than
/// not-found.
pub async fn database_exists<C>(catalog: &C, name: &str) -> SyncResult<bool>
where
    C: CatalogClient + ?Sized,
{
    let request = GetDatabaseRequest::new(name);
    presence(catalog.get_database(&request).await, "get_database")
}

/// Returns whether the table exists.
///
/// # Errors
///
/// Returns [`SyncError::CatalogUnavailable`] for any lookup failure other than
/// not-found.
pub async fn table_exists<C>(catalog: &C, ident: &TableIdent) -> SyncResult<bool>
where
    C: CatalogClient + ?Sized,
{
    Ok(fetch_table(catalog, ident).await?.is_some())
}

/// Looks the table up once, returning its current record when it exists.
///
/// # Errors
///
/// Returns [`SyncError::CatalogUnavailable`] for any lookup failure other than
/// not-found.
pub async fn fetch_table<C>(
    catalog: &C,
    ident: &TableIdent,
) -> SyncResult<Option<TableMetadataRecord>>
where
    C: CatalogClient + ?Sized,
{
    let request = GetTableRequest::for_ident(ident);
    lookup(catalog.get_table(&request).await, "get_table")
}

fn presence<T>(result: Result<T, CatalogError>, operation: &'static str) -> SyncResult<bool> {
    Ok(lookup(result, operation)?.is_some())
}

fn lookup<T>(result: Result<T, CatalogError>, operation: &'static str) -> SyncResult<Option<T>> {
    match result {
        Ok(found) => Ok(Some(found)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(unavailable(operation, &err)),
    }
}

fn unavailable(operation: &'static str, err: &CatalogError) -> SyncError {
    SyncError::CatalogUnavailable {
        operation,
        message: err.to_string(),
    }
}

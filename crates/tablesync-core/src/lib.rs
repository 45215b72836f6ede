//! # tablesync-core
//!
//! Shared primitives for keeping an external catalog in step with a source table.
//!
//! - **Data model**: [`TableMetadataRecord`], [`ColumnDef`], [`TypeToken`] and the
//!   snapshot-pointer parameter keys
//! - **Catalog capability**: the [`CatalogClient`] trait with one typed request per
//!   call, plus [`MemoryCatalog`] and [`RestCatalogClient`] adapters
//! - **Credentials**: the [`CredentialProvider`] interface
//! - **Observability**: logging initialization and span helpers
//!
//! ## Example
//!
//! ```rust
//! use tablesync_core::{ColumnDef, TypeToken};
//!
//! let column = ColumnDef::new("amount", TypeToken::Decimal { precision: 10, scale: 2 });
//! assert_eq!(column.data_type.to_string(), "decimal(10,2)");
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod catalog;
pub mod credentials;
pub mod error;
pub mod memory;
pub mod model;
pub mod observability;
pub mod rest;

pub use catalog::{
    CatalogClient, CreateDatabaseRequest, CreateTableRequest, GetDatabaseRequest, GetTableRequest,
    UpdateTableRequest,
};
pub use credentials::{
    CredentialProvider, EnvCredentialProvider, SessionCredentials, StaticCredentialProvider,
};
pub use error::{CatalogError, Result};
pub use memory::{CATALOG_MANAGED_ATTRIBUTES, MemoryCatalog};
pub use model::{
    ColumnDef, DatabaseRecord, EXTERNAL_TABLE_KIND, ICEBERG_TABLE_TYPE, METADATA_LOCATION_KEY,
    PREVIOUS_METADATA_LOCATION_KEY, ParseTypeTokenError, TABLE_TYPE_KEY, TableIdent, TableInput,
    TableMetadataRecord, TypeToken,
};
pub use observability::{LogFormat, init_logging, reconcile_span};
pub use rest::{ConfigError, RestCatalogClient, RestCatalogConfig};

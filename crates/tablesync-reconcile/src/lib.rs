//! # tablesync-reconcile
//!
//! Keeps a catalog's table record in step with a source table's published DDL
//! and snapshot pointer.
//!
//! ## Components
//!
//! - [`schema`]: column-list extraction, depth-aware splitting and type mapping
//! - [`pointer`]: storage-root derivation from a snapshot pointer
//! - [`probe`]: database/table existence checks where not-found is `false`
//! - [`update`]: the immutable update-payload builder and strip-list
//! - [`changelog`]: best-effort change-log acknowledgment
//! - [`Reconciler`]: the state machine sequencing all of the above
//!
//! Every call yields a [`ReconcileReport`] whose `Display` form starts with a
//! stable numeric code (`201 CREATED`, `503 CATALOG_UNAVAILABLE`, ...).

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod changelog;
pub mod config;
pub mod error;
pub mod metrics;
pub mod outcome;
pub mod pointer;
pub mod probe;
pub mod reconciler;
pub mod schema;
pub mod stage;
pub mod update;

pub use changelog::{
    ChangeLogAcknowledger, ChangeLogError, ChangeLogHandle, DEFAULT_MARKER_SUFFIX,
    NoopAcknowledger, RestStatementExecutor, StatementAcknowledger, StatementExecutor, marker_statement,
};
pub use config::ReconcileConfig;
pub use error::{SyncError, SyncResult};
pub use outcome::{Action, Outcome, ReconcileReport};
pub use pointer::derive_root;
pub use reconciler::{ReconcileRequest, Reconciler};
pub use schema::{ParsedSchema, SchemaWarning, TypeMapping, map_type, parse_schema};
pub use stage::ReconcileStage;
pub use update::TableInputBuilder;

//! Shared test utilities for tablesync integration tests.
//!
//! This crate provides:
//! - [`TracingCatalog`]: in-memory catalog with call recording and failure injection
//! - [`RecordingAcknowledger`]: change-log acknowledger that records handles
//! - [`CatalogHttpServer`]: a catalog served over HTTP for REST adapter tests
//! - Fixtures for the common `sales.orders` scenarios

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
// Test utilities use expect/unwrap for cleaner test code - panics are acceptable in tests
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::panic)]
#![allow(clippy::missing_panics_doc)]

pub mod acknowledger;
pub mod catalog;
pub mod fixtures;
pub mod http;

pub use acknowledger::*;
pub use catalog::*;
pub use fixtures::*;
pub use http::*;

/// Initialize test logging (call once per test module).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("tablesync=debug".parse().expect("valid directive")),
        )
        .with_test_writer()
        .try_init();
}

//! # tablesync-cli
//!
//! Command-line driver for catalog reconciliation.
//!
//! ## Commands
//!
//! - `tablesync reconcile` - Reconcile one table
//! - `tablesync bulk` - Reconcile every table listed in a JSON manifest
//!
//! ## Configuration
//!
//! Flags fall back to environment variables:
//!
//! - `TABLESYNC_CATALOG_URL` - Catalog endpoint (default: `http://localhost:8181`)
//! - `TABLESYNC_CATALOG_TOKEN` - Catalog bearer token
//! - `TABLESYNC_ENV_CREDENTIALS` - Take the bearer token from `TABLESYNC_SESSION_TOKEN`
//! - `TABLESYNC_CATALOG_MAX_ATTEMPTS` - Attempts per catalog request (default: 3)
//! - `TABLESYNC_CATALOG_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `TABLESYNC_CATALOG_CONNECT_TIMEOUT_SECS` - Connect timeout (default: 10)
//! - `TABLESYNC_CATALOG_RETRY_BACKOFF_MS` - Linear retry backoff step (default: 200)
//! - `TABLESYNC_STATEMENT_URL` - Statement endpoint used to clear change logs
//! - `TABLESYNC_MARKER_SUFFIX` - Suffix of the change-log marker table (default: `_CONSUMED`)

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]
// CLI uses print! macros intentionally
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

pub mod client;
pub mod commands;
pub mod render;

use clap::{Parser, Subcommand};
use tablesync_core::{LogFormat, RestCatalogConfig};
use tablesync_reconcile::{DEFAULT_MARKER_SUFFIX, ReconcileConfig};

/// tablesync - keep catalog tables in step with their source.
#[derive(Debug, Parser)]
#[command(name = "tablesync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Catalog endpoint URL.
    #[arg(long, env = "TABLESYNC_CATALOG_URL", default_value = "http://localhost:8181")]
    pub catalog_url: String,

    /// Catalog bearer token.
    #[arg(long, env = "TABLESYNC_CATALOG_TOKEN")]
    pub catalog_token: Option<String>,

    /// Read session credentials from `TABLESYNC_*` environment variables.
    #[arg(long, env = "TABLESYNC_ENV_CREDENTIALS")]
    pub env_credentials: bool,

    /// Attempts per catalog request, including the first.
    #[arg(long, env = "TABLESYNC_CATALOG_MAX_ATTEMPTS", default_value_t = 3)]
    pub max_attempts: u32,

    /// Per-request catalog timeout in seconds.
    #[arg(long, env = "TABLESYNC_CATALOG_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Connect timeout in seconds.
    #[arg(long, env = "TABLESYNC_CATALOG_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Linear backoff step between catalog retries, in milliseconds.
    #[arg(long, env = "TABLESYNC_CATALOG_RETRY_BACKOFF_MS", default_value_t = 200)]
    pub retry_backoff_ms: u64,

    /// Statement endpoint used to clear change logs.
    #[arg(long, env = "TABLESYNC_STATEMENT_URL")]
    pub statement_url: Option<String>,

    /// Bearer token for the statement endpoint.
    #[arg(long, env = "TABLESYNC_STATEMENT_TOKEN")]
    pub statement_token: Option<String>,

    /// Suffix of the marker table left by a change-log clear.
    #[arg(long, env = "TABLESYNC_MARKER_SUFFIX", default_value = DEFAULT_MARKER_SUFFIX)]
    pub marker_suffix: String,

    /// Output format.
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Log output format.
    #[arg(long, env = "TABLESYNC_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormatArg,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Get the effective configuration.
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            catalog: RestCatalogConfig {
                base_url: self.catalog_url.clone(),
                request_timeout_secs: self.timeout_secs,
                connect_timeout_secs: self.connect_timeout_secs,
                max_attempts: self.max_attempts,
                retry_backoff_ms: self.retry_backoff_ms,
            },
            reconcile: ReconcileConfig {
                marker_suffix: self.marker_suffix.clone(),
                ..ReconcileConfig::default()
            },
            catalog_token: self.catalog_token.clone(),
            env_credentials: self.env_credentials,
            statement_url: self.statement_url.clone(),
            statement_token: self.statement_token.clone(),
            format: self.format.clone(),
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconcile one table.
    Reconcile(commands::reconcile::ReconcileArgs),
    /// Reconcile every table in a manifest.
    Bulk(commands::bulk::BulkArgs),
}

/// Output format.
#[derive(Debug, Clone, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// Table output.
    Table,
}

/// Log format flag.
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum LogFormatArg {
    /// Human-readable logs.
    #[default]
    Pretty,
    /// JSON lines.
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Json => Self::Json,
        }
    }
}

/// CLI configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Catalog client settings.
    pub catalog: RestCatalogConfig,
    /// Reconciliation engine settings.
    pub reconcile: ReconcileConfig,
    /// Catalog bearer token.
    pub catalog_token: Option<String>,
    /// Take credentials from the environment.
    pub env_credentials: bool,
    /// Statement endpoint for change-log clearing.
    pub statement_url: Option<String>,
    /// Statement endpoint bearer token.
    pub statement_token: Option<String>,
    /// Output format.
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_config_from_flags() {
        let cli = Cli::parse_from([
            "tablesync",
            "--catalog-url",
            "https://catalog.example.com",
            "--catalog-token",
            "token-abc",
            "--max-attempts",
            "5",
            "--format",
            "json",
            "reconcile",
            "--database",
            "sales",
            "--table",
            "orders",
            "--ddl",
            "(id int)",
            "--metadata-location",
            "s3://b/t/metadata/v1.json",
        ]);

        let config = cli.config();
        assert_eq!(config.catalog.base_url, "https://catalog.example.com");
        assert_eq!(config.catalog.max_attempts, 5);
        assert_eq!(config.catalog_token.as_deref(), Some("token-abc"));
        assert!(matches!(config.format, OutputFormat::Json));
        assert!(matches!(cli.command, Commands::Reconcile(_)));
    }

    #[test]
    fn test_retry_and_marker_flags_reach_config() {
        let cli = Cli::parse_from([
            "tablesync",
            "--connect-timeout-secs",
            "2",
            "--retry-backoff-ms",
            "50",
            "--marker-suffix",
            "_ACK",
            "bulk",
            "--manifest",
            "tables.json",
        ]);

        let config = cli.config();
        assert_eq!(config.catalog.connect_timeout_secs, 2);
        assert_eq!(config.catalog.retry_backoff_ms, 50);
        assert_eq!(config.reconcile.marker_suffix, "_ACK");
        assert_eq!(config.reconcile.table_type, "ICEBERG");
    }

    #[test]
    fn test_catalog_defaults_match_client_defaults() {
        let cli = Cli::parse_from(["tablesync", "bulk", "--manifest", "tables.json"]);
        let config = cli.config();
        assert_eq!(config.catalog, RestCatalogConfig::default());
        assert_eq!(config.reconcile, ReconcileConfig::default());
    }

    #[test]
    fn test_bulk_concurrency_default() {
        let cli = Cli::parse_from(["tablesync", "bulk", "--manifest", "tables.json"]);
        match cli.command {
            Commands::Bulk(args) => assert_eq!(args.concurrency, 4),
            other => panic!("expected bulk, got {other:?}"),
        }
    }
}

//! Reconciliation error taxonomy.
//!
//! A catalog "not found" answer never appears here: the existence prober turns
//! it into `false`. Everything else that can go wrong during a reconciliation
//! call maps onto one of these variants, each tied to the stage that failed and
//! a stable numeric code.

use thiserror::Error;

/// Result type alias for reconciliation operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised while reconciling one table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// The DDL text has no usable parenthesized column list.
    #[error("malformed DDL: {message}")]
    MalformedDdl {
        /// What was wrong with the DDL.
        message: String,
    },

    /// The snapshot pointer has no path separator or no file name.
    #[error("invalid snapshot pointer {pointer:?}: {message}")]
    InvalidPointerFormat {
        /// The pointer as supplied.
        pointer: String,
        /// What was wrong with it.
        message: String,
    },

    /// A catalog lookup failed for a reason other than "not found".
    #[error("catalog unavailable during {operation}: {message}")]
    CatalogUnavailable {
        /// Lookup that failed.
        operation: &'static str,
        /// Underlying catalog error text.
        message: String,
    },

    /// The catalog refused to create the database.
    #[error("failed to create database {database}: {message}")]
    DatabaseCreateFailed {
        /// Database name.
        database: String,
        /// Underlying catalog error text.
        message: String,
    },

    /// The catalog refused to create the table.
    #[error("failed to create table {table}: {message}")]
    TableCreateFailed {
        /// Qualified table name.
        table: String,
        /// Underlying catalog error text.
        message: String,
    },

    /// The catalog refused to update the table.
    #[error("failed to update table {table}: {message}")]
    TableUpdateFailed {
        /// Qualified table name.
        table: String,
        /// Underlying catalog error text.
        message: String,
    },

    /// Clearing the change log failed after the catalog write committed.
    #[error("failed to clear change log {handle}: {message}")]
    LogClearFailed {
        /// Change-log handle.
        handle: String,
        /// Underlying error text.
        message: String,
    },

    /// Any failure not covered by the other variants.
    #[error("unhandled reconciliation error: {message}")]
    Unhandled {
        /// Original error text.
        message: String,
    },
}

impl SyncError {
    /// Creates a malformed DDL error.
    #[must_use]
    pub fn malformed_ddl(message: impl Into<String>) -> Self {
        Self::MalformedDdl {
            message: message.into(),
        }
    }

    /// Creates an invalid pointer error.
    #[must_use]
    pub fn invalid_pointer(pointer: &str, message: impl Into<String>) -> Self {
        Self::InvalidPointerFormat {
            pointer: pointer.to_string(),
            message: message.into(),
        }
    }

    /// Creates a catch-all error carrying the original message.
    #[must_use]
    pub fn unhandled(message: impl Into<String>) -> Self {
        Self::Unhandled {
            message: message.into(),
        }
    }

    /// Stable numeric outcome code for this failure.
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::MalformedDdl { .. } | Self::InvalidPointerFormat { .. } => 400,
            Self::CatalogUnavailable { .. } => 503,
            Self::DatabaseCreateFailed { .. }
            | Self::TableCreateFailed { .. }
            | Self::TableUpdateFailed { .. } => 502,
            Self::LogClearFailed { .. } => 207,
            Self::Unhandled { .. } => 500,
        }
    }

    /// Stable label for this failure, used in result messages.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::MalformedDdl { .. } => "MALFORMED_DDL",
            Self::InvalidPointerFormat { .. } => "INVALID_POINTER",
            Self::CatalogUnavailable { .. } => "CATALOG_UNAVAILABLE",
            Self::DatabaseCreateFailed { .. } => "DATABASE_CREATE_FAILED",
            Self::TableCreateFailed { .. } => "TABLE_CREATE_FAILED",
            Self::TableUpdateFailed { .. } => "TABLE_UPDATE_FAILED",
            Self::LogClearFailed { .. } => "LOG_CLEAR_FAILED",
            Self::Unhandled { .. } => "UNHANDLED",
        }
    }

    /// Returns true when the failure does not invalidate a committed write.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::LogClearFailed { .. })
    }

    /// Name of the step that failed, as reported in result messages.
    #[must_use]
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::MalformedDdl { .. } => "parse_ddl",
            Self::InvalidPointerFormat { .. } => "derive_root",
            Self::CatalogUnavailable { .. } => "probe",
            Self::DatabaseCreateFailed { .. } => "create_database",
            Self::TableCreateFailed { .. } => "create_table",
            Self::TableUpdateFailed { .. } => "update_table",
            Self::LogClearFailed { .. } => "clear_change_log",
            Self::Unhandled { .. } => "unhandled",
        }
    }

    /// Underlying error text without the category prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::MalformedDdl { message }
            | Self::InvalidPointerFormat { message, .. }
            | Self::CatalogUnavailable { message, .. }
            | Self::DatabaseCreateFailed { message, .. }
            | Self::TableCreateFailed { message, .. }
            | Self::TableUpdateFailed { message, .. }
            | Self::LogClearFailed { message, .. }
            | Self::Unhandled { message } => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_by_category() {
        assert_eq!(SyncError::malformed_ddl("no parens").code(), 400);
        assert_eq!(SyncError::invalid_pointer("x", "no slash").code(), 400);
        assert_eq!(
            SyncError::CatalogUnavailable {
                operation: "get_database",
                message: "timeout".into()
            }
            .code(),
            503
        );
        assert_eq!(
            SyncError::TableUpdateFailed {
                table: "a.b".into(),
                message: "rejected".into()
            }
            .code(),
            502
        );
        assert_eq!(SyncError::unhandled("boom").code(), 500);
    }

    #[test]
    fn test_stage_names_failed_step() {
        let err = SyncError::TableCreateFailed {
            table: "sales.orders".into(),
            message: "denied".into(),
        };
        assert_eq!(err.stage(), "create_table");
        assert_eq!(err.label(), "TABLE_CREATE_FAILED");
        assert_eq!(err.message(), "denied");
    }

    #[test]
    fn test_only_log_clear_is_non_fatal() {
        assert!(
            !SyncError::LogClearFailed {
                handle: "s".into(),
                message: "down".into()
            }
            .is_fatal()
        );
        assert!(SyncError::unhandled("boom").is_fatal());
    }
}

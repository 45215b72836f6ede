//! Error types returned across the catalog client boundary.
//!
//! Every catalog adapter (in-memory, REST, or an embedding service's own client)
//! reports failures through [`CatalogError`]. Callers distinguish the expected
//! "does not exist" answer from every other failure using the helper predicates.

use thiserror::Error;

/// Result type alias for catalog client operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors reported by a catalog client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// The requested database or table does not exist.
    #[error("{entity} not found: {name}")]
    NotFound {
        /// Kind of entity (`database` or `table`).
        entity: &'static str,
        /// Qualified name that was looked up.
        name: String,
    },

    /// A create call targeted an entity that already exists.
    #[error("{entity} already exists: {name}")]
    AlreadyExists {
        /// Kind of entity (`database` or `table`).
        entity: &'static str,
        /// Qualified name of the existing entity.
        name: String,
    },

    /// Network or service-side failure while talking to the catalog.
    #[error("transport error: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
        /// Whether repeating the same request may succeed.
        retryable: bool,
    },

    /// The caller is not authenticated or not permitted to perform the call.
    #[error("access denied: {message}")]
    AccessDenied {
        /// Description returned by the catalog.
        message: String,
    },

    /// The catalog rejected the request as invalid.
    #[error("request rejected: {message}")]
    Rejected {
        /// Description returned by the catalog.
        message: String,
    },

    /// A request or response body could not be encoded or decoded.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the encoding failure.
        message: String,
    },

    /// An internal invariant of the client was violated.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl CatalogError {
    /// Creates a not-found error for a database.
    #[must_use]
    pub fn database_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "database",
            name: name.into(),
        }
    }

    /// Creates a not-found error for a table.
    #[must_use]
    pub fn table_not_found(database: &str, table: &str) -> Self {
        Self::NotFound {
            entity: "table",
            name: format!("{database}.{table}"),
        }
    }

    /// Creates a retryable transport error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Returns true when the entity does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true when a create call hit an existing entity.
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }

    /// Returns true when the failure is a transient transport failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                retryable: true,
                ..
            }
        )
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_predicates() {
        let err = CatalogError::table_not_found("sales", "orders");
        assert!(err.is_not_found());
        assert!(!err.is_already_exists());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "table not found: sales.orders");
    }

    #[test]
    fn test_only_retryable_transport_is_retryable() {
        assert!(CatalogError::transient("connection reset").is_retryable());
        assert!(
            !CatalogError::Transport {
                message: "bad certificate".into(),
                retryable: false,
            }
            .is_retryable()
        );
        assert!(
            !CatalogError::Rejected {
                message: "invalid column".into()
            }
            .is_retryable()
        );
    }
}

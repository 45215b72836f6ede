//! Change-log acknowledgment after a committed catalog write.
//!
//! Clearing is best-effort. It runs only after the catalog accepted the
//! write; a failed clear leaves the change pending, which at worst triggers
//! one more idempotent reconciliation.
//!
//! The default acknowledger replaces a temporary marker table that selects
//! from the change log with an always-false predicate. Consuming the change
//! log in a statement advances its offset without retaining any rows.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use thiserror::Error;

/// Default suffix appended to a handle to name its marker table.
pub const DEFAULT_MARKER_SUFFIX: &str = "_CONSUMED";

const MAX_HANDLE_PARTS: usize = 3;

/// Errors raised while clearing a change log.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChangeLogError {
    /// The handle is not a valid, optionally qualified identifier.
    #[error("invalid change log handle {handle:?}: {message}")]
    InvalidHandle {
        /// Handle as supplied.
        handle: String,
        /// What was wrong with it.
        message: String,
    },

    /// The statement could not be executed.
    #[error("change log statement failed: {message}")]
    Execution {
        /// Underlying error text.
        message: String,
    },
}

/// A validated change-log identifier such as `db.schema."Orders_Stream"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeLogHandle {
    parts: Vec<String>,
}

impl ChangeLogHandle {
    /// Parses a dot-qualified identifier with up to three parts.
    ///
    /// Each part is either a bare identifier (`[A-Za-z_][A-Za-z0-9_$]*`) or a
    /// double-quoted one without embedded quotes or dots.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeLogError::InvalidHandle`] for anything else.
    pub fn parse(handle: &str) -> Result<Self, ChangeLogError> {
        let invalid = |message: &str| ChangeLogError::InvalidHandle {
            handle: handle.to_string(),
            message: message.to_string(),
        };

        let parts: Vec<String> = handle.trim().split('.').map(str::to_string).collect();
        if parts.len() > MAX_HANDLE_PARTS {
            return Err(invalid("too many qualifiers"));
        }
        for part in &parts {
            if !is_valid_part(part) {
                return Err(invalid("not an identifier"));
            }
        }
        Ok(Self { parts })
    }

    /// Renders the marker table name: the handle with `suffix` appended to
    /// its last part, inside the quotes when that part is quoted.
    #[must_use]
    pub fn with_suffix(&self, suffix: &str) -> String {
        let mut parts = self.parts.clone();
        if let Some(last) = parts.last_mut() {
            *last = match last.strip_suffix('"') {
                Some(unterminated) => format!("{unterminated}{suffix}\""),
                None => format!("{last}{suffix}"),
            };
        }
        parts.join(".")
    }
}

impl fmt::Display for ChangeLogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.parts.join("."))
    }
}

fn is_valid_part(part: &str) -> bool {
    if let Some(inner) = part.strip_prefix('"').and_then(|p| p.strip_suffix('"')) {
        return !inner.is_empty() && !inner.contains('"');
    }
    let mut chars = part.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Renders the statement that consumes pending change-log entries.
#[must_use]
pub fn marker_statement(handle: &ChangeLogHandle, suffix: &str) -> String {
    format!(
        "CREATE OR REPLACE TEMPORARY TABLE {} AS SELECT * FROM {handle} WHERE FALSE",
        handle.with_suffix(suffix)
    )
}

/// Marks pending change-log entries as consumed.
#[async_trait]
pub trait ChangeLogAcknowledger: Send + Sync {
    /// Clears the change log named by `handle`. Acknowledgers that leave a
    /// marker behind name it with `marker_suffix`.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeLogError`] when the log could not be cleared.
    async fn clear(&self, handle: &ChangeLogHandle, marker_suffix: &str)
    -> Result<(), ChangeLogError>;
}

/// Runs one SQL statement against the source system.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Executes `statement`.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeLogError::Execution`] on failure.
    async fn execute(&self, statement: &str) -> Result<(), ChangeLogError>;
}

/// Acknowledges by executing [`marker_statement`] through an executor.
#[derive(Debug, Clone)]
pub struct StatementAcknowledger<E> {
    executor: E,
}

impl<E: StatementExecutor> StatementAcknowledger<E> {
    /// Creates an acknowledger around `executor`.
    #[must_use]
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Returns the executor.
    #[must_use]
    pub fn executor(&self) -> &E {
        &self.executor
    }
}

#[async_trait]
impl<E: StatementExecutor> ChangeLogAcknowledger for StatementAcknowledger<E> {
    async fn clear(
        &self,
        handle: &ChangeLogHandle,
        marker_suffix: &str,
    ) -> Result<(), ChangeLogError> {
        let statement = marker_statement(handle, marker_suffix);
        tracing::debug!(handle = %handle, marker_suffix, "Clearing change log");
        self.executor.execute(&statement).await
    }
}

/// Acknowledger for deployments without a change log.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAcknowledger;

#[async_trait]
impl ChangeLogAcknowledger for NoopAcknowledger {
    async fn clear(
        &self,
        _handle: &ChangeLogHandle,
        _marker_suffix: &str,
    ) -> Result<(), ChangeLogError> {
        Ok(())
    }
}

#[derive(Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
}

/// Posts statements as `{"statement": "..."}` to an SQL-over-HTTP endpoint.
///
/// Any non-2xx answer is an execution failure. No retries: clearing is
/// best-effort and re-runs on the next trigger.
pub struct RestStatementExecutor {
    http: Client,
    endpoint: Url,
    token: Option<String>,
}

impl fmt::Debug for RestStatementExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestStatementExecutor")
            .field("endpoint", &self.endpoint.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl RestStatementExecutor {
    /// Creates an executor for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`ChangeLogError::Execution`] if the endpoint is not a URL or
    /// the HTTP client cannot be built.
    pub fn new(
        endpoint: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ChangeLogError> {
        let endpoint = Url::parse(endpoint).map_err(|e| ChangeLogError::Execution {
            message: format!("invalid statement endpoint {endpoint:?}: {e}"),
        })?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChangeLogError::Execution {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            http,
            endpoint,
            token,
        })
    }
}

#[async_trait]
impl StatementExecutor for RestStatementExecutor {
    async fn execute(&self, statement: &str) -> Result<(), ChangeLogError> {
        let mut request = self
            .http
            .post(self.endpoint.clone())
            .json(&StatementRequest { statement });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| ChangeLogError::Execution {
            message: e.to_string(),
        })?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ChangeLogError::Execution {
            message: format!("statement endpoint returned {status}: {body}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct CapturingExecutor {
        statements: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl StatementExecutor for CapturingExecutor {
        async fn execute(&self, statement: &str) -> Result<(), ChangeLogError> {
            self.statements
                .lock()
                .expect("lock")
                .push(statement.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_parse_accepts_qualified_and_quoted_handles() {
        for handle in ["orders_stream", "db.raw.orders_stream", "db.\"Raw Zone\".\"Orders\""] {
            let parsed = ChangeLogHandle::parse(handle).expect(handle);
            assert_eq!(parsed.to_string(), handle);
        }
    }

    #[test]
    fn test_parse_rejects_injection_and_junk() {
        for handle in [
            "",
            "orders; drop table x",
            "a.b.c.d",
            "1stream",
            "db..stream",
            "\"\"",
            "\"a\"b\"",
        ] {
            assert!(
                matches!(
                    ChangeLogHandle::parse(handle),
                    Err(ChangeLogError::InvalidHandle { .. })
                ),
                "{handle:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_marker_statement() {
        let handle = ChangeLogHandle::parse("raw.orders_stream").expect("handle");
        assert_eq!(
            marker_statement(&handle, DEFAULT_MARKER_SUFFIX),
            "CREATE OR REPLACE TEMPORARY TABLE raw.orders_stream_CONSUMED AS SELECT * FROM raw.orders_stream WHERE FALSE"
        );
    }

    #[test]
    fn test_suffix_goes_inside_quotes() {
        let handle = ChangeLogHandle::parse("raw.\"Orders\"").expect("handle");
        assert_eq!(handle.with_suffix("_CONSUMED"), "raw.\"Orders_CONSUMED\"");
    }

    #[tokio::test]
    async fn test_statement_acknowledger_delegates() {
        let acknowledger = StatementAcknowledger::new(CapturingExecutor::default());
        let handle = ChangeLogHandle::parse("orders_stream").expect("handle");
        acknowledger.clear(&handle, "_ACK").await.expect("clear");

        let statements = acknowledger.executor().statements.lock().expect("lock");
        assert_eq!(statements.len(), 1);
        assert!(statements[0].starts_with("CREATE OR REPLACE TEMPORARY TABLE orders_stream_ACK"));
    }

    #[tokio::test]
    async fn test_noop_acknowledger() {
        let handle = ChangeLogHandle::parse("s").expect("handle");
        NoopAcknowledger
            .clear(&handle, DEFAULT_MARKER_SUFFIX)
            .await
            .expect("noop");
    }

    #[test]
    fn test_rest_executor_redacts_token() {
        let executor = RestStatementExecutor::new(
            "http://warehouse.local/api/statements",
            Some("secret-token".into()),
            Duration::from_secs(5),
        )
        .expect("executor");
        let rendered = format!("{executor:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("secret-token"));
    }
}

//! Reconciliation results and their result-message rendering.
//!
//! A [`ReconcileReport`] renders as `"<code> <LABEL> <db>.<table>: <detail>"`.
//! Callers branch on the leading numeric code; 2xx means the catalog write
//! committed.

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use tablesync_core::TableIdent;

use crate::error::SyncError;
use crate::schema::SchemaWarning;
use crate::stage::ReconcileStage;

/// Which catalog write a successful call performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// The table was absent and was created.
    Created,
    /// The table existed and its record was replaced.
    Updated,
}

/// Final result of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The catalog write committed.
    Committed {
        /// Create or update.
        action: Action,
        /// Number of columns written.
        columns: usize,
        /// Non-fatal failure to clear the change log.
        log_clear_error: Option<SyncError>,
    },
    /// A fatal step failed; nothing after it ran.
    Failed(SyncError),
}

/// Structured result of [`crate::Reconciler::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Target table.
    pub ident: TableIdent,
    /// Snapshot pointer supplied by the caller.
    pub metadata_location: String,
    /// Last state the orchestrator reached.
    pub stage: ReconcileStage,
    /// What happened.
    pub outcome: Outcome,
    /// Tolerated schema problems.
    pub warnings: Vec<SchemaWarning>,
}

impl ReconcileReport {
    /// Stable numeric result code.
    #[must_use]
    pub fn code(&self) -> u16 {
        match &self.outcome {
            Outcome::Committed {
                log_clear_error: Some(_),
                ..
            } => 207,
            Outcome::Committed {
                action: Action::Created,
                ..
            } => 201,
            Outcome::Committed {
                action: Action::Updated,
                ..
            } => 200,
            Outcome::Failed(err) => err.code(),
        }
    }

    /// Stable result label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match &self.outcome {
            Outcome::Committed {
                action,
                log_clear_error,
                ..
            } => match (action, log_clear_error.is_some()) {
                (Action::Created, false) => "CREATED",
                (Action::Updated, false) => "UPDATED",
                (Action::Created, true) => "CREATED_LOG_NOT_CLEARED",
                (Action::Updated, true) => "UPDATED_LOG_NOT_CLEARED",
            },
            Outcome::Failed(err) => err.label(),
        }
    }

    /// Returns true when the catalog write committed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code())
    }

    /// The fatal error, if the call failed.
    #[must_use]
    pub fn error(&self) -> Option<&SyncError> {
        match &self.outcome {
            Outcome::Failed(err) => Some(err),
            Outcome::Committed { .. } => None,
        }
    }

    /// Outcome category used as a metrics label.
    #[must_use]
    pub fn outcome_label(&self) -> &'static str {
        match &self.outcome {
            Outcome::Committed {
                action: Action::Created,
                ..
            } => "created",
            Outcome::Committed {
                action: Action::Updated,
                ..
            } => "updated",
            Outcome::Failed(_) => "failed",
        }
    }

    fn detail(&self) -> String {
        match &self.outcome {
            Outcome::Committed {
                action,
                columns,
                log_clear_error,
            } => {
                let verb = match action {
                    Action::Created => "created",
                    Action::Updated => "updated",
                };
                let mut detail = format!(
                    "{verb} with {columns} column(s) at {}",
                    self.metadata_location
                );
                if !self.warnings.is_empty() {
                    detail.push_str(&format!("; {} schema warning(s)", self.warnings.len()));
                }
                if let Some(err) = log_clear_error {
                    detail.push_str(&format!("; change log not cleared: {err}"));
                }
                detail
            }
            Outcome::Failed(err) => format!("failed at {}: {err}", err.stage()),
        }
    }
}

impl fmt::Display for ReconcileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}: {}",
            self.code(),
            self.label(),
            self.ident,
            self.detail()
        )
    }
}

impl Serialize for ReconcileReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ReconcileReport", 8)?;
        state.serialize_field("code", &self.code())?;
        state.serialize_field("label", self.label())?;
        state.serialize_field("database", &self.ident.database)?;
        state.serialize_field("table", &self.ident.table)?;
        state.serialize_field("stage", &self.stage)?;
        state.serialize_field("metadata_location", &self.metadata_location)?;
        state.serialize_field("message", &self.to_string())?;
        state.serialize_field("warnings", &self.warnings)?;
        state.end()
    }
}

//! Orchestrator states.

use std::fmt;

use serde::Serialize;

/// State of one reconciliation call.
///
/// `Start -> DbChecked -> TableChecked -> {Creating | Updating} -> Done`, with
/// `Error` reachable from every step and absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconcileStage {
    /// Nothing checked yet.
    Start,
    /// The database exists, possibly because it was just created.
    DbChecked,
    /// Table presence is known.
    TableChecked,
    /// Creating an absent table.
    Creating,
    /// Updating a present table.
    Updating,
    /// The catalog write committed.
    Done,
    /// A step failed.
    Error,
}

impl ReconcileStage {
    /// Returns whether `next` is a legal successor of `self`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Start, Self::DbChecked)
                | (Self::DbChecked, Self::TableChecked)
                | (Self::TableChecked, Self::Creating | Self::Updating)
                | (Self::Creating | Self::Updating, Self::Done)
                | (
                    Self::Start
                        | Self::DbChecked
                        | Self::TableChecked
                        | Self::Creating
                        | Self::Updating,
                    Self::Error
                )
        )
    }

    /// Returns whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Upper-case name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::DbChecked => "DB_CHECKED",
            Self::TableChecked => "TABLE_CHECKED",
            Self::Creating => "CREATING",
            Self::Updating => "UPDATING",
            Self::Done => "DONE",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for ReconcileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::ReconcileStage::*;

    #[test]
    fn test_happy_paths_are_legal() {
        for path in [
            [Start, DbChecked, TableChecked, Creating, Done],
            [Start, DbChecked, TableChecked, Updating, Done],
        ] {
            for pair in path.windows(2) {
                assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn test_error_is_absorbing() {
        assert!(Error.is_terminal());
        for next in [Start, DbChecked, TableChecked, Creating, Updating, Done, Error] {
            assert!(!Error.can_transition_to(next));
        }
        assert!(!Done.can_transition_to(Error));
    }

    #[test]
    fn test_no_skipping() {
        assert!(!Start.can_transition_to(TableChecked));
        assert!(!DbChecked.can_transition_to(Creating));
        assert!(!Creating.can_transition_to(Updating));
    }
}

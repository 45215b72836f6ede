//! Non-fatal findings raised while parsing and mapping a column list.

use std::fmt;

use serde::Serialize;

/// A problem in the source DDL that was tolerated rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaWarning {
    /// A fragment of the column list was not a column definition.
    SkippedFragment {
        /// The fragment as it appeared after normalization.
        fragment: String,
        /// Why it was skipped.
        reason: &'static str,
    },
    /// A source type had no catalog equivalent and was mapped to `string`.
    UnknownType {
        /// Column name.
        column: String,
        /// Source type expression.
        source_type: String,
    },
    /// A decimal declared `scale > precision` and was mapped to `string`.
    InvalidDecimal {
        /// Column name.
        column: String,
        /// Source type expression.
        source_type: String,
    },
    /// A column name appeared more than once; every occurrence is kept.
    DuplicateColumn {
        /// Column name.
        column: String,
    },
}

impl SchemaWarning {
    /// Stable label used as a metrics dimension.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SkippedFragment { .. } => "skipped_fragment",
            Self::UnknownType { .. } => "unknown_type",
            Self::InvalidDecimal { .. } => "invalid_decimal",
            Self::DuplicateColumn { .. } => "duplicate_column",
        }
    }
}

impl fmt::Display for SchemaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SkippedFragment { fragment, reason } => {
                write!(f, "skipped fragment {fragment:?}: {reason}")
            }
            Self::UnknownType {
                column,
                source_type,
            } => write!(
                f,
                "column {column}: unknown type {source_type:?} mapped to string"
            ),
            Self::InvalidDecimal {
                column,
                source_type,
            } => write!(
                f,
                "column {column}: decimal {source_type:?} has scale above precision, mapped to string"
            ),
            Self::DuplicateColumn { column } => write!(f, "column {column} is declared more than once"),
        }
    }
}

//! DDL column-list parsing and catalog type mapping.
//!
//! [`parse_schema`] is the entry point: it extracts the column list, splits it
//! on top-level commas, maps every type and collects the non-fatal
//! [`SchemaWarning`]s found along the way.

pub mod ddl;
pub mod types;
pub mod warnings;

use std::collections::BTreeSet;

use tablesync_core::ColumnDef;

use crate::error::{SyncError, SyncResult};
pub use ddl::{FragmentSkip, RawColumn, extract_column_list, parse_fragment, split_top_level};
pub use types::{TypeMapping, map_type};
pub use warnings::SchemaWarning;

/// Columns parsed from a DDL string, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedSchema {
    /// Catalog columns, one per accepted fragment.
    pub columns: Vec<ColumnDef>,
    /// Tolerated problems.
    pub warnings: Vec<SchemaWarning>,
}

/// Parses DDL text into catalog columns.
///
/// Unknown types become `string` and duplicate names are passed through; both
/// are reported as warnings rather than errors.
///
/// # Errors
///
/// Returns [`SyncError::MalformedDdl`] when no column list can be extracted
/// or it holds no column definitions.
pub fn parse_schema(ddl: &str) -> SyncResult<ParsedSchema> {
    let list = extract_column_list(ddl)?;
    let mut parsed = ParsedSchema::default();
    let mut seen = BTreeSet::new();

    for fragment in split_top_level(&list) {
        let raw = match parse_fragment(&fragment) {
            Ok(raw) => raw,
            Err(skip) => {
                parsed.warnings.push(SchemaWarning::SkippedFragment {
                    fragment,
                    reason: skip.reason(),
                });
                continue;
            }
        };

        let mapping = map_type(&raw.type_expr);
        match mapping {
            TypeMapping::Exact(_) => {}
            TypeMapping::Unknown => parsed.warnings.push(SchemaWarning::UnknownType {
                column: raw.name.clone(),
                source_type: raw.type_expr.clone(),
            }),
            TypeMapping::InvalidDecimal { .. } => {
                parsed.warnings.push(SchemaWarning::InvalidDecimal {
                    column: raw.name.clone(),
                    source_type: raw.type_expr.clone(),
                });
            }
        }

        if !seen.insert(raw.name.clone()) {
            parsed.warnings.push(SchemaWarning::DuplicateColumn {
                column: raw.name.clone(),
            });
        }
        parsed.columns.push(ColumnDef::new(raw.name, mapping.token()));
    }

    if parsed.columns.is_empty() {
        return Err(SyncError::malformed_ddl("no column definitions"));
    }
    Ok(parsed)
}

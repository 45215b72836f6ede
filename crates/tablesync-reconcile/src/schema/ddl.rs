//! Column-list extraction and splitting for DDL-shaped text.
//!
//! Only the shape `<anything> ( <col> <type>, ... ) <anything>` is supported.
//! The column list runs from the first `(` to its matching `)`, so trailing
//! clauses such as `cluster by (a)` are ignored.

use crate::error::{SyncError, SyncResult};

const CONSTRAINT_KEYWORDS: &[&str] = &["constraint", "unique"];
const CONSTRAINT_PHRASES: &[&str] = &["primary key", "foreign key"];

/// One column definition split from the column list, before type mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawColumn {
    /// Unquoted, lower-cased column name.
    pub name: String,
    /// Lower-cased leading type expression with whitespace removed inside parentheses.
    pub type_expr: String,
}

/// Why a fragment was not turned into a [`RawColumn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentSkip {
    /// Nothing between two commas.
    Empty,
    /// A name with no type after it.
    MissingType,
    /// A table-level constraint clause.
    Constraint,
}

impl FragmentSkip {
    /// Human-readable reason.
    #[must_use]
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Empty => "empty fragment",
            Self::MissingType => "missing column type",
            Self::Constraint => "table constraint",
        }
    }
}

/// Extracts the normalized column list from DDL text.
///
/// Whitespace runs collapse to one space and commas are rendered as `", "`.
///
/// # Errors
///
/// Returns [`SyncError::MalformedDdl`] when there is no `(`, a `)` appears
/// before the first `(`, the parentheses are unbalanced, or the list is empty.
pub fn extract_column_list(ddl: &str) -> SyncResult<String> {
    let open = ddl
        .find('(')
        .ok_or_else(|| SyncError::malformed_ddl("no opening parenthesis"))?;
    if ddl[..open].contains(')') {
        return Err(SyncError::malformed_ddl(
            "closing parenthesis precedes the column list",
        ));
    }

    let mut depth = 0usize;
    let mut close = None;
    for (offset, ch) in ddl[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(open + offset);
                    break;
                }
            }
            _ => {}
        }
    }
    let close = close.ok_or_else(|| SyncError::malformed_ddl("unbalanced parentheses"))?;

    let normalized = normalize(&ddl[open + 1..close]);
    if normalized.is_empty() {
        return Err(SyncError::malformed_ddl("empty column list"));
    }
    Ok(normalized)
}

fn normalize(list: &str) -> String {
    let collapsed = list.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .split(',')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(", ")
        .trim()
        .to_string()
}

/// Splits a column list on commas at parenthesis depth zero.
///
/// `amount decimal(10, 2)` stays one fragment. Fragments are trimmed; empty
/// fragments are kept so the caller can report them.
#[must_use]
pub fn split_top_level(list: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for ch in list.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                fragments.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fragments.push(current.trim().to_string());
    fragments
}

/// Splits one fragment into a column name and its type expression.
///
/// # Errors
///
/// Returns the [`FragmentSkip`] reason when the fragment is not a column
/// definition.
pub fn parse_fragment(fragment: &str) -> Result<RawColumn, FragmentSkip> {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        return Err(FragmentSkip::Empty);
    }
    if is_constraint(&fragment.to_ascii_lowercase()) {
        return Err(FragmentSkip::Constraint);
    }

    let (name, remainder) = split_name(fragment);
    let name = name.trim_matches('"').to_lowercase();
    let remainder = remainder.trim();
    if name.is_empty() || remainder.is_empty() {
        return Err(FragmentSkip::MissingType);
    }

    Ok(RawColumn {
        name,
        type_expr: leading_type_expr(remainder),
    })
}

fn is_constraint(lowered: &str) -> bool {
    let first_word = lowered
        .split(|c: char| c == ' ' || c == '(')
        .next()
        .unwrap_or_default();
    CONSTRAINT_KEYWORDS.contains(&first_word)
        || CONSTRAINT_PHRASES
            .iter()
            .any(|phrase| lowered.starts_with(phrase))
}

fn split_name(fragment: &str) -> (&str, &str) {
    if let Some(rest) = fragment.strip_prefix('"') {
        if let Some(end) = rest.find('"') {
            return (&fragment[..end + 2], &rest[end + 1..]);
        }
    }
    fragment.split_once(' ').unwrap_or((fragment, ""))
}

/// Text up to the first depth-zero space, lower-cased, with whitespace
/// inside parentheses dropped: `NUMBER(10, 2) NOT NULL` becomes `number(10,2)`.
fn leading_type_expr(remainder: &str) -> String {
    let mut expr = String::new();
    let mut depth = 0usize;
    for ch in remainder.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c.is_whitespace() && depth == 0 => break,
            c if c.is_whitespace() => continue,
            _ => {}
        }
        expr.push(ch.to_ascii_lowercase());
    }
    expr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_between_first_paren_and_its_match() {
        let list = extract_column_list(
            "create or replace table t (id int, amt decimal(10,2)) cluster by (id)",
        )
        .expect("column list");
        assert_eq!(list, "id int, amt decimal(10, 2)");
    }

    #[test]
    fn test_collapses_whitespace_and_newlines() {
        let list = extract_column_list("CREATE TABLE t (\n\tid   INT ,\n  name\tSTRING\n)")
            .expect("column list");
        assert_eq!(list, "id INT, name STRING");
    }

    #[test]
    fn test_missing_parentheses_is_malformed() {
        let err = extract_column_list("create table t id int").expect_err("no parens");
        assert!(matches!(err, SyncError::MalformedDdl { .. }));
    }

    #[test]
    fn test_close_before_open_is_malformed() {
        let err = extract_column_list("create table t ) id int (").expect_err("reversed");
        assert!(matches!(err, SyncError::MalformedDdl { .. }));
    }

    #[test]
    fn test_unbalanced_is_malformed() {
        let err = extract_column_list("create table t (id decimal(10,2)").expect_err("unbalanced");
        assert!(matches!(err, SyncError::MalformedDdl { .. }));
    }

    #[test]
    fn test_empty_list_is_malformed() {
        let err = extract_column_list("create table t (   )").expect_err("empty");
        assert_eq!(err.message(), "empty column list");
    }

    #[test]
    fn test_decimal_comma_is_not_a_separator() {
        let fragments = split_top_level("id int, amount decimal(10, 2), name string");
        assert_eq!(
            fragments,
            vec!["id int", "amount decimal(10, 2)", "name string"]
        );
    }

    #[test]
    fn test_parse_fragment_strips_quotes_and_lowercases() {
        let column = parse_fragment("\"Order Id\" NUMBER(10, 2) NOT NULL").expect("column");
        assert_eq!(column.name, "order id");
        assert_eq!(column.type_expr, "number(10,2)");
    }

    #[test]
    fn test_parse_fragment_skips() {
        assert_eq!(parse_fragment("  "), Err(FragmentSkip::Empty));
        assert_eq!(parse_fragment("lonely"), Err(FragmentSkip::MissingType));
        assert_eq!(
            parse_fragment("PRIMARY KEY (id)"),
            Err(FragmentSkip::Constraint)
        );
        assert_eq!(
            parse_fragment("constraint pk_t primary key (id)"),
            Err(FragmentSkip::Constraint)
        );
        assert_eq!(parse_fragment("unique (a, b)"), Err(FragmentSkip::Constraint));
    }

    #[test]
    fn test_column_named_like_a_keyword_is_kept() {
        let column = parse_fragment("unique_visitors int").expect("column");
        assert_eq!(column.name, "unique_visitors");
        assert_eq!(column.type_expr, "int");
    }
}

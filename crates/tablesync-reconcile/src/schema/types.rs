//! Source type expression to catalog [`TypeToken`] mapping.
//!
//! Rules apply in priority order:
//!
//! 1. `number(p,s)`, `decimal(p,s)` and `numeric(p,s)` keep precision and scale
//! 2. anything starting with `timestamp` collapses to `timestamp`
//! 3. a fixed alias table keyed on the base type name
//! 4. everything else becomes `string`
//!
//! Bare `number` maps to `double` rather than `int`. Timezone and sub-second
//! precision are discarded on timestamps.

use tablesync_core::TypeToken;

const DECIMAL_FAMILY: &[&str] = &["number", "decimal", "numeric"];

const ALIASES: &[(&str, TypeToken)] = &[
    ("number", TypeToken::Double),
    ("int", TypeToken::Int),
    ("integer", TypeToken::Int),
    ("string", TypeToken::String),
    ("varchar", TypeToken::String),
    ("text", TypeToken::String),
    ("float", TypeToken::Double),
    ("double", TypeToken::Double),
    ("boolean", TypeToken::Boolean),
    ("date", TypeToken::Date),
];

/// Result of mapping one source type expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeMapping {
    /// The source type has a catalog equivalent.
    Exact(TypeToken),
    /// The source type is not recognized; the column becomes `string`.
    Unknown,
    /// A decimal with `scale > precision`; the column becomes `string`.
    InvalidDecimal {
        /// Declared precision.
        precision: u32,
        /// Declared scale.
        scale: u32,
    },
}

impl TypeMapping {
    /// Catalog type the column is written with.
    #[must_use]
    pub const fn token(&self) -> TypeToken {
        match self {
            Self::Exact(token) => *token,
            Self::Unknown | Self::InvalidDecimal { .. } => TypeToken::String,
        }
    }

    /// Returns true when the mapping fell back to `string`.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        !matches!(self, Self::Exact(_))
    }
}

/// Maps a source type expression to a catalog type.
///
/// Matching is case-insensitive and ignores surrounding whitespace. This is a
/// pure function: the same input always yields the same mapping.
///
/// Outside the two-argument decimal form, aliases match on the base name
/// before any parenthesized arguments, and the arguments are dropped:
/// `varchar(255)` is `string` and `number(38)` is `double`.
#[must_use]
pub fn map_type(source: &str) -> TypeMapping {
    let normalized = source.trim().to_ascii_lowercase();

    if let Some((precision, scale)) = parse_decimal(&normalized) {
        return TypeToken::decimal(precision, scale)
            .map_or(TypeMapping::InvalidDecimal { precision, scale }, TypeMapping::Exact);
    }

    if normalized.starts_with("timestamp") {
        return TypeMapping::Exact(TypeToken::Timestamp);
    }

    let base = normalized
        .split_once('(')
        .map_or(normalized.as_str(), |(base, _)| base)
        .trim_end();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == base)
        .map_or(TypeMapping::Unknown, |(_, token)| TypeMapping::Exact(*token))
}

/// Parses `<family>(<digits>,<digits>)` with nothing else around it.
fn parse_decimal(normalized: &str) -> Option<(u32, u32)> {
    let (family, rest) = normalized.split_once('(')?;
    if !DECIMAL_FAMILY.contains(&family) {
        return None;
    }
    let (precision, scale) = rest.strip_suffix(')')?.split_once(',')?;
    Some((parse_digits(precision)?, parse_digits(scale)?))
}

fn parse_digits(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exact(source: &str) -> TypeToken {
        match map_type(source) {
            TypeMapping::Exact(token) => token,
            other => panic!("expected exact mapping for {source:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_decimal_family_preserves_precision() {
        assert_eq!(
            exact("decimal(10,2)"),
            TypeToken::Decimal {
                precision: 10,
                scale: 2
            }
        );
        assert_eq!(
            exact("NUMBER(38,0)"),
            TypeToken::Decimal {
                precision: 38,
                scale: 0
            }
        );
        assert_eq!(
            exact("numeric(5,5)"),
            TypeToken::Decimal {
                precision: 5,
                scale: 5
            }
        );
    }

    #[test]
    fn test_decimal_with_scale_above_precision_falls_back() {
        let mapping = map_type("decimal(2,5)");
        assert_eq!(
            mapping,
            TypeMapping::InvalidDecimal {
                precision: 2,
                scale: 5
            }
        );
        assert_eq!(mapping.token(), TypeToken::String);
        assert!(mapping.is_fallback());
    }

    #[test]
    fn test_timestamp_family_collapses() {
        for source in ["timestamp", "timestamp_ntz", "timestamp_tz(9)", "TIMESTAMP_LTZ"] {
            assert_eq!(exact(source), TypeToken::Timestamp, "{source}");
        }
    }

    #[test]
    fn test_bare_number_is_double() {
        assert_eq!(exact("number"), TypeToken::Double);
    }

    #[test]
    fn test_parameterized_aliases_map_by_base_name() {
        assert_eq!(exact("number(38)"), TypeToken::Double);
        assert_eq!(exact("varchar(255)"), TypeToken::String);
        assert_eq!(exact("varchar (16777216)"), TypeToken::String);
        assert_eq!(exact("int(11)"), TypeToken::Int);
        assert_eq!(exact("float(53)"), TypeToken::Double);
        assert_eq!(map_type("geography(point)"), TypeMapping::Unknown);
    }

    #[test]
    fn test_aliases() {
        assert_eq!(exact("integer"), TypeToken::Int);
        assert_eq!(exact("INT"), TypeToken::Int);
        assert_eq!(exact("text"), TypeToken::String);
        assert_eq!(exact("float"), TypeToken::Double);
        assert_eq!(exact("boolean"), TypeToken::Boolean);
        assert_eq!(exact("date"), TypeToken::Date);
    }

    #[test]
    fn test_semi_structured_and_geo_types_are_unknown() {
        for source in ["geography", "geometry", "variant", "object", "array", ""] {
            let mapping = map_type(source);
            assert_eq!(mapping, TypeMapping::Unknown, "{source}");
            assert_eq!(mapping.token(), TypeToken::String);
        }
    }

    #[test]
    fn test_malformed_decimal_arguments_do_not_match_decimal_rule() {
        assert_eq!(map_type("decimal(10)"), TypeMapping::Unknown);
        assert_eq!(map_type("decimal(a,b)"), TypeMapping::Unknown);
        assert_eq!(map_type("decimal(10,2) extra"), TypeMapping::Unknown);
    }
}

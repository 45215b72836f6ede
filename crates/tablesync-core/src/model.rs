//! Catalog data model.
//!
//! These types describe what the external catalog stores for a table: a storage
//! location, an ordered column list in the catalog's own type vocabulary, and a
//! small string parameter map that carries the snapshot pointer.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Parameter key holding the current snapshot pointer.
pub const METADATA_LOCATION_KEY: &str = "metadata_location";

/// Parameter key holding the snapshot pointer that preceded the current one.
pub const PREVIOUS_METADATA_LOCATION_KEY: &str = "previous_metadata_location";

/// Parameter key naming the table format.
pub const TABLE_TYPE_KEY: &str = "table_type";

/// Table format advertised in the `table_type` parameter.
pub const ICEBERG_TABLE_TYPE: &str = "ICEBERG";

/// Catalog-level table kind for tables whose data lives outside the catalog.
pub const EXTERNAL_TABLE_KIND: &str = "EXTERNAL_TABLE";

/// Identifies one table in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableIdent {
    /// Database (namespace) that owns the table.
    pub database: String,
    /// Table name within the database.
    pub table: String,
}

impl TableIdent {
    /// Creates a new table identifier.
    #[must_use]
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.table)
    }
}

/// A column type in the catalog's vocabulary.
///
/// Serialized as its canonical string form (`int`, `decimal(10,2)`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TypeToken {
    /// 32-bit signed integer.
    Int,
    /// Variable-length character data.
    String,
    /// 64-bit floating point.
    Double,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// Timestamp without timezone or sub-second precision information.
    Timestamp,
    /// Fixed-point decimal with `precision >= scale`.
    Decimal {
        /// Total number of digits.
        precision: u32,
        /// Digits after the decimal point.
        scale: u32,
    },
}

impl TypeToken {
    /// Creates a decimal type, returning `None` when `scale > precision`.
    #[must_use]
    pub const fn decimal(precision: u32, scale: u32) -> Option<Self> {
        if scale > precision {
            None
        } else {
            Some(Self::Decimal { precision, scale })
        }
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => f.write_str("int"),
            Self::String => f.write_str("string"),
            Self::Double => f.write_str("double"),
            Self::Boolean => f.write_str("boolean"),
            Self::Date => f.write_str("date"),
            Self::Timestamp => f.write_str("timestamp"),
            Self::Decimal { precision, scale } => write!(f, "decimal({precision},{scale})"),
        }
    }
}

/// Error returned when a string is not a canonical [`TypeToken`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized catalog type: {0}")]
pub struct ParseTypeTokenError(pub String);

impl FromStr for TypeToken {
    type Err = ParseTypeTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int" => Ok(Self::Int),
            "string" => Ok(Self::String),
            "double" => Ok(Self::Double),
            "boolean" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            "timestamp" => Ok(Self::Timestamp),
            other => {
                let args = other
                    .strip_prefix("decimal(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .ok_or_else(|| ParseTypeTokenError(other.to_string()))?;
                let (precision, scale) = args
                    .split_once(',')
                    .ok_or_else(|| ParseTypeTokenError(other.to_string()))?;
                let precision = precision
                    .trim()
                    .parse()
                    .map_err(|_| ParseTypeTokenError(other.to_string()))?;
                let scale = scale
                    .trim()
                    .parse()
                    .map_err(|_| ParseTypeTokenError(other.to_string()))?;
                Self::decimal(precision, scale).ok_or_else(|| ParseTypeTokenError(other.to_string()))
            }
        }
    }
}

impl From<TypeToken> for String {
    fn from(token: TypeToken) -> Self {
        token.to_string()
    }
}

impl TryFrom<String> for TypeToken {
    type Error = ParseTypeTokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One column of a catalog table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Column type.
    #[serde(rename = "type")]
    pub data_type: TypeToken,
}

impl ColumnDef {
    /// Creates a new column definition.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: TypeToken) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// A catalog database. Only its existence matters to reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseRecord {
    /// Database name.
    pub name: String,
}

/// A table record as returned by the catalog.
///
/// `attributes` carries every other attribute the catalog returned (owner,
/// description, and catalog-managed fields such as creation time or version
/// identifiers) so an update can pass them back after stripping the ones the
/// write API refuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMetadataRecord {
    /// Table name.
    pub name: String,
    /// Physical root location of the table.
    pub storage_location: String,
    /// Ordered column list.
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    /// String parameters, including the snapshot pointer pair.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    /// Catalog-level table kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_type: Option<String>,
    /// Remaining catalog attributes.
    #[serde(default, flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl TableMetadataRecord {
    /// Returns the current snapshot pointer, if set.
    #[must_use]
    pub fn metadata_location(&self) -> Option<&str> {
        self.parameters.get(METADATA_LOCATION_KEY).map(String::as_str)
    }

    /// Returns the previous snapshot pointer, if set.
    #[must_use]
    pub fn previous_metadata_location(&self) -> Option<&str> {
        self.parameters
            .get(PREVIOUS_METADATA_LOCATION_KEY)
            .map(String::as_str)
    }
}

/// The writable form of a table record, sent on create and update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableInput {
    /// Table name.
    pub name: String,
    /// Physical root location of the table.
    pub storage_location: String,
    /// Ordered column list; replaces the stored list as a whole.
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    /// String parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    /// Catalog-level table kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_type: Option<String>,
    /// Additional writable attributes.
    #[serde(default, flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl TableInput {
    /// Returns the snapshot pointer carried by this input, if set.
    #[must_use]
    pub fn metadata_location(&self) -> Option<&str> {
        self.parameters.get(METADATA_LOCATION_KEY).map(String::as_str)
    }

    /// Converts the input into the record a catalog would store for it.
    #[must_use]
    pub fn into_record(self) -> TableMetadataRecord {
        TableMetadataRecord {
            name: self.name,
            storage_location: self.storage_location,
            columns: self.columns,
            parameters: self.parameters,
            table_type: self.table_type,
            attributes: self.attributes,
        }
    }
}

//! Builds the update payload from a fetched table record.
//!
//! The fetched record is never mutated. The builder copies it, swaps in the
//! new column list and snapshot pointer, shifts the old pointer into the audit
//! slot and drops the attributes the catalog refuses on writes.

use std::collections::BTreeMap;

use tablesync_core::{
    CATALOG_MANAGED_ATTRIBUTES, ColumnDef, METADATA_LOCATION_KEY, PREVIOUS_METADATA_LOCATION_KEY,
    TableInput, TableMetadataRecord,
};

/// Attributes stripped from a fetched record before it is written back.
pub const DEFAULT_READ_ONLY_ATTRIBUTES: &[&str] = CATALOG_MANAGED_ATTRIBUTES;

/// Immutable builder for a [`TableInput`] derived from the current record.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeMap;
///
/// use tablesync_core::{ColumnDef, TableMetadataRecord, TypeToken};
/// use tablesync_reconcile::update::TableInputBuilder;
///
/// let current = TableMetadataRecord {
///     name: "orders".into(),
///     storage_location: "s3://b/t/metadata/".into(),
///     columns: vec![ColumnDef::new("id", TypeToken::Double)],
///     parameters: BTreeMap::from([("metadata_location".into(), "s3://b/t/metadata/v1.json".into())]),
///     table_type: None,
///     attributes: BTreeMap::new(),
/// };
///
/// let input = TableInputBuilder::from_current(&current)
///     .metadata_location("s3://b/t/metadata/v2.json")
///     .build();
///
/// assert_eq!(input.parameters["previous_metadata_location"], "s3://b/t/metadata/v1.json");
/// assert_eq!(current.parameters.len(), 1);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct TableInputBuilder<'a> {
    current: &'a TableMetadataRecord,
    columns: Option<Vec<ColumnDef>>,
    metadata_location: Option<String>,
    strip: Vec<String>,
}

impl<'a> TableInputBuilder<'a> {
    /// Starts from the record currently stored in the catalog.
    pub fn from_current(current: &'a TableMetadataRecord) -> Self {
        Self {
            current,
            columns: None,
            metadata_location: None,
            strip: DEFAULT_READ_ONLY_ATTRIBUTES
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
        }
    }

    /// Replaces the whole column list.
    pub fn columns(mut self, columns: Vec<ColumnDef>) -> Self {
        self.columns = Some(columns);
        self
    }

    /// Sets the new snapshot pointer.
    pub fn metadata_location(mut self, pointer: impl Into<String>) -> Self {
        self.metadata_location = Some(pointer.into());
        self
    }

    /// Replaces the strip-list.
    pub fn strip<S: AsRef<str>>(mut self, attributes: &[S]) -> Self {
        self.strip = attributes.iter().map(|a| a.as_ref().to_string()).collect();
        self
    }

    /// Produces the write payload.
    ///
    /// `previous_metadata_location` takes the current pointer only when one
    /// exists and differs from the new pointer, so re-publishing the same
    /// pointer leaves the audit pair intact.
    pub fn build(self) -> TableInput {
        let current = self.current;
        let mut parameters: BTreeMap<String, String> = current.parameters.clone();

        if let Some(new_pointer) = self.metadata_location {
            if let Some(old_pointer) = current.metadata_location() {
                if old_pointer != new_pointer {
                    parameters.insert(
                        PREVIOUS_METADATA_LOCATION_KEY.to_string(),
                        old_pointer.to_string(),
                    );
                }
            }
            parameters.insert(METADATA_LOCATION_KEY.to_string(), new_pointer);
        }

        let attributes = current
            .attributes
            .iter()
            .filter(|(name, _)| !self.strip.iter().any(|s| s == *name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        TableInput {
            name: current.name.clone(),
            storage_location: current.storage_location.clone(),
            columns: self.columns.unwrap_or_else(|| current.columns.clone()),
            parameters,
            table_type: current.table_type.clone(),
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tablesync_core::TypeToken;

    use super::*;

    fn record(pointer: Option<&str>, previous: Option<&str>) -> TableMetadataRecord {
        let mut parameters = BTreeMap::from([("table_type".to_string(), "ICEBERG".to_string())]);
        if let Some(pointer) = pointer {
            parameters.insert(METADATA_LOCATION_KEY.into(), pointer.into());
        }
        if let Some(previous) = previous {
            parameters.insert(PREVIOUS_METADATA_LOCATION_KEY.into(), previous.into());
        }
        TableMetadataRecord {
            name: "orders".into(),
            storage_location: "s3://b/t/metadata/".into(),
            columns: vec![ColumnDef::new("id", TypeToken::Double)],
            parameters,
            table_type: Some("EXTERNAL_TABLE".into()),
            attributes: BTreeMap::from([
                ("CreateTime".to_string(), json!("2026-01-01T00:00:00Z")),
                ("VersionId".to_string(), json!("7")),
                ("Owner".to_string(), json!("etl")),
            ]),
        }
    }

    #[test]
    fn test_shifts_pointer_into_audit_slot() {
        let current = record(Some("v1"), None);
        let input = TableInputBuilder::from_current(&current)
            .metadata_location("v2")
            .build();
        assert_eq!(input.parameters[METADATA_LOCATION_KEY], "v2");
        assert_eq!(input.parameters[PREVIOUS_METADATA_LOCATION_KEY], "v1");
        assert_eq!(input.parameters["table_type"], "ICEBERG");
    }

    #[test]
    fn test_same_pointer_keeps_existing_audit_pair() {
        let current = record(Some("v2"), Some("v1"));
        let input = TableInputBuilder::from_current(&current)
            .metadata_location("v2")
            .build();
        assert_eq!(input.parameters[METADATA_LOCATION_KEY], "v2");
        assert_eq!(input.parameters[PREVIOUS_METADATA_LOCATION_KEY], "v1");
    }

    #[test]
    fn test_no_current_pointer_sets_no_previous() {
        let current = record(None, None);
        let input = TableInputBuilder::from_current(&current)
            .metadata_location("v1")
            .build();
        assert!(!input.parameters.contains_key(PREVIOUS_METADATA_LOCATION_KEY));
    }

    #[test]
    fn test_replaces_columns_and_strips_managed_attributes() {
        let current = record(Some("v1"), None);
        let columns = vec![
            ColumnDef::new("id", TypeToken::Double),
            ColumnDef::new(
                "amt",
                TypeToken::Decimal {
                    precision: 10,
                    scale: 2,
                },
            ),
        ];
        let input = TableInputBuilder::from_current(&current)
            .columns(columns.clone())
            .metadata_location("v2")
            .build();

        assert_eq!(input.columns, columns);
        assert_eq!(input.attributes.keys().collect::<Vec<_>>(), vec!["Owner"]);
        assert_eq!(input.table_type.as_deref(), Some("EXTERNAL_TABLE"));
        assert_eq!(current.columns.len(), 1, "fetched record is untouched");
    }

    #[test]
    fn test_custom_strip_list() {
        let current = record(Some("v1"), None);
        let input = TableInputBuilder::from_current(&current)
            .strip(&["Owner"])
            .build();
        let mut keys: Vec<_> = input.attributes.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["CreateTime", "VersionId"]);
    }
}

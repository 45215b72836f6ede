//! Reconciliation engine configuration.

use serde::{Deserialize, Serialize};
use tablesync_core::ICEBERG_TABLE_TYPE;

use crate::changelog::DEFAULT_MARKER_SUFFIX;
use crate::update::DEFAULT_READ_ONLY_ATTRIBUTES;

/// Settings for [`crate::Reconciler`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Value of the `table_type` parameter on created tables.
    pub table_type: String,
    /// Attributes dropped from a fetched record before it is written back.
    pub read_only_attributes: Vec<String>,
    /// Suffix naming the change-log marker table.
    pub marker_suffix: String,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            table_type: ICEBERG_TABLE_TYPE.to_string(),
            read_only_attributes: DEFAULT_READ_ONLY_ATTRIBUTES
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
            marker_suffix: DEFAULT_MARKER_SUFFIX.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReconcileConfig::default();
        assert_eq!(config.table_type, "ICEBERG");
        assert_eq!(config.marker_suffix, "_CONSUMED");
        assert!(config.read_only_attributes.iter().any(|a| a == "VersionId"));
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: ReconcileConfig =
            serde_json::from_str(r#"{"marker_suffix":"_ACK"}"#).expect("parse");
        assert_eq!(config.marker_suffix, "_ACK");
        assert_eq!(config.table_type, "ICEBERG");
    }
}

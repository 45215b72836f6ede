//! Reconciliation metrics.
//!
//! Recorded through the `metrics` facade; the embedding process installs the
//! recorder. Without one, recording is a no-op.

use std::sync::Once;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tablesync_core::rest::CATALOG_RETRY_TOTAL;

use crate::schema::SchemaWarning;

/// Reconciliation counter, labelled by `outcome` and `code`.
pub const RECONCILE_TOTAL: &str = "tablesync_reconcile_total";

/// Reconciliation duration histogram.
pub const RECONCILE_DURATION: &str = "tablesync_reconcile_duration_seconds";

/// Schema warning counter, labelled by `kind`.
pub const SCHEMA_WARNING_TOTAL: &str = "tablesync_schema_warning_total";

/// Failed change-log clears.
pub const LOG_CLEAR_FAILURE_TOTAL: &str = "tablesync_log_clear_failure_total";

static REGISTER: Once = Once::new();

/// Registers all metric descriptions. Safe to call more than once.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        describe_counter!(RECONCILE_TOTAL, "Total reconciliations by outcome and code");
        describe_histogram!(
            RECONCILE_DURATION,
            "Duration of a reconciliation call in seconds"
        );
        describe_counter!(
            SCHEMA_WARNING_TOTAL,
            "Tolerated schema problems by kind"
        );
        describe_counter!(
            CATALOG_RETRY_TOTAL,
            "Catalog requests retried after a transient failure"
        );
        describe_counter!(
            LOG_CLEAR_FAILURE_TOTAL,
            "Change-log clears that failed after a committed catalog write"
        );
    });
}

/// Records the result of one reconciliation.
pub fn record_reconcile(outcome: &'static str, code: u16, duration_secs: f64) {
    counter!(RECONCILE_TOTAL, "outcome" => outcome, "code" => code.to_string()).increment(1);
    histogram!(RECONCILE_DURATION, "outcome" => outcome).record(duration_secs);
}

/// Records schema warnings.
pub fn record_schema_warnings(warnings: &[SchemaWarning]) {
    for warning in warnings {
        counter!(SCHEMA_WARNING_TOTAL, "kind" => warning.kind()).increment(1);
    }
}

/// Records a failed change-log clear.
pub fn record_log_clear_failure() {
    counter!(LOG_CLEAR_FAILURE_TOTAL).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        register_metrics();
        register_metrics();
        record_reconcile("created", 201, 0.01);
        record_schema_warnings(&[SchemaWarning::DuplicateColumn {
            column: "id".into(),
        }]);
        record_log_clear_failure();
    }
}

//! Change-log acknowledger double.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tablesync_reconcile::{ChangeLogAcknowledger, ChangeLogError, ChangeLogHandle};

/// Records cleared handles; optionally fails every clear.
#[derive(Debug, Clone, Default)]
pub struct RecordingAcknowledger {
    cleared: Arc<Mutex<Vec<String>>>,
    markers: Arc<Mutex<Vec<String>>>,
    failure: Option<String>,
}

impl RecordingAcknowledger {
    /// Creates an acknowledger that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an acknowledger whose clears fail with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Handles passed to `clear`, in call order, including failed attempts.
    pub fn cleared(&self) -> Vec<String> {
        self.cleared.lock().expect("lock").clone()
    }

    /// Marker names the clears would have left, in call order.
    pub fn markers(&self) -> Vec<String> {
        self.markers.lock().expect("lock").clone()
    }
}

#[async_trait]
impl ChangeLogAcknowledger for RecordingAcknowledger {
    async fn clear(
        &self,
        handle: &ChangeLogHandle,
        marker_suffix: &str,
    ) -> Result<(), ChangeLogError> {
        self.cleared.lock().expect("lock").push(handle.to_string());
        self.markers
            .lock()
            .expect("lock")
            .push(handle.with_suffix(marker_suffix));
        match &self.failure {
            Some(message) => Err(ChangeLogError::Execution {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

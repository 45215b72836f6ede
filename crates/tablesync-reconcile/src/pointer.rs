//! Storage-root derivation from a snapshot pointer.
//!
//! A snapshot pointer names an immutable metadata file. The table's physical
//! root is the pointer with its file name removed.
//!
//! # Example
//!
//! ```rust
//! use tablesync_reconcile::pointer::derive_root;
//!
//! let root = derive_root("s3://bucket/a/b/metadata/v3.json").unwrap();
//! assert_eq!(root, "s3://bucket/a/b/metadata/");
//! ```

use crate::error::{SyncError, SyncResult};

/// Returns `pointer` up to and including its final `/`.
///
/// # Errors
///
/// Returns [`SyncError::InvalidPointerFormat`] when the pointer contains no
/// `/` or ends with one (no file name to strip).
pub fn derive_root(pointer: &str) -> SyncResult<String> {
    let separator = pointer
        .rfind('/')
        .ok_or_else(|| SyncError::invalid_pointer(pointer, "no path separator"))?;
    if separator + 1 == pointer.len() {
        return Err(SyncError::invalid_pointer(pointer, "no file name after the last separator"));
    }
    Ok(pointer[..=separator].to_string())
}

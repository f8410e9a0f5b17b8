//! Atomic write primitives
//!
//! Uses temp→rename pattern to ensure no partial writes

#![allow(clippy::result_large_err)]

use crate::errors::{io_error, Result};
use std::fs;
use std::path::Path;

/// Atomically replace a file's content
///
/// Writes to a temp file in the same directory, then renames it over the
/// target so readers never observe a partially written file.
pub fn atomic_replace(target_path: &Path, content: &[u8]) -> Result<()> {
    // Create parent directory if it doesn't exist
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("create_log_dir", e))?;
    }

    // Temp file in the same directory so the rename stays on one filesystem
    let temp_path = target_path.with_extension("tmp");

    fs::write(&temp_path, content).map_err(|e| io_error("write_log_temp", e))?;

    fs::rename(&temp_path, target_path).map_err(|e| io_error("rename_log_temp", e))?;

    Ok(())
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 filekeeper contributors

//! Safe file operations and the batch result contract
//!
//! Every move either completes fully or leaves the source untouched; a
//! partially written destination is never left visible. Disk-full and
//! quota errors are fatal to the remaining batch, everything else is a
//! per-file error the caller collects and continues past.

use filetime::FileTime;
use serde::Serialize;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::{FilekeeperError, Result};

/// Whether an operation mutates the filesystem or only reports its plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Preview,
    Execute,
}

impl ExecutionMode {
    pub fn is_preview(self) -> bool {
        matches!(self, ExecutionMode::Preview)
    }
}

/// One failed or skipped item in a batch.
#[derive(Debug, Clone, Serialize)]
pub struct OperationError {
    pub path: PathBuf,
    pub message: String,
}

/// Result contract returned to the presentation layer for every batch.
///
/// For a batch that was not fatally aborted, `processed_count` plus
/// `error_list.len()` equals the number of input items.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    pub success: bool,
    pub processed_count: usize,
    pub error_list: Vec<OperationError>,
    pub summary: serde_json::Map<String, serde_json::Value>,
}

impl OperationResult {
    pub fn new() -> Self {
        Self {
            success: true,
            processed_count: 0,
            error_list: Vec::new(),
            summary: serde_json::Map::new(),
        }
    }

    pub fn record_error(&mut self, path: PathBuf, message: impl Into<String>) {
        self.success = false;
        self.error_list.push(OperationError {
            path,
            message: message.into(),
        });
    }

    pub fn set_summary(&mut self, key: &str, value: serde_json::Value) {
        self.summary.insert(key.to_string(), value);
    }

    /// Mark the batch as fatally aborted; prior successes are kept.
    pub fn mark_aborted(&mut self) {
        self.success = false;
        self.set_summary("aborted", serde_json::Value::Bool(true));
    }
}

impl Default for OperationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// A single planned relocation, shared by preview and execute paths.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedMove {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Category folder, date folder, or project folder the move targets.
    pub bucket: String,
}

/// Disk-full and quota errors abort the remainder of a batch.
pub fn is_fatal_io(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::StorageFull | ErrorKind::QuotaExceeded)
}

fn wrap_io(err: io::Error) -> FilekeeperError {
    if is_fatal_io(&err) {
        FilekeeperError::Fatal(err)
    } else {
        FilekeeperError::FileSystem(err)
    }
}

/// Move a file, preserving timestamps and never overwriting.
///
/// Missing destination directories are created. A plain rename is tried
/// first; when the destination is on another filesystem the move falls
/// back to copy, size verification, timestamp restore, then source
/// deletion. On any failure the source is left in place and a partial
/// copy is removed.
pub fn move_file_safely(source: &Path, destination: &Path) -> Result<()> {
    if destination.exists() {
        return Err(FilekeeperError::DestinationExists(
            destination.to_path_buf(),
        ));
    }

    let metadata = fs::metadata(source).map_err(wrap_io)?;
    let mtime = FileTime::from_last_modification_time(&metadata);
    let atime = FileTime::from_last_access_time(&metadata);

    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(wrap_io)?;
    }

    match fs::rename(source, destination) {
        Ok(()) => {
            debug!("Moved {:?} -> {:?}", source, destination);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            copy_then_delete(source, destination, metadata.len(), atime, mtime)
        }
        Err(e) => Err(wrap_io(e)),
    }
}

fn copy_then_delete(
    source: &Path,
    destination: &Path,
    expected_len: u64,
    atime: FileTime,
    mtime: FileTime,
) -> Result<()> {
    let copied = match fs::copy(source, destination) {
        Ok(n) => n,
        Err(e) => {
            let _ = fs::remove_file(destination);
            return Err(wrap_io(e));
        }
    };

    if copied != expected_len {
        let _ = fs::remove_file(destination);
        return Err(FilekeeperError::FileSystem(io::Error::other(format!(
            "short copy of {}: {} of {} bytes",
            source.display(),
            copied,
            expected_len
        ))));
    }

    // Rename preserves timestamps natively; a copy does not. Creation time
    // cannot be set portably, so modification and access times are what we
    // restore here.
    if let Err(e) = filetime::set_file_times(destination, atime, mtime) {
        warn!("Could not restore timestamps on {:?}: {}", destination, e);
    }

    if let Err(e) = fs::remove_file(source) {
        // Keep the source authoritative: drop the copy so the file is not
        // visible in two places.
        let _ = fs::remove_file(destination);
        return Err(wrap_io(e));
    }

    debug!("Copied {:?} -> {:?} (cross-device)", source, destination);
    Ok(())
}

/// Delete a single file.
pub fn delete_file(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(wrap_io)
}

/// Convert bytes to a human-readable size string.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

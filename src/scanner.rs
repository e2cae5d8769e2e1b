// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 filekeeper contributors

//! Directory scanner producing file records with metadata

use chrono::{DateTime, Local};
use glob::Pattern;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::fileops::OperationError;

/// Metadata snapshot of a single regular file.
///
/// Identity is the absolute path at scan time; the record becomes stale
/// once the underlying file moves.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    pub path: PathBuf,
    pub name: String,
    /// Lowercased, without the leading dot. Empty when there is none.
    pub extension: String,
    pub size_bytes: u64,
    pub modified: DateTime<Local>,
    pub created: Option<DateTime<Local>>,
}

impl FileRecord {
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let modified = metadata
            .modified()
            .map(DateTime::<Local>::from)
            .unwrap_or_else(|_| DateTime::<Local>::from(SystemTime::UNIX_EPOCH));
        let created = metadata.created().ok().map(DateTime::<Local>::from);

        Ok(Self {
            path: path.to_path_buf(),
            name,
            extension,
            size_bytes: metadata.len(),
            modified,
            created,
        })
    }
}

/// Result of a directory scan: the records plus soft per-entry errors.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub records: Vec<FileRecord>,
    pub errors: Vec<OperationError>,
    /// Files present but filtered out (hidden, temporary, system litter,
    /// or matching an ignore pattern). Counted so a scan stays auditable
    /// against the directory contents.
    pub skipped: usize,
}

/// Walk `dir` and collect a [`FileRecord`] for every regular file.
///
/// Symbolic links are never followed. A stat failure on one entry is
/// recorded as a soft error and the walk continues; it never aborts the
/// whole scan. The walk only reads metadata and opens nothing for writing.
pub fn scan_directory(dir: &Path, recursive: bool, ignore_globs: &[String]) -> ScanReport {
    let ignore_patterns = compile_patterns(ignore_globs);
    let mut report = ScanReport::default();

    let max_depth = if recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(dir).follow_links(false).max_depth(max_depth);

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                let path = e.path().map(Path::to_path_buf);
                warn!("Skipping unreadable entry: {}", e);
                report.errors.push(OperationError {
                    path: path.unwrap_or_default(),
                    message: e.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !should_process(path) {
            debug!("Ignoring {:?}", path);
            report.skipped += 1;
            continue;
        }
        if ignore_patterns.iter().any(|p| p.matches_path(path)) {
            debug!("Ignore pattern matched {:?}", path);
            report.skipped += 1;
            continue;
        }

        match FileRecord::from_path(path) {
            Ok(record) => report.records.push(record),
            Err(e) => {
                warn!("Cannot stat {:?}: {}", path, e);
                report.errors.push(OperationError {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                });
            }
        }
    }

    report
}

fn compile_patterns(globs: &[String]) -> Vec<Pattern> {
    globs
        .iter()
        .filter_map(|g| match Pattern::new(g) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!("Invalid ignore pattern '{}': {}", g, e);
                None
            }
        })
        .collect()
}

/// Check whether a file is worth scanning at all.
pub fn should_process(path: &Path) -> bool {
    let filename = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n,
        None => return false,
    };

    // Skip hidden files
    if filename.starts_with('.') {
        return false;
    }

    // Skip temporary files
    let temp_extensions = [".tmp", ".part", ".crdownload", ".partial", ".download"];
    for ext in &temp_extensions {
        if filename.ends_with(ext) {
            return false;
        }
    }

    // Skip system files
    let skip_names = ["desktop.ini", "thumbs.db", ".ds_store"];
    if skip_names.iter().any(|n| filename.eq_ignore_ascii_case(n)) {
        return false;
    }

    true
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 filekeeper contributors

//! Append-only operation log sink
//!
//! The engine emits one structured record per error and per completed
//! operation. The sink is write-only and order-preserving; the engine
//! never reads it back. Sink failures are reported through `tracing` and
//! never fail the operation that produced the entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One structured log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub operation: String,
    pub path: Option<PathBuf>,
    pub message: String,
}

impl LogEntry {
    pub fn new(operation: &str, path: Option<&Path>, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            operation: operation.to_string(),
            path: path.map(Path::to_path_buf),
            message: message.into(),
        }
    }
}

/// Sink collaborator the engine writes operation records to.
pub trait LogSink: Send + Sync {
    fn record(&self, entry: &LogEntry);
}

/// JSONL file-backed sink, one entry per line.
pub struct OperationLog {
    path: PathBuf,
}

impl OperationLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, entry: &LogEntry) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let json = serde_json::to_string(entry).map_err(std::io::Error::other)?;
        writeln!(file, "{}", json)?;
        Ok(())
    }
}

impl LogSink for OperationLog {
    fn record(&self, entry: &LogEntry) {
        if let Err(e) = self.append(entry) {
            tracing::warn!("Failed to write log entry to {:?}: {}", self.path, e);
        }
    }
}

/// Sink that drops everything; used in tests and preview-only callers.
pub struct NullSink;

impl LogSink for NullSink {
    fn record(&self, _entry: &LogEntry) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;
    use tempfile::tempdir;

    #[test]
    fn test_entries_append_in_order() {
        let tmp = tempdir().unwrap();
        let log = OperationLog::new(tmp.path().join("ops.jsonl"));

        log.record(&LogEntry::new("organize", None, "first"));
        log.record(&LogEntry::new(
            "duplicate_remove",
            Some(Path::new("/tmp/x")),
            "second",
        ));

        let file = std::fs::File::open(log.path()).unwrap();
        let lines: Vec<String> = std::io::BufReader::new(file)
            .lines()
            .map(|l| l.unwrap())
            .collect();
        assert_eq!(lines.len(), 2);

        let first: LogEntry = serde_json::from_str(&lines[0]).unwrap();
        let second: LogEntry = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(first.message, "first");
        assert_eq!(second.operation, "duplicate_remove");
        assert_eq!(second.path.as_deref(), Some(Path::new("/tmp/x")));
    }
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 filekeeper contributors

//! Error types for Filekeeper
//!
//! Per-file failures inside a batch are collected into
//! [`crate::fileops::OperationResult::error_list`] rather than propagated;
//! the variants here cover pre-flight validation and the few conditions
//! that abort an operation outright.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Filekeeper operations
pub type Result<T> = std::result::Result<T, FilekeeperError>;

/// Filekeeper error types
#[derive(Error, Debug)]
pub enum FilekeeperError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Failed to hash {path}: {source}")]
    Hash {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid duplicate selection: {0}")]
    InvalidSelection(String),

    #[error("Destination already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("Fatal I/O error, batch aborted: {0}")]
    Fatal(std::io::Error),

    #[error("Text extraction unavailable: {0}")]
    OcrUnavailable(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

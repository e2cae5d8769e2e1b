// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 filekeeper contributors

//! Filekeeper: file organization engine
//!
//! Scans a directory tree, classifies files by type/date/project rules,
//! detects content-identical duplicates, and proposes descriptive renames
//! for images from externally extracted text. Every mutating operation has
//! a preview mode that computes the exact plan without touching the
//! filesystem.

pub mod classifier;
pub mod config;
pub mod dupes;
pub mod error;
pub mod fileops;
pub mod hasher;
pub mod namegen;
pub mod oplog;
pub mod organizer;
pub mod renamer;
pub mod scanner;
pub mod validate;

pub use config::AppConfig;
pub use error::{FilekeeperError, Result};
pub use fileops::{ExecutionMode, OperationError, OperationResult};

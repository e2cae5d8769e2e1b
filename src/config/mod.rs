// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 filekeeper contributors

//! Configuration management for Filekeeper

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Roots the engine is allowed to operate under; empty means no
    /// restriction.
    #[serde(default)]
    pub allowed_roots: Vec<String>,

    /// Scanning options
    #[serde(default)]
    pub scan: ScanConfig,

    /// Hashing options
    #[serde(default)]
    pub hashing: HashConfig,

    /// Generated-name rules
    #[serde(default)]
    pub naming: NamingConfig,

    /// External OCR command
    #[serde(default)]
    pub ocr: OcrConfig,

    /// Operation log sink
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScanConfig {
    #[serde(default = "default_true")]
    pub recursive: bool,
    /// Glob patterns for paths to skip entirely
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    /// Files below this size are not considered for duplicate detection
    #[serde(default = "default_min_duplicate_size")]
    pub min_duplicate_size: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HashConfig {
    /// Read size for streaming digests; clamped to at least 4 KiB
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NamingConfig {
    /// Maximum generated stem length, extension not counted
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Prefix for the timestamp fallback name
    #[serde(default = "default_fallback_prefix")]
    pub fallback_prefix: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OcrConfig {
    #[serde(default = "default_ocr_program")]
    pub program: String,
    /// `{input}` is replaced with the image path
    #[serde(default = "default_ocr_args")]
    pub args: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogConfig {
    #[serde(default = "default_log_path")]
    pub path: String,
}

// Default value functions
fn default_true() -> bool { true }
fn default_min_duplicate_size() -> u64 { 100 }
fn default_chunk_size() -> usize { 64 * 1024 }
fn default_max_length() -> usize { 50 }
fn default_fallback_prefix() -> String { "screenshot".to_string() }
fn default_ocr_program() -> String { "tesseract".to_string() }
fn default_ocr_args() -> Vec<String> {
    vec!["{input}".to_string(), "stdout".to_string()]
}
fn default_log_path() -> String { "filekeeper_log.jsonl".to_string() }

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            ignore_patterns: Vec::new(),
            min_duplicate_size: default_min_duplicate_size(),
        }
    }
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            fallback_prefix: default_fallback_prefix(),
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            program: default_ocr_program(),
            args: default_ocr_args(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            allowed_roots: Vec::new(),
            scan: ScanConfig::default(),
            hashing: HashConfig::default(),
            naming: NamingConfig::default(),
            ocr: OcrConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = serde_json::from_str(&content).map_err(|e| {
                crate::FilekeeperError::Config(format!("Failed to parse config: {}", e))
            })?;
            Ok(config)
        } else {
            tracing::info!("Config file not found at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Save configuration to a JSON file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Allowed roots as paths
    pub fn allowed_root_paths(&self) -> Vec<PathBuf> {
        self.allowed_roots.iter().map(PathBuf::from).collect()
    }
}

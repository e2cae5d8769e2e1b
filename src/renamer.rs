// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 filekeeper contributors

//! Descriptive renames from externally extracted text
//!
//! The text extraction itself (OCR) is an external collaborator behind
//! the [`TextExtractor`] trait; the engine consumes its output as an
//! opaque string and treats any extractor failure as empty text, which
//! falls through to the deterministic timestamp name.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{NamingConfig, OcrConfig};
use crate::fileops::{ExecutionMode, OperationResult};
use crate::namegen::{self, NameReserver};
use crate::oplog::{LogEntry, LogSink};
use crate::{FilekeeperError, Result};

/// External text-extraction collaborator.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, image: &Path) -> Result<String>;
}

/// Extractor that always yields empty text; every file gets the
/// timestamp fallback name.
pub struct NullExtractor;

#[async_trait]
impl TextExtractor for NullExtractor {
    async fn extract_text(&self, _image: &Path) -> Result<String> {
        Ok(String::new())
    }
}

/// Extractor backed by an external OCR command (e.g. `tesseract <file>
/// stdout`). The `{input}` placeholder in the configured arguments is
/// replaced with the image path.
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
}

impl CommandExtractor {
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }
}

#[async_trait]
impl TextExtractor for CommandExtractor {
    async fn extract_text(&self, image: &Path) -> Result<String> {
        let mut command = tokio::process::Command::new(&self.program);
        for arg in &self.args {
            command.arg(arg.replace("{input}", &image.to_string_lossy()));
        }

        let output = command.output().await.map_err(|e| {
            FilekeeperError::OcrUnavailable(format!("{}: {}", self.program, e))
        })?;

        if !output.status.success() {
            return Err(FilekeeperError::OcrUnavailable(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Status of one rename proposal. Terminal states are only assigned
/// during execute and never change afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Skipped,
    Failed,
}

/// One proposed rename, shown to the user in preview mode.
#[derive(Debug, Clone, Serialize)]
pub struct RenameProposal {
    pub source_path: PathBuf,
    pub original_name: String,
    pub proposed_name: String,
    pub extracted_text: String,
    pub status: ProposalStatus,
}

/// Proposals plus the batch result contract.
#[derive(Debug)]
pub struct RenameReport {
    pub proposals: Vec<RenameProposal>,
    pub result: OperationResult,
}

/// Extracted text is truncated to this many characters in the report.
const EXTRACT_PREVIEW_CHARS: usize = 200;

/// Propose (and in execute mode apply) descriptive names for `files`.
///
/// Planning is identical in both modes: extract text, sanitize it into a
/// name stem (or fall back to a timestamp name), and claim a unique name
/// in the file's own directory through a batch-local reserver. Execute
/// renames in place and assigns terminal statuses.
pub async fn rename_screenshots(
    files: &[PathBuf],
    extractor: &dyn TextExtractor,
    naming: &NamingConfig,
    mode: ExecutionMode,
    log: &dyn LogSink,
) -> RenameReport {
    let mut proposals = Vec::new();
    let mut result = OperationResult::new();
    let mut reservers: HashMap<PathBuf, NameReserver> = HashMap::new();
    let mut renamed = 0u64;

    for file in files {
        let original_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !file.exists() {
            result.record_error(file.clone(), "file not found".to_string());
            proposals.push(RenameProposal {
                source_path: file.clone(),
                original_name,
                proposed_name: String::new(),
                extracted_text: String::new(),
                status: if mode.is_preview() {
                    ProposalStatus::Pending
                } else {
                    ProposalStatus::Skipped
                },
            });
            continue;
        }

        let extracted = match extractor.extract_text(file).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Text extraction failed for {:?}: {}", file, e);
                log.record(&LogEntry::new(
                    "rename",
                    Some(file),
                    format!("extraction degraded to fallback: {}", e),
                ));
                String::new()
            }
        };

        let stem = namegen::sanitize(&extracted, naming.max_length)
            .unwrap_or_else(|| namegen::fallback_name(&naming.fallback_prefix));
        let extension = file
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        let candidate = if extension.is_empty() {
            stem
        } else {
            format!("{}.{}", stem, extension)
        };

        let parent = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let reserver = reservers
            .entry(parent.clone())
            .or_insert_with(|| NameReserver::new(parent.clone()));
        let proposed_name = reserver.ensure_unique(&candidate);

        let mut proposal = RenameProposal {
            source_path: file.clone(),
            original_name,
            proposed_name: proposed_name.clone(),
            extracted_text: truncate_chars(&extracted, EXTRACT_PREVIEW_CHARS),
            status: ProposalStatus::Pending,
        };

        if mode.is_preview() {
            result.processed_count += 1;
            proposals.push(proposal);
            continue;
        }

        let destination = parent.join(&proposed_name);
        if destination.exists() {
            // Filesystem changed between planning and apply
            proposal.status = ProposalStatus::Failed;
            result.record_error(
                file.clone(),
                format!("destination already exists: {}", destination.display()),
            );
        } else {
            match std::fs::rename(file, &destination) {
                Ok(()) => {
                    proposal.status = ProposalStatus::Accepted;
                    result.processed_count += 1;
                    renamed += 1;
                    log.record(&LogEntry::new(
                        "rename",
                        Some(&destination),
                        format!("renamed from {}", file.display()),
                    ));
                }
                Err(e) => {
                    proposal.status = ProposalStatus::Failed;
                    log.record(&LogEntry::new(
                        "rename",
                        Some(file),
                        format!("failed: {}", e),
                    ));
                    result.record_error(file.clone(), e.to_string());
                }
            }
        }
        proposals.push(proposal);
    }

    result.set_summary("total_files", (files.len() as u64).into());
    result.set_summary("renamed", renamed.into());
    info!(
        "Rename ({:?}): {} proposals, {} errors",
        mode,
        proposals.len(),
        result.error_list.len()
    );

    RenameReport { proposals, result }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oplog::NullSink;
    use tempfile::tempdir;

    struct FixedExtractor(&'static str);

    #[async_trait]
    impl TextExtractor for FixedExtractor {
        async fn extract_text(&self, _image: &Path) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenExtractor;

    #[async_trait]
    impl TextExtractor for BrokenExtractor {
        async fn extract_text(&self, _image: &Path) -> Result<String> {
            Err(FilekeeperError::OcrUnavailable("engine offline".to_string()))
        }
    }

    fn naming() -> NamingConfig {
        NamingConfig::default()
    }

    #[tokio::test]
    async fn test_preview_plans_without_renaming() {
        let tmp = tempdir().unwrap();
        let shot = tmp.path().join("IMG_001.png");
        std::fs::write(&shot, "png").unwrap();

        let report = rename_screenshots(
            &[shot.clone()],
            &FixedExtractor("Invoice #2024 March!!"),
            &naming(),
            ExecutionMode::Preview,
            &NullSink,
        )
        .await;

        assert!(report.result.success);
        assert_eq!(report.proposals.len(), 1);
        let proposal = &report.proposals[0];
        assert_eq!(proposal.status, ProposalStatus::Pending);
        assert_eq!(proposal.proposed_name, "Invoice_2024_March.png");
        // Nothing moved
        assert!(shot.exists());
    }

    #[tokio::test]
    async fn test_execute_renames_and_accepts() {
        let tmp = tempdir().unwrap();
        let shot = tmp.path().join("IMG_001.png");
        std::fs::write(&shot, "png").unwrap();

        let report = rename_screenshots(
            &[shot.clone()],
            &FixedExtractor("Quarterly Results"),
            &naming(),
            ExecutionMode::Execute,
            &NullSink,
        )
        .await;

        assert!(report.result.success);
        assert_eq!(report.proposals[0].status, ProposalStatus::Accepted);
        assert!(!shot.exists());
        assert!(tmp.path().join("Quarterly_Results.png").exists());
    }

    #[tokio::test]
    async fn test_collision_gets_numeric_suffix() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join("Invoice_2024_March.png"), "old").unwrap();
        let shot = tmp.path().join("IMG_001.png");
        std::fs::write(&shot, "png").unwrap();

        let report = rename_screenshots(
            &[shot],
            &FixedExtractor("Invoice #2024 March!!"),
            &naming(),
            ExecutionMode::Execute,
            &NullSink,
        )
        .await;

        assert_eq!(
            report.proposals[0].proposed_name,
            "Invoice_2024_March_1.png"
        );
        assert!(tmp.path().join("Invoice_2024_March_1.png").exists());
    }

    #[tokio::test]
    async fn test_batch_collisions_resolved_in_memory() {
        let tmp = tempdir().unwrap();
        let a = tmp.path().join("IMG_a.png");
        let b = tmp.path().join("IMG_b.png");
        std::fs::write(&a, "a").unwrap();
        std::fs::write(&b, "b").unwrap();

        // Same extracted text for both; preview must still not collide
        let report = rename_screenshots(
            &[a, b],
            &FixedExtractor("Team Photo"),
            &naming(),
            ExecutionMode::Preview,
            &NullSink,
        )
        .await;

        assert_eq!(report.proposals[0].proposed_name, "Team_Photo.png");
        assert_eq!(report.proposals[1].proposed_name, "Team_Photo_1.png");
    }

    #[tokio::test]
    async fn test_extractor_failure_degrades_to_fallback() {
        let tmp = tempdir().unwrap();
        let shot = tmp.path().join("IMG_001.png");
        std::fs::write(&shot, "png").unwrap();

        let report = rename_screenshots(
            &[shot],
            &BrokenExtractor,
            &naming(),
            ExecutionMode::Preview,
            &NullSink,
        )
        .await;

        // Failure is not propagated; the fallback name is proposed instead
        assert!(report.result.success);
        let cfg = naming();
        assert!(report.proposals[0]
            .proposed_name
            .starts_with(&format!("{}_", cfg.fallback_prefix)));
    }

    #[tokio::test]
    async fn test_missing_file_is_accounted() {
        let tmp = tempdir().unwrap();
        let ghost = tmp.path().join("ghost.png");

        let report = rename_screenshots(
            &[ghost],
            &FixedExtractor("anything"),
            &naming(),
            ExecutionMode::Execute,
            &NullSink,
        )
        .await;

        assert!(!report.result.success);
        assert_eq!(report.result.error_list.len(), 1);
        assert_eq!(
            report.result.processed_count + report.result.error_list.len(),
            1
        );
        assert_eq!(report.proposals[0].status, ProposalStatus::Skipped);
    }
}

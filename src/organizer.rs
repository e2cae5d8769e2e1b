// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 filekeeper contributors

//! Organize files into category, date, or project folders
//!
//! One planning function produces the move list consumed by both preview
//! and execute, so what the preview shows is exactly what execute will
//! attempt (modulo filesystem changes between the two calls).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::classifier::{self, Category, ProjectRule};
use crate::fileops::{self, ExecutionMode, OperationResult, PlannedMove};
use crate::oplog::{LogEntry, LogSink};
use crate::scanner::FileRecord;
use crate::{FilekeeperError, Result};

/// How destination folders are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizeStrategy {
    ByType,
    ByDate,
    ByProject,
}

/// Compute the full move plan without touching the filesystem.
///
/// Files that no project rule matches go to the `Others` folder.
pub fn plan_organize(
    records: &[FileRecord],
    strategy: OrganizeStrategy,
    target_dir: &Path,
    rules: &[ProjectRule],
) -> Vec<PlannedMove> {
    records
        .iter()
        .map(|record| {
            let bucket = match strategy {
                OrganizeStrategy::ByType => Category::from_extension(&record.extension)
                    .folder_name()
                    .to_string(),
                OrganizeStrategy::ByDate => classifier::date_bucket(record.modified),
                OrganizeStrategy::ByProject => classifier::match_project_rule(rules, &record.name)
                    .unwrap_or(Category::Others.folder_name())
                    .to_string(),
            };
            PlannedMove {
                source: record.path.clone(),
                destination: target_dir.join(&bucket).join(&record.name),
                bucket,
            }
        })
        .collect()
}

/// Organize `records` under `target_dir` using `strategy`.
///
/// In preview mode the plan is computed and summarized but nothing moves.
/// In execute mode each file either moves fully or stays put; an existing
/// destination is a per-file error and the batch continues, while
/// disk-full aborts the remainder (completed moves are kept).
pub fn organize(
    records: &[FileRecord],
    strategy: OrganizeStrategy,
    target_dir: &Path,
    rules: &[ProjectRule],
    mode: ExecutionMode,
    log: &dyn LogSink,
) -> Result<OperationResult> {
    if strategy == OrganizeStrategy::ByProject && rules.is_empty() {
        return Err(FilekeeperError::Config(
            "no project rules provided".to_string(),
        ));
    }

    let plan = plan_organize(records, strategy, target_dir, rules);
    let mut result = OperationResult::new();
    let mut bucket_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut unmatched = 0u64;

    for planned in &plan {
        *bucket_counts.entry(planned.bucket.clone()).or_default() += 1;
        if strategy == OrganizeStrategy::ByProject
            && planned.bucket == Category::Others.folder_name()
        {
            unmatched += 1;
        }

        if mode.is_preview() {
            result.processed_count += 1;
            continue;
        }

        match fileops::move_file_safely(&planned.source, &planned.destination) {
            Ok(()) => {
                result.processed_count += 1;
                log.record(&LogEntry::new(
                    "organize",
                    Some(&planned.destination),
                    format!("moved from {}", planned.source.display()),
                ));
            }
            Err(FilekeeperError::Fatal(e)) => {
                log.record(&LogEntry::new(
                    "organize",
                    Some(&planned.source),
                    format!("fatal: {}", e),
                ));
                result.record_error(planned.source.clone(), format!("fatal: {}", e));
                result.mark_aborted();
                break;
            }
            Err(e) => {
                log.record(&LogEntry::new(
                    "organize",
                    Some(&planned.source),
                    format!("failed: {}", e),
                ));
                result.record_error(planned.source.clone(), e.to_string());
            }
        }
    }

    let counts_key = match strategy {
        OrganizeStrategy::ByType => "by_category",
        OrganizeStrategy::ByDate => "by_date",
        OrganizeStrategy::ByProject => "by_project",
    };
    result.set_summary(counts_key, serde_json::to_value(&bucket_counts)?);
    result.set_summary("total_files", (records.len() as u64).into());
    if strategy == OrganizeStrategy::ByProject {
        result.set_summary("unmatched", unmatched.into());
    }

    log.record(&LogEntry::new(
        "organize",
        None,
        format!(
            "strategy={:?} mode={:?} processed={} errors={}",
            strategy,
            mode,
            result.processed_count,
            result.error_list.len()
        ),
    ));
    info!(
        "Organize {:?} ({:?}): {} processed, {} errors",
        strategy,
        mode,
        result.processed_count,
        result.error_list.len()
    );
    Ok(result)
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 filekeeper contributors

//! Duplicate detection and the remove/archive operations
//!
//! Files are grouped by content digest after a size pre-filter (only
//! sizes shared by at least two candidates are hashed). A digest
//! collision between files with different content would be reported as a
//! duplicate; with BLAKE3 this is a theoretical false-positive risk we
//! inherit from the size+digest design.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

use crate::fileops::{
    self, ExecutionMode, OperationError, OperationResult,
};
use crate::hasher;
use crate::namegen::NameReserver;
use crate::oplog::{LogEntry, LogSink};
use crate::scanner::FileRecord;
use crate::{FilekeeperError, Result};

/// Files sharing one content digest. Always has at least two members at
/// creation, and removal never leaves it empty.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    pub digest: String,
    pub members: Vec<FileRecord>,
    pub total_size: u64,
}

/// Outcome of a duplicate scan: groups plus per-file hash errors.
#[derive(Debug, Default)]
pub struct DuplicateScan {
    pub groups: Vec<DuplicateGroup>,
    pub errors: Vec<OperationError>,
}

/// Keep-selection for one group, by index into `groups`.
#[derive(Debug, Clone)]
pub struct GroupSelection {
    pub group_index: usize,
    pub keep_indices: Vec<usize>,
}

/// Group records by content digest, discarding singletons.
///
/// Only sizes with two or more candidates are hashed. Files smaller than
/// `min_size` are skipped entirely (tiny files are rarely meaningful
/// duplicates). Group members appear in scan order, and groups are
/// ordered by their first member's scan position.
pub fn find_duplicates(records: &[FileRecord], chunk_size: usize, min_size: u64) -> DuplicateScan {
    let mut scan = DuplicateScan::default();

    let mut size_counts: HashMap<u64, usize> = HashMap::new();
    for record in records {
        if record.size_bytes >= min_size {
            *size_counts.entry(record.size_bytes).or_default() += 1;
        }
    }

    let mut group_index: HashMap<String, usize> = HashMap::new();
    for record in records {
        if record.size_bytes < min_size {
            continue;
        }
        if size_counts.get(&record.size_bytes).copied().unwrap_or(0) < 2 {
            continue;
        }

        let digest = match hasher::digest_file(&record.path, chunk_size) {
            Ok(d) => d,
            Err(e) => {
                scan.errors.push(OperationError {
                    path: record.path.clone(),
                    message: e.to_string(),
                });
                continue;
            }
        };

        match group_index.get(&digest) {
            Some(&idx) => {
                let group = &mut scan.groups[idx];
                group.members.push(record.clone());
                group.total_size += record.size_bytes;
            }
            None => {
                group_index.insert(digest.clone(), scan.groups.len());
                scan.groups.push(DuplicateGroup {
                    digest,
                    members: vec![record.clone()],
                    total_size: record.size_bytes,
                });
            }
        }
    }

    scan.groups.retain(|g| g.members.len() > 1);
    debug!(
        "Duplicate scan: {} groups from {} records",
        scan.groups.len(),
        records.len()
    );
    scan
}

/// Compute the delete set for a group: every member not named in
/// `keep_indices`. At least one member must be kept and every index must
/// be in range, otherwise `InvalidSelection`.
pub fn select_for_removal(
    group: &DuplicateGroup,
    keep_indices: &[usize],
) -> Result<Vec<FileRecord>> {
    if keep_indices.is_empty() {
        return Err(FilekeeperError::InvalidSelection(
            "at least one file per group must be kept".to_string(),
        ));
    }
    for &idx in keep_indices {
        if idx >= group.members.len() {
            return Err(FilekeeperError::InvalidSelection(format!(
                "index {} out of range for group of {}",
                idx,
                group.members.len()
            )));
        }
    }

    let keep: HashSet<usize> = keep_indices.iter().copied().collect();
    Ok(group
        .members
        .iter()
        .enumerate()
        .filter(|(idx, _)| !keep.contains(idx))
        .map(|(_, record)| record.clone())
        .collect())
}

fn selection_for<'a>(
    selections: &'a [GroupSelection],
    group_index: usize,
) -> Option<&'a [usize]> {
    selections
        .iter()
        .find(|s| s.group_index == group_index)
        .map(|s| s.keep_indices.as_slice())
}

/// Delete the non-kept members of each group.
///
/// Groups without an explicit selection keep their first member. An
/// invalid selection blocks only that group; deletions are independent,
/// so one failure never stops the others.
pub fn remove_duplicates(
    groups: &[DuplicateGroup],
    selections: &[GroupSelection],
    mode: ExecutionMode,
    log: &dyn LogSink,
) -> OperationResult {
    let mut result = OperationResult::new();
    let mut removed = 0u64;
    let mut kept = 0u64;
    let mut space_saved = 0u64;

    for (gi, group) in groups.iter().enumerate() {
        let keep_indices = selection_for(selections, gi).unwrap_or(&[0]);

        let delete_set = match select_for_removal(group, keep_indices) {
            Ok(set) => set,
            Err(e) => {
                // The whole group is blocked; account for every member
                for member in &group.members {
                    result.record_error(member.path.clone(), e.to_string());
                }
                continue;
            }
        };
        let delete_paths: HashSet<&Path> =
            delete_set.iter().map(|r| r.path.as_path()).collect();

        for member in &group.members {
            if !delete_paths.contains(member.path.as_path()) {
                kept += 1;
                result.processed_count += 1;
                continue;
            }

            if mode.is_preview() {
                removed += 1;
                space_saved += member.size_bytes;
                result.processed_count += 1;
                continue;
            }

            match fileops::delete_file(&member.path) {
                Ok(()) => {
                    removed += 1;
                    space_saved += member.size_bytes;
                    result.processed_count += 1;
                    log.record(&LogEntry::new(
                        "duplicate_remove",
                        Some(&member.path),
                        format!("removed duplicate of {}", group.digest),
                    ));
                }
                Err(e) => {
                    log.record(&LogEntry::new(
                        "duplicate_remove",
                        Some(&member.path),
                        format!("failed: {}", e),
                    ));
                    result.record_error(member.path.clone(), e.to_string());
                }
            }
        }
    }

    result.set_summary("removed", removed.into());
    result.set_summary("kept", kept.into());
    result.set_summary("space_saved", space_saved.into());
    info!(
        "Duplicate removal ({:?}): {} removed, {} kept, {} errors",
        mode,
        removed,
        kept,
        result.error_list.len()
    );
    result
}

/// Move the non-kept members of each group into `archive_dir` instead of
/// deleting them, claiming collision-free archive names through the
/// batch-local reserver. Disk-full aborts the remaining batch.
pub fn archive_duplicates(
    groups: &[DuplicateGroup],
    selections: &[GroupSelection],
    archive_dir: &Path,
    mode: ExecutionMode,
    log: &dyn LogSink,
) -> Result<OperationResult> {
    let mut result = OperationResult::new();
    let mut archived = 0u64;
    let mut kept = 0u64;
    let mut space_moved = 0u64;

    if !mode.is_preview() {
        std::fs::create_dir_all(archive_dir)?;
    }
    let mut reserver = NameReserver::new(archive_dir.to_path_buf());

    'groups: for (gi, group) in groups.iter().enumerate() {
        let keep_indices = selection_for(selections, gi).unwrap_or(&[0]);

        let delete_set = match select_for_removal(group, keep_indices) {
            Ok(set) => set,
            Err(e) => {
                for member in &group.members {
                    result.record_error(member.path.clone(), e.to_string());
                }
                continue;
            }
        };
        let move_paths: HashSet<&Path> =
            delete_set.iter().map(|r| r.path.as_path()).collect();

        for member in &group.members {
            if !move_paths.contains(member.path.as_path()) {
                kept += 1;
                result.processed_count += 1;
                continue;
            }

            let unique = reserver.ensure_unique(&member.name);
            let destination = archive_dir.join(&unique);

            if mode.is_preview() {
                archived += 1;
                space_moved += member.size_bytes;
                result.processed_count += 1;
                continue;
            }

            match fileops::move_file_safely(&member.path, &destination) {
                Ok(()) => {
                    archived += 1;
                    space_moved += member.size_bytes;
                    result.processed_count += 1;
                    log.record(&LogEntry::new(
                        "duplicate_archive",
                        Some(&destination),
                        format!("archived from {}", member.path.display()),
                    ));
                }
                Err(FilekeeperError::Fatal(e)) => {
                    log.record(&LogEntry::new(
                        "duplicate_archive",
                        Some(&member.path),
                        format!("fatal: {}", e),
                    ));
                    result.record_error(member.path.clone(), format!("fatal: {}", e));
                    result.mark_aborted();
                    break 'groups;
                }
                Err(e) => {
                    log.record(&LogEntry::new(
                        "duplicate_archive",
                        Some(&member.path),
                        format!("failed: {}", e),
                    ));
                    result.record_error(member.path.clone(), e.to_string());
                }
            }
        }
    }

    result.set_summary("archived", archived.into());
    result.set_summary("kept", kept.into());
    result.set_summary("space_moved", space_moved.into());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::MIN_CHUNK_SIZE;
    use crate::oplog::NullSink;
    use crate::scanner;
    use tempfile::tempdir;

    fn scan_records(dir: &Path) -> Vec<FileRecord> {
        scanner::scan_directory(dir, true, &[]).records
    }

    /// Matches the identical-pair scenario: a.txt and b.txt share content,
    /// c.jpg does not, so exactly one group of two appears.
    #[test]
    fn test_identical_pair_forms_one_group() {
        let tmp = tempdir().unwrap();
        let content = "x".repeat(512);
        std::fs::write(tmp.path().join("a.txt"), &content).unwrap();
        std::fs::write(tmp.path().join("b.txt"), &content).unwrap();
        std::fs::write(tmp.path().join("c.jpg"), "y".repeat(512)).unwrap();

        let scan = find_duplicates(&scan_records(tmp.path()), MIN_CHUNK_SIZE, 100);
        assert_eq!(scan.groups.len(), 1);
        let group = &scan.groups[0];
        assert_eq!(group.members.len(), 2);
        assert_eq!(group.total_size, 1024);
        let names: Vec<&str> = group.members.iter().map(|m| m.name.as_str()).collect();
        assert!(names.contains(&"a.txt"));
        assert!(names.contains(&"b.txt"));
        assert!(!names.contains(&"c.jpg"));
    }

    #[test]
    fn test_small_files_skipped() {
        let tmp = tempdir().unwrap();
        std::fs::write(tmp.path().join("a.txt"), "tiny").unwrap();
        std::fs::write(tmp.path().join("b.txt"), "tiny").unwrap();

        let scan = find_duplicates(&scan_records(tmp.path()), MIN_CHUNK_SIZE, 100);
        assert!(scan.groups.is_empty());
    }

    #[test]
    fn test_select_for_removal_requires_survivor() {
        let tmp = tempdir().unwrap();
        let content = "z".repeat(256);
        std::fs::write(tmp.path().join("p.bin"), &content).unwrap();
        std::fs::write(tmp.path().join("q.bin"), &content).unwrap();
        let groups = find_duplicates(&scan_records(tmp.path()), MIN_CHUNK_SIZE, 100).groups;
        let group = &groups[0];

        assert!(matches!(
            select_for_removal(group, &[]),
            Err(FilekeeperError::InvalidSelection(_))
        ));
        assert!(matches!(
            select_for_removal(group, &[5]),
            Err(FilekeeperError::InvalidSelection(_))
        ));

        let delete = select_for_removal(group, &[0]).unwrap();
        assert_eq!(delete.len(), 1);
        assert_eq!(group.members.len() - delete.len(), 1);
    }

    #[test]
    fn test_remove_preview_leaves_files_alone() {
        let tmp = tempdir().unwrap();
        let content = "z".repeat(256);
        std::fs::write(tmp.path().join("p.bin"), &content).unwrap();
        std::fs::write(tmp.path().join("q.bin"), &content).unwrap();
        let groups = find_duplicates(&scan_records(tmp.path()), MIN_CHUNK_SIZE, 100).groups;

        let result = remove_duplicates(&groups, &[], ExecutionMode::Preview, &NullSink);
        assert!(result.success);
        assert_eq!(result.processed_count, 2);
        assert!(tmp.path().join("p.bin").exists());
        assert!(tmp.path().join("q.bin").exists());
        assert_eq!(result.summary["removed"], 1);
        assert_eq!(result.summary["kept"], 1);
    }

    #[test]
    fn test_remove_execute_keeps_one_survivor() {
        let tmp = tempdir().unwrap();
        let content = "z".repeat(256);
        std::fs::write(tmp.path().join("p.bin"), &content).unwrap();
        std::fs::write(tmp.path().join("q.bin"), &content).unwrap();
        let groups = find_duplicates(&scan_records(tmp.path()), MIN_CHUNK_SIZE, 100).groups;

        let result = remove_duplicates(&groups, &[], ExecutionMode::Execute, &NullSink);
        assert!(result.success);
        assert_eq!(result.processed_count, 2);
        assert_eq!(result.summary["space_saved"], 256);

        let survivors: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(survivors.len(), 1);
    }

    #[test]
    fn test_archive_moves_with_unique_names() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir(&src).unwrap();
        let sub = src.join("sub");
        std::fs::create_dir(&sub).unwrap();
        let content = "z".repeat(256);
        // Same name in two directories so the archive must disambiguate
        std::fs::write(src.join("dup.bin"), &content).unwrap();
        std::fs::write(sub.join("dup.bin"), &content).unwrap();
        std::fs::write(src.join("solo.bin"), "w".repeat(300)).unwrap();

        let records = scan_records(&src);
        let groups = find_duplicates(&records, MIN_CHUNK_SIZE, 100).groups;
        assert_eq!(groups.len(), 1);

        let archive = tmp.path().join("archive");
        let result =
            archive_duplicates(&groups, &[], &archive, ExecutionMode::Execute, &NullSink)
                .unwrap();
        assert!(result.success);
        assert_eq!(result.processed_count, 2);
        assert_eq!(result.summary["archived"], 1);
        assert!(archive.join("dup.bin").exists());
    }

    #[test]
    fn test_error_accounting_for_blocked_group() {
        let tmp = tempdir().unwrap();
        let content = "z".repeat(256);
        std::fs::write(tmp.path().join("p.bin"), &content).unwrap();
        std::fs::write(tmp.path().join("q.bin"), &content).unwrap();
        let groups = find_duplicates(&scan_records(tmp.path()), MIN_CHUNK_SIZE, 100).groups;

        let bad = vec![GroupSelection {
            group_index: 0,
            keep_indices: vec![],
        }];
        let result = remove_duplicates(&groups, &bad, ExecutionMode::Execute, &NullSink);
        assert!(!result.success);
        // Every member of the blocked group is accounted for as an error
        assert_eq!(result.processed_count + result.error_list.len(), 2);
        assert!(tmp.path().join("p.bin").exists());
        assert!(tmp.path().join("q.bin").exists());
    }
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 filekeeper contributors

//! Path validation gating every engine entry point

use std::fs;
use std::path::{Path, PathBuf};

use crate::{FilekeeperError, Result};

/// Validate a user-supplied directory path.
///
/// Checks, in order: non-empty after trimming whitespace and quotes,
/// resolvable to an existing directory, listable by the current process,
/// and inside one of `allowed_roots` when the list is non-empty. Returns
/// the canonical absolute path.
pub fn validate_path(raw: &str, allowed_roots: &[PathBuf]) -> Result<PathBuf> {
    let trimmed = raw.trim().trim_matches('"').trim_matches('\'').trim();
    if trimmed.is_empty() {
        return Err(FilekeeperError::InvalidPath("path is empty".to_string()));
    }

    let expanded = expand_home(trimmed);
    let canonical = fs::canonicalize(&expanded).map_err(|e| {
        FilekeeperError::InvalidPath(format!("cannot resolve {}: {}", expanded.display(), e))
    })?;

    if !canonical.is_dir() {
        return Err(FilekeeperError::InvalidPath(format!(
            "{} is not a directory",
            canonical.display()
        )));
    }

    // Listability probe; permission errors surface here instead of mid-walk
    fs::read_dir(&canonical).map_err(|e| {
        FilekeeperError::InvalidPath(format!(
            "{} is not readable: {}",
            canonical.display(),
            e
        ))
    })?;

    if !allowed_roots.is_empty() && !within_roots(&canonical, allowed_roots) {
        return Err(FilekeeperError::InvalidPath(format!(
            "{} is outside the allowed roots",
            canonical.display()
        )));
    }

    Ok(canonical)
}

/// Validate a destination directory that may not exist yet.
///
/// The allow-list check cannot canonicalize a path that is not on disk,
/// so the nearest existing ancestor is resolved instead and the
/// not-yet-created trailing components are re-joined onto it before the
/// roots check. The directory itself is not created here.
pub fn validate_destination(raw: &str, allowed_roots: &[PathBuf]) -> Result<PathBuf> {
    let trimmed = raw.trim().trim_matches('"').trim_matches('\'').trim();
    if trimmed.is_empty() {
        return Err(FilekeeperError::InvalidPath("path is empty".to_string()));
    }

    let expanded = expand_home(trimmed);
    let mut existing = expanded.clone();
    let mut pending: Vec<std::ffi::OsString> = Vec::new();
    while !existing.exists() {
        match existing.file_name() {
            Some(name) => {
                pending.push(name.to_os_string());
                existing = match existing.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                    _ => PathBuf::from("."),
                };
            }
            None => {
                return Err(FilekeeperError::InvalidPath(format!(
                    "cannot resolve {}",
                    expanded.display()
                )));
            }
        }
    }

    if !pending.is_empty() && !existing.is_dir() {
        return Err(FilekeeperError::InvalidPath(format!(
            "{} is not a directory",
            existing.display()
        )));
    }

    let mut resolved = fs::canonicalize(&existing).map_err(|e| {
        FilekeeperError::InvalidPath(format!("cannot resolve {}: {}", existing.display(), e))
    })?;
    for name in pending.iter().rev() {
        resolved.push(name);
    }

    if resolved.is_file() {
        return Err(FilekeeperError::InvalidPath(format!(
            "{} is not a directory",
            resolved.display()
        )));
    }

    if !allowed_roots.is_empty() && !within_roots(&resolved, allowed_roots) {
        return Err(FilekeeperError::InvalidPath(format!(
            "{} is outside the allowed roots",
            resolved.display()
        )));
    }

    Ok(resolved)
}

fn within_roots(path: &Path, roots: &[PathBuf]) -> bool {
    roots.iter().any(|root| {
        fs::canonicalize(root)
            .map(|r| path.starts_with(&r))
            .unwrap_or(false)
    })
}

fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_path_rejected() {
        for raw in ["", "   ", "\"\"", "''"] {
            assert!(matches!(
                validate_path(raw, &[]),
                Err(FilekeeperError::InvalidPath(_))
            ));
        }
    }

    #[test]
    fn test_missing_path_rejected() {
        let err = validate_path("/definitely/not/a/real/dir", &[]);
        assert!(matches!(err, Err(FilekeeperError::InvalidPath(_))));
    }

    #[test]
    fn test_file_is_not_a_directory() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();
        let err = validate_path(file.to_str().unwrap(), &[]);
        assert!(matches!(err, Err(FilekeeperError::InvalidPath(_))));
    }

    #[test]
    fn test_valid_directory_is_canonicalized() {
        let tmp = tempdir().unwrap();
        let quoted = format!("\"{}\"", tmp.path().display());
        let validated = validate_path(&quoted, &[]).unwrap();
        assert_eq!(validated, tmp.path().canonicalize().unwrap());
    }

    #[test]
    fn test_allowed_roots_enforced() {
        let inside = tempdir().unwrap();
        let outside = tempdir().unwrap();
        let roots = vec![inside.path().to_path_buf()];

        let sub = inside.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        assert!(validate_path(sub.to_str().unwrap(), &roots).is_ok());

        let err = validate_path(outside.path().to_str().unwrap(), &roots);
        assert!(matches!(err, Err(FilekeeperError::InvalidPath(_))));
    }

    #[test]
    fn test_destination_may_not_exist_yet() {
        let tmp = tempdir().unwrap();
        let dest = tmp.path().join("archive").join("dupes");

        let resolved = validate_destination(dest.to_str().unwrap(), &[]).unwrap();
        assert_eq!(
            resolved,
            tmp.path().canonicalize().unwrap().join("archive").join("dupes")
        );
        // Validation never creates the directory
        assert!(!dest.exists());
    }

    #[test]
    fn test_destination_outside_roots_rejected() {
        let inside = tempdir().unwrap();
        let outside = tempdir().unwrap();
        let roots = vec![inside.path().to_path_buf()];

        let ok = inside.path().join("new_archive");
        assert!(validate_destination(ok.to_str().unwrap(), &roots).is_ok());

        // The leaf does not exist, but its resolved location is still
        // checked against the allow-list
        let bad = outside.path().join("new_archive");
        let err = validate_destination(bad.to_str().unwrap(), &roots);
        assert!(matches!(err, Err(FilekeeperError::InvalidPath(_))));
    }

    #[test]
    fn test_destination_under_file_rejected() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("plain.txt");
        std::fs::write(&file, "x").unwrap();

        let under_file = file.join("sub");
        let err = validate_destination(under_file.to_str().unwrap(), &[]);
        assert!(matches!(err, Err(FilekeeperError::InvalidPath(_))));

        let err = validate_destination(file.to_str().unwrap(), &[]);
        assert!(matches!(err, Err(FilekeeperError::InvalidPath(_))));
    }
}

// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 filekeeper contributors

//! Filename generation: sanitization and collision-free uniqueness

use chrono::Local;
use std::collections::HashSet;
use std::path::PathBuf;

/// Maximum generated name length, extension not counted.
pub const MAX_NAME_LENGTH: usize = 50;

/// Turn raw extracted text into a filesystem-safe name stem.
///
/// Whitespace runs collapse to single underscores, everything outside
/// `[A-Za-z0-9_\-.]` is stripped, underscore runs collapse, and the result
/// is trimmed to `max_length` characters. Returns `None` when nothing
/// alphanumeric survives; callers fall back to [`fallback_name`].
pub fn sanitize(raw: &str, max_length: usize) -> Option<String> {
    let joined = raw.split_whitespace().collect::<Vec<_>>().join("_");

    let mut clean: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();

    while clean.contains("__") {
        clean = clean.replace("__", "_");
    }
    clean = clean.trim_matches(|c| c == '_' || c == '.').to_string();

    if clean.len() > max_length {
        clean.truncate(max_length);
        clean = clean.trim_end_matches(|c| c == '_' || c == '.').to_string();
    }

    if clean.chars().any(|c| c.is_ascii_alphanumeric()) {
        Some(clean)
    } else {
        None
    }
}

/// Deterministic timestamp-based name used when sanitization yields
/// nothing usable (empty OCR output, punctuation-only text).
pub fn fallback_name(prefix: &str) -> String {
    format!("{}_{}", prefix, Local::now().format("%Y%m%d_%H%M%S"))
}

/// Batch-local name reservation for one destination directory.
///
/// A name returned by [`ensure_unique`](Self::ensure_unique) is claimed in
/// memory immediately, so two files in the same batch can never race to
/// the same generated name even before the filesystem is touched.
#[derive(Debug)]
pub struct NameReserver {
    dir: PathBuf,
    claimed: HashSet<String>,
}

impl NameReserver {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            claimed: HashSet::new(),
        }
    }

    /// Return `candidate` if it is free in the directory and unclaimed in
    /// this batch, otherwise probe `stem_1`, `stem_2`, … ascending until a
    /// free name is found. Terminates within directory size + batch size
    /// + 1 probes.
    pub fn ensure_unique(&mut self, candidate: &str) -> String {
        if self.is_free(candidate) {
            self.claimed.insert(candidate.to_string());
            return candidate.to_string();
        }

        let (stem, ext) = split_name(candidate);
        let mut counter = 1usize;
        loop {
            let probe = format!("{}_{}{}", stem, counter, ext);
            if self.is_free(&probe) {
                self.claimed.insert(probe.clone());
                return probe;
            }
            counter += 1;
        }
    }

    fn is_free(&self, name: &str) -> bool {
        !self.claimed.contains(name) && !self.dir.join(name).exists()
    }
}

/// Split a filename into (stem, extension-with-dot).
fn split_name(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    }
}

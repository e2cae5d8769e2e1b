// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 filekeeper contributors

//! Streaming content digests for duplicate detection

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::{FilekeeperError, Result};

/// Smallest allowed read size. Configured chunk sizes below this are
/// clamped up.
pub const MIN_CHUNK_SIZE: usize = 4096;

/// Compute the BLAKE3 digest of a file's content, reading in
/// `chunk_size`-byte chunks, and return it as lowercase hex.
///
/// Equal byte content always yields equal digests regardless of name,
/// path, or metadata. Open/read failures are reported as
/// [`FilekeeperError::Hash`] for this file only so batch callers can skip
/// it and continue.
pub fn digest_file(path: &Path, chunk_size: usize) -> Result<String> {
    let chunk_size = chunk_size.max(MIN_CHUNK_SIZE);

    let mut file = File::open(path).map_err(|e| FilekeeperError::Hash {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; chunk_size];

    loop {
        let read = file.read(&mut buffer).map_err(|e| FilekeeperError::Hash {
            path: path.to_path_buf(),
            source: e,
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_identical_content_hashes_equal() {
        let tmp = tempdir().unwrap();
        let a = tmp.path().join("a.bin");
        let b = tmp.path().join("renamed.dat");
        let payload = vec![0x5Au8; 10_000];
        std::fs::write(&a, &payload).unwrap();
        std::fs::write(&b, &payload).unwrap();

        assert_eq!(
            digest_file(&a, MIN_CHUNK_SIZE).unwrap(),
            digest_file(&b, MIN_CHUNK_SIZE).unwrap()
        );
    }

    #[test]
    fn test_single_byte_difference_changes_digest() {
        let tmp = tempdir().unwrap();
        let a = tmp.path().join("a.bin");
        let b = tmp.path().join("b.bin");
        let mut payload = vec![0x5Au8; 10_000];
        std::fs::write(&a, &payload).unwrap();
        payload[9_999] ^= 1;
        std::fs::write(&b, &payload).unwrap();

        assert_ne!(
            digest_file(&a, MIN_CHUNK_SIZE).unwrap(),
            digest_file(&b, MIN_CHUNK_SIZE).unwrap()
        );
    }

    #[test]
    fn test_chunk_size_does_not_affect_digest() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("data.bin");
        std::fs::write(&path, vec![7u8; 100_000]).unwrap();

        let small = digest_file(&path, MIN_CHUNK_SIZE).unwrap();
        let large = digest_file(&path, 1 << 20).unwrap();
        // Chunk sizes below the floor are clamped, not honored
        let clamped = digest_file(&path, 1).unwrap();
        assert_eq!(small, large);
        assert_eq!(small, clamped);
    }

    #[test]
    fn test_missing_file_is_hash_error() {
        let tmp = tempdir().unwrap();
        let err = digest_file(&tmp.path().join("ghost"), MIN_CHUNK_SIZE);
        assert!(matches!(err, Err(FilekeeperError::Hash { .. })));
    }
}

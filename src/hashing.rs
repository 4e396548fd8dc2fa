// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Content hashing for change detection.
//!
//! File hashes back `when_file_changed` conditions and the leader's
//! `pool-yaml-hash`; value hashes detect charm configuration changes between
//! invocations.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Hash recorded for a path that does not exist.
pub const ABSENT_HASH: &str = "absent";

/// Calculate a SHA-256 hash of any serializable value.
///
/// The value is serialized to JSON first, so two values that serialize the
/// same way hash the same way. Map-ordered types (`BTreeMap`) give stable hashes.
#[must_use]
pub fn calculate_hash<T: Serialize>(data: &T) -> String {
    let json = serde_json::to_string(data).unwrap_or_default();
    hash_bytes(json.as_bytes())
}

/// Hex-encoded SHA-256 of raw bytes.
#[must_use]
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Hash of a file's current content, or [`ABSENT_HASH`] when it does not exist.
///
/// # Errors
///
/// Returns I/O errors other than "not found".
pub fn file_content_hash(path: &Path) -> std::io::Result<String> {
    Ok(crate::io::read_optional(path)?
        .map_or_else(|| ABSENT_HASH.to_string(), |bytes| hash_bytes(&bytes)))
}

#[cfg(test)]
#[path = "hashing_tests.rs"]
mod hashing_tests;

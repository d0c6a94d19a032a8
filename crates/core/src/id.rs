// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage identifiers and revision numbers

use crate::blob::BlobHash;
use crate::path::StoragePath;
use serde::{Deserialize, Serialize};

/// Identifier of one storage binding within a file.
///
/// Paths and blob hashes share a single namespace: the same ID is never
/// bound as both a path slot and a blob at once.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StorageId {
    Path(StoragePath),
    Blob(BlobHash),
}

impl std::fmt::Display for StorageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageId::Path(path) => write!(f, "{path}"),
            StorageId::Blob(hash) => write!(f, "blob:{hash}"),
        }
    }
}

impl From<StoragePath> for StorageId {
    fn from(path: StoragePath) -> Self {
        StorageId::Path(path)
    }
}

impl From<BlobHash> for StorageId {
    fn from(hash: BlobHash) -> Self {
        StorageId::Blob(hash)
    }
}

/// Monotonically increasing revision number of a committed file state
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RevNum(pub u64);

impl RevNum {
    pub fn next(self) -> RevNum {
        RevNum(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RevNum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The vocabulary of atomic storage operations

use crate::blob::{Blob, BlobHash};
use crate::id::{RevNum, StorageId};
use crate::path::StoragePath;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors from malformed operation properties
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpError {
    #[error("inverted range [{start}, {end}) for delete under {path}")]
    InvertedRange {
        path: StoragePath,
        start: u64,
        end: u64,
    },
}

/// Category of an operation, in canonical processing order.
///
/// A transaction's operations are always sorted into this order before
/// execution, so checks run before any effect accumulates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OpCategory {
    Check,
    Delete,
    Write,
    Read,
    List,
    Wait,
    Timeout,
}

impl OpCategory {
    /// Whether ops of this category mutate file state
    pub fn is_push(self) -> bool {
        matches!(self, OpCategory::Delete | OpCategory::Write)
    }

    /// Whether ops of this category retrieve file state
    pub fn is_pull(self) -> bool {
        matches!(self, OpCategory::Read | OpCategory::List)
    }

    pub fn is_wait(self) -> bool {
        matches!(self, OpCategory::Wait)
    }
}

impl std::fmt::Display for OpCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OpCategory::Check => "check",
            OpCategory::Delete => "delete",
            OpCategory::Write => "write",
            OpCategory::Read => "read",
            OpCategory::List => "list",
            OpCategory::Wait => "wait",
            OpCategory::Timeout => "timeout",
        };
        write!(f, "{name}")
    }
}

/// A single storage operation.
///
/// Each variant's fields are fixed by its name and immutable once
/// constructed. Ranges are half-open: `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileOp {
    /// Fail unless a blob with this hash is stored
    CheckBlobHash { hash: BlobHash },

    /// Fail if the path is bound
    CheckPathEmpty { path: StoragePath },

    /// Fail unless the path is bound
    CheckPathExists { path: StoragePath },

    /// Fail unless the path is bound to a blob with this hash
    CheckPathHash { path: StoragePath, hash: BlobHash },

    /// Fail if the current revision is below this one
    MinRevNum { rev_num: RevNum },

    /// Fail if the current revision is above this one
    MaxRevNum { rev_num: RevNum },

    /// Remove every binding
    DeleteAll,

    /// Remove the blob with this hash, if stored
    DeleteBlob { hash: BlobHash },

    /// Unbind the path, if bound
    DeletePath { path: StoragePath },

    /// Unbind the prefix itself and every path under it
    DeletePathPrefix { prefix: StoragePath },

    /// Unbind direct children of `path` whose decimal name is in `[start, end)`
    DeletePathRange {
        path: StoragePath,
        start: u64,
        end: u64,
    },

    /// Store a blob under its content hash
    WriteBlob { blob: Blob },

    /// Bind the path to the given blob
    WritePath { path: StoragePath, blob: Blob },

    /// Retrieve the blob with this hash
    ReadBlob { hash: BlobHash },

    /// Retrieve the blob bound to this path
    ReadPath { path: StoragePath },

    /// Retrieve every bound path at or under this prefix
    ListPathPrefix { prefix: StoragePath },

    /// Block until the path is unbound
    WhenPathAbsent { path: StoragePath },

    /// Block until the path is bound
    WhenPathPresent { path: StoragePath },

    /// Bound the whole transaction's duration
    Timeout { duration: Duration },
}

impl FileOp {
    pub fn category(&self) -> OpCategory {
        match self {
            FileOp::CheckBlobHash { .. }
            | FileOp::CheckPathEmpty { .. }
            | FileOp::CheckPathExists { .. }
            | FileOp::CheckPathHash { .. }
            | FileOp::MinRevNum { .. }
            | FileOp::MaxRevNum { .. } => OpCategory::Check,
            FileOp::DeleteAll
            | FileOp::DeleteBlob { .. }
            | FileOp::DeletePath { .. }
            | FileOp::DeletePathPrefix { .. }
            | FileOp::DeletePathRange { .. } => OpCategory::Delete,
            FileOp::WriteBlob { .. } | FileOp::WritePath { .. } => OpCategory::Write,
            FileOp::ReadBlob { .. } | FileOp::ReadPath { .. } => OpCategory::Read,
            FileOp::ListPathPrefix { .. } => OpCategory::List,
            FileOp::WhenPathAbsent { .. } | FileOp::WhenPathPresent { .. } => OpCategory::Wait,
            FileOp::Timeout { .. } => OpCategory::Timeout,
        }
    }

    /// Check the op's properties beyond what its types already guarantee
    pub fn validate(&self) -> Result<(), OpError> {
        match self {
            FileOp::DeletePathRange { path, start, end } if start > end => {
                Err(OpError::InvertedRange {
                    path: path.clone(),
                    start: *start,
                    end: *end,
                })
            }
            _ => Ok(()),
        }
    }

    /// The single storage ID this op binds or unbinds, for per-ID ops
    pub fn target_id(&self) -> Option<StorageId> {
        match self {
            FileOp::WriteBlob { blob } => Some(StorageId::Blob(blob.hash())),
            FileOp::WritePath { path, .. }
            | FileOp::DeletePath { path }
            | FileOp::ReadPath { path } => Some(StorageId::Path(path.clone())),
            FileOp::DeleteBlob { hash } | FileOp::ReadBlob { hash } => {
                Some(StorageId::Blob(hash.clone()))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "op_tests.rs"]
mod tests;

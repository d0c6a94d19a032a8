// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution of one transaction against one snapshot

use crate::blob::{Blob, BlobHash};
use crate::delta::FileDelta;
use crate::id::{RevNum, StorageId};
use crate::op::FileOp;
use crate::path::StoragePath;
use crate::snapshot::FileSnapshot;
use crate::transaction::TransactionSpec;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Recoverable check-op failures; callers re-read and retry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("no blob stored with hash {hash}")]
    BlobMissing { hash: BlobHash },
    #[error("path is already bound: {path}")]
    PathNotEmpty { path: StoragePath },
    #[error("path is not bound: {path}")]
    PathMissing { path: StoragePath },
    #[error("hash mismatch at {path}: expected {expected}, found {actual}")]
    PathHashMismatch {
        path: StoragePath,
        expected: BlobHash,
        actual: BlobHash,
    },
    #[error("revision {actual} is below the required minimum {min}")]
    RevNumTooLow { min: RevNum, actual: RevNum },
    #[error("revision {actual} is above the allowed maximum {max}")]
    RevNumTooHigh { max: RevNum, actual: RevNum },
}

/// Result of one transactor run, one variant per transaction shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    /// Read results; absent targets are omitted, not bound to a sentinel
    Pull {
        data: BTreeMap<StorageId, Blob>,
        paths: BTreeSet<StoragePath>,
    },
    /// The pending change accumulated from the spec's write/delete ops
    Push { delta: FileDelta },
    /// Whether every wait predicate held against the snapshot
    Wait { satisfied: bool },
}

/// Executes a validated spec against a concrete snapshot.
///
/// Stateless across runs; everything a run accumulates lives in its
/// locals. Checks run first (canonical op order), so a precondition
/// failure aborts before any effect is recorded.
pub struct Transactor;

impl Transactor {
    pub fn run(
        spec: &TransactionSpec,
        snapshot: &FileSnapshot,
    ) -> Result<TransactionOutcome, PreconditionError> {
        let mut data = BTreeMap::new();
        let mut paths = BTreeSet::new();
        let mut pending = Vec::new();
        let mut satisfied = true;

        for op in spec.ops() {
            match op {
                FileOp::CheckBlobHash { hash } => {
                    let id = StorageId::Blob(hash.clone());
                    if snapshot.get_or_null(&id).is_none() {
                        return Err(PreconditionError::BlobMissing { hash: hash.clone() });
                    }
                }
                FileOp::CheckPathEmpty { path } => {
                    if snapshot.get_or_null(&StorageId::Path(path.clone())).is_some() {
                        return Err(PreconditionError::PathNotEmpty { path: path.clone() });
                    }
                }
                FileOp::CheckPathExists { path } => {
                    if snapshot.get_or_null(&StorageId::Path(path.clone())).is_none() {
                        return Err(PreconditionError::PathMissing { path: path.clone() });
                    }
                }
                FileOp::CheckPathHash { path, hash } => {
                    let id = StorageId::Path(path.clone());
                    let Some(blob) = snapshot.get_or_null(&id) else {
                        return Err(PreconditionError::PathMissing { path: path.clone() });
                    };
                    let actual = blob.hash();
                    if actual != *hash {
                        return Err(PreconditionError::PathHashMismatch {
                            path: path.clone(),
                            expected: hash.clone(),
                            actual,
                        });
                    }
                }
                FileOp::MinRevNum { rev_num } => {
                    if snapshot.rev_num() < *rev_num {
                        return Err(PreconditionError::RevNumTooLow {
                            min: *rev_num,
                            actual: snapshot.rev_num(),
                        });
                    }
                }
                FileOp::MaxRevNum { rev_num } => {
                    if snapshot.rev_num() > *rev_num {
                        return Err(PreconditionError::RevNumTooHigh {
                            max: *rev_num,
                            actual: snapshot.rev_num(),
                        });
                    }
                }
                FileOp::DeleteAll
                | FileOp::DeleteBlob { .. }
                | FileOp::DeletePath { .. }
                | FileOp::DeletePathPrefix { .. }
                | FileOp::DeletePathRange { .. }
                | FileOp::WriteBlob { .. }
                | FileOp::WritePath { .. } => pending.push(op.clone()),
                FileOp::ReadBlob { hash } => {
                    let id = StorageId::Blob(hash.clone());
                    if let Some(blob) = snapshot.get_or_null(&id) {
                        data.insert(id, blob.clone());
                    }
                }
                FileOp::ReadPath { path } => {
                    let id = StorageId::Path(path.clone());
                    if let Some(blob) = snapshot.get_or_null(&id) {
                        data.insert(id, blob.clone());
                    }
                }
                FileOp::ListPathPrefix { prefix } => {
                    paths.extend(
                        snapshot
                            .paths()
                            .filter(|path| prefix.is_prefix_of(path))
                            .cloned(),
                    );
                }
                FileOp::WhenPathAbsent { path } => {
                    satisfied &= snapshot
                        .get_or_null(&StorageId::Path(path.clone()))
                        .is_none();
                }
                FileOp::WhenPathPresent { path } => {
                    satisfied &= snapshot
                        .get_or_null(&StorageId::Path(path.clone()))
                        .is_some();
                }
                // The engine races the whole transaction against the timeout.
                FileOp::Timeout { .. } => {}
            }
        }

        if spec.has_push_ops() {
            Ok(TransactionOutcome::Push {
                delta: FileDelta::from_ops(pending),
            })
        } else if spec.has_wait_ops() {
            Ok(TransactionOutcome::Wait { satisfied })
        } else {
            Ok(TransactionOutcome::Pull { data, paths })
        }
    }
}

#[cfg(test)]
#[path = "transactor_tests.rs"]
mod tests;

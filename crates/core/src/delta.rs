// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composable change deltas
//!
//! A delta is an ordered list of write/delete ops describing a change to
//! apply. A *document* is the restricted form with only writes and no ID
//! bound twice; snapshots are documents, change-log entries need not be.

use crate::id::{RevNum, StorageId};
use crate::op::{FileOp, OpCategory, OpError};
use crate::path::StoragePath;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from delta construction and composition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposeError {
    #[error("document-mode composition requires a document receiver")]
    NotADocument,
    #[error("delta cannot carry a {category} op")]
    NotAChangeOp { category: OpCategory },
    #[error(transparent)]
    Op(#[from] OpError),
}

/// An immutable sequence of write/delete ops representing a change to apply
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileDelta {
    ops: Vec<FileOp>,
}

impl FileDelta {
    pub fn new(ops: Vec<FileOp>) -> Result<Self, ComposeError> {
        for op in &ops {
            let category = op.category();
            if !category.is_push() {
                return Err(ComposeError::NotAChangeOp { category });
            }
            op.validate()?;
        }
        Ok(Self { ops })
    }

    /// A delta with no ops
    pub fn empty() -> Self {
        Self::default()
    }

    /// Construct from ops already known to be push-category
    pub(crate) fn from_ops(ops: Vec<FileOp>) -> Self {
        Self { ops }
    }

    pub fn ops(&self) -> &[FileOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Whether this delta is a document: only writes, no ID bound twice
    pub fn is_document(&self) -> bool {
        let mut seen = std::collections::BTreeSet::new();
        self.ops.iter().all(|op| {
            op.category() == OpCategory::Write
                && op.target_id().is_some_and(|id| seen.insert(id))
        })
    }

    /// Compose this delta with a later one.
    ///
    /// `other`'s ops win over this delta's ops for the same storage ID. The
    /// result binds each ID at most once. With `want_document` set, deletes
    /// from `other` are executed but not retained and the receiver must
    /// already be a document; without it, deletes survive as tombstones.
    pub fn compose(&self, other: &FileDelta, want_document: bool) -> Result<FileDelta, ComposeError> {
        if want_document && !self.is_document() {
            return Err(ComposeError::NotADocument);
        }
        let mut state = ComposeState::new(!want_document);
        for op in &self.ops {
            state.apply(op);
        }
        for op in &other.ops {
            state.apply(op);
        }
        Ok(state.into_delta())
    }
}

/// Working state for one composition pass
struct ComposeState {
    /// Keep deletes in the output as tombstones
    retain_deletes: bool,
    /// A surviving `DeleteAll` tombstone precedes everything else
    delete_all: bool,
    /// Surviving prefix/range sweeps, in encounter order
    sweeps: Vec<FileOp>,
    /// Per-ID ops, each ID bound at most once
    bound: BTreeMap<StorageId, FileOp>,
}

impl ComposeState {
    fn new(retain_deletes: bool) -> Self {
        Self {
            retain_deletes,
            delete_all: false,
            sweeps: Vec::new(),
            bound: BTreeMap::new(),
        }
    }

    fn apply(&mut self, op: &FileOp) {
        match op {
            FileOp::WriteBlob { .. } | FileOp::WritePath { .. } => {
                if let Some(id) = op.target_id() {
                    self.bound.insert(id, op.clone());
                }
            }
            FileOp::DeleteAll => {
                self.bound.clear();
                self.sweeps.clear();
                self.delete_all = self.retain_deletes;
            }
            FileOp::DeleteBlob { .. } | FileOp::DeletePath { .. } => {
                if let Some(id) = op.target_id() {
                    self.bound.remove(&id);
                    if self.retain_deletes {
                        self.bound.insert(id, op.clone());
                    }
                }
            }
            FileOp::DeletePathPrefix { prefix } => {
                self.sweep(|path| prefix.is_prefix_of(path));
                if self.retain_deletes {
                    self.sweeps.push(op.clone());
                }
            }
            FileOp::DeletePathRange { path, start, end } => {
                self.sweep(|candidate| {
                    candidate
                        .numeric_child_of(path)
                        .is_some_and(|n| (*start..*end).contains(&n))
                });
                if self.retain_deletes {
                    self.sweeps.push(op.clone());
                }
            }
            // Checks, reads, lists, waits, and timeouts never reach a delta.
            _ => {}
        }
    }

    fn sweep(&mut self, mut matches: impl FnMut(&StoragePath) -> bool) {
        self.bound.retain(|id, _| match id {
            StorageId::Path(path) => !matches(path),
            StorageId::Blob(_) => true,
        });
    }

    fn into_delta(self) -> FileDelta {
        let mut ops =
            Vec::with_capacity(usize::from(self.delete_all) + self.sweeps.len() + self.bound.len());
        if self.delete_all {
            ops.push(FileOp::DeleteAll);
        }
        ops.extend(self.sweeps);
        ops.extend(self.bound.into_values());
        FileDelta { ops }
    }
}

/// One committed transaction's effect: the atomic unit persisted per revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub rev_num: RevNum,
    pub delta: FileDelta,
}

impl FileChange {
    pub fn new(rev_num: RevNum, delta: FileDelta) -> Self {
        Self { rev_num, delta }
    }
}

#[cfg(test)]
#[path = "delta_tests.rs"]
mod tests;

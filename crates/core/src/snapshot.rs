// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized point-in-time document views

use crate::blob::Blob;
use crate::delta::{ComposeError, FileChange, FileDelta};
use crate::id::{RevNum, StorageId};
use crate::op::FileOp;
use crate::path::StoragePath;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from snapshot accessors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("no binding for {0}")]
    Unbound(StorageId),
}

/// A revision number paired with the document it identifies.
///
/// The contents are always a document: every ID bound exactly once, to a
/// blob. Snapshots are never mutated; composing a change yields a new one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileSnapshot {
    rev_num: RevNum,
    contents: BTreeMap<StorageId, Blob>,
}

impl FileSnapshot {
    /// The revision-zero snapshot of an empty file
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from a document delta
    pub fn new(rev_num: RevNum, delta: &FileDelta) -> Result<Self, ComposeError> {
        if !delta.is_document() {
            return Err(ComposeError::NotADocument);
        }
        let mut snapshot = Self {
            rev_num,
            contents: BTreeMap::new(),
        };
        snapshot.apply(delta);
        Ok(snapshot)
    }

    pub fn rev_num(&self) -> RevNum {
        self.rev_num
    }

    /// Apply one committed change, adopting its revision number
    pub fn compose(&self, change: &FileChange) -> FileSnapshot {
        let mut next = self.clone();
        next.rev_num = change.rev_num;
        next.apply(&change.delta);
        next
    }

    fn apply(&mut self, delta: &FileDelta) {
        for op in delta.ops() {
            match op {
                FileOp::WriteBlob { blob } => {
                    self.contents
                        .insert(StorageId::Blob(blob.hash()), blob.clone());
                }
                FileOp::WritePath { path, blob } => {
                    self.contents
                        .insert(StorageId::Path(path.clone()), blob.clone());
                }
                FileOp::DeleteAll => self.contents.clear(),
                FileOp::DeleteBlob { hash } => {
                    self.contents.remove(&StorageId::Blob(hash.clone()));
                }
                FileOp::DeletePath { path } => {
                    self.contents.remove(&StorageId::Path(path.clone()));
                }
                FileOp::DeletePathPrefix { prefix } => {
                    self.contents.retain(|id, _| match id {
                        StorageId::Path(path) => !prefix.is_prefix_of(path),
                        StorageId::Blob(_) => true,
                    });
                }
                FileOp::DeletePathRange { path, start, end } => {
                    self.contents.retain(|id, _| match id {
                        StorageId::Path(candidate) => !candidate
                            .numeric_child_of(path)
                            .is_some_and(|n| (*start..*end).contains(&n)),
                        StorageId::Blob(_) => true,
                    });
                }
                // Delta construction admits only push-category ops.
                _ => {}
            }
        }
    }

    /// The minimal change turning this snapshot into `other`
    pub fn diff(&self, other: &FileSnapshot) -> FileChange {
        let mut ops = Vec::new();
        for id in self.contents.keys() {
            if !other.contents.contains_key(id) {
                ops.push(match id {
                    StorageId::Path(path) => FileOp::DeletePath { path: path.clone() },
                    StorageId::Blob(hash) => FileOp::DeleteBlob { hash: hash.clone() },
                });
            }
        }
        for (id, blob) in &other.contents {
            if self.contents.get(id) != Some(blob) {
                ops.push(match id {
                    StorageId::Path(path) => FileOp::WritePath {
                        path: path.clone(),
                        blob: blob.clone(),
                    },
                    StorageId::Blob(_) => FileOp::WriteBlob { blob: blob.clone() },
                });
            }
        }
        FileChange::new(other.rev_num, FileDelta::from_ops(ops))
    }

    /// The blob bound to `id`; unbound IDs are an error
    pub fn get(&self, id: &StorageId) -> Result<&Blob, SnapshotError> {
        self.contents
            .get(id)
            .ok_or_else(|| SnapshotError::Unbound(id.clone()))
    }

    /// The blob bound to `id`, or `None`
    pub fn get_or_null(&self, id: &StorageId) -> Option<&Blob> {
        self.contents.get(id)
    }

    /// Every binding, in ID order
    pub fn entries(&self) -> impl Iterator<Item = (&StorageId, &Blob)> {
        self.contents.iter()
    }

    /// Every bound path, in order
    pub fn paths(&self) -> impl Iterator<Item = &StoragePath> {
        self.contents.keys().filter_map(|id| match id {
            StorageId::Path(path) => Some(path),
            StorageId::Blob(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    /// The document as a canonical write-only delta
    pub fn to_delta(&self) -> FileDelta {
        let ops = self
            .contents
            .iter()
            .map(|(id, blob)| match id {
                StorageId::Path(path) => FileOp::WritePath {
                    path: path.clone(),
                    blob: blob.clone(),
                },
                StorageId::Blob(_) => FileOp::WriteBlob { blob: blob.clone() },
            })
            .collect();
        FileDelta::from_ops(ops)
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the storage engine

use crate::codec::CodecError;
use quill_core::{ComposeError, PreconditionError, RevNum, SpecError};
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by file operations
#[derive(Debug, Error)]
pub enum FileError {
    /// The file does not exist; recoverable by calling `create()`
    #[error("file not found")]
    NotFound,

    /// The transaction's time budget expired; always safe to retry
    #[error("transaction timed out after {limit:?}")]
    Timeout { limit: Duration },

    /// The on-disk revision sequence has a hole; fatal
    #[error("revision log has a gap: expected revision {expected}, found {found}")]
    RevisionGap { expected: RevNum, found: RevNum },

    /// A revision file's contents disagree with its name; fatal
    #[error("revision file {file} contains revision {found}")]
    RevisionMismatch { file: String, found: RevNum },

    /// A revision file failed to decode; fatal
    #[error("corrupt revision file {file}: {source}")]
    CorruptChange { file: String, source: CodecError },

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Compose(#[from] ComposeError),
}

impl FileError {
    /// Whether retrying (possibly after a re-read) can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, FileError::Timeout { .. } | FileError::Precondition(_))
    }

    /// Whether the on-disk state is damaged; such a file is refused, and
    /// the condition should reach a human rather than be retried
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            FileError::RevisionGap { .. }
                | FileError::RevisionMismatch { .. }
                | FileError::CorruptChange { .. }
        )
    }
}

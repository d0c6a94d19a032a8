// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Validated transaction specifications

use crate::op::{FileOp, OpCategory, OpError};
use std::time::Duration;
use thiserror::Error;

/// Usage errors from assembling a transaction
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("transaction has more than one timeout op")]
    MultipleTimeouts,
    #[error("transaction has more than one revision restriction op")]
    MultipleRevRestrictions,
    #[error("wait ops cannot be combined with {category} ops")]
    WaitCombined { category: OpCategory },
    #[error(transparent)]
    Op(#[from] OpError),
}

/// An immutable, category-sorted bundle of operations forming one atomic
/// unit of work.
///
/// Construction sorts the ops into canonical category order and enforces
/// the shape rules: at most one timeout, at most one revision restriction,
/// and wait ops never mixed with push or pull ops. A spec is therefore
/// always exactly one of three shapes: pull, push, or wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionSpec {
    ops: Vec<FileOp>,
    has_push: bool,
    has_pull: bool,
    has_wait: bool,
    timeout: Option<Duration>,
}

impl TransactionSpec {
    pub fn new(mut ops: Vec<FileOp>) -> Result<Self, SpecError> {
        for op in &ops {
            op.validate()?;
        }
        ops.sort_by_key(FileOp::category);

        let mut timeouts = 0usize;
        let mut rev_restrictions = 0usize;
        let mut has_push = false;
        let mut has_pull = false;
        let mut has_wait = false;
        let mut timeout = None;
        for op in &ops {
            let category = op.category();
            has_push |= category.is_push();
            has_pull |= category.is_pull();
            has_wait |= category.is_wait();
            match op {
                FileOp::Timeout { duration } => {
                    timeouts += 1;
                    timeout = Some(*duration);
                }
                FileOp::MinRevNum { .. } | FileOp::MaxRevNum { .. } => rev_restrictions += 1,
                _ => {}
            }
        }

        if timeouts > 1 {
            return Err(SpecError::MultipleTimeouts);
        }
        if rev_restrictions > 1 {
            return Err(SpecError::MultipleRevRestrictions);
        }
        if has_wait {
            if let Some(op) = ops.iter().find(|op| {
                let category = op.category();
                category.is_push() || category.is_pull()
            }) {
                return Err(SpecError::WaitCombined {
                    category: op.category(),
                });
            }
        }

        Ok(Self {
            ops,
            has_push,
            has_pull,
            has_wait,
            timeout,
        })
    }

    /// The ops in canonical category order
    pub fn ops(&self) -> &[FileOp] {
        &self.ops
    }

    /// The caller-requested timeout, if any
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn has_push_ops(&self) -> bool {
        self.has_push
    }

    pub fn has_pull_ops(&self) -> bool {
        self.has_pull
    }

    pub fn has_wait_ops(&self) -> bool {
        self.has_wait
    }

    pub fn has_read_ops(&self) -> bool {
        self.ops
            .iter()
            .any(|op| op.category() == OpCategory::Read)
    }

    pub fn has_list_ops(&self) -> bool {
        self.ops
            .iter()
            .any(|op| op.category() == OpCategory::List)
    }
}

#[cfg(test)]
#[path = "transaction_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::blob::Blob;
use crate::id::RevNum;
use crate::path::StoragePath;
use std::time::Duration;

fn path(raw: &str) -> StoragePath {
    StoragePath::new(raw).unwrap()
}

fn write(raw: &str, contents: &str) -> FileOp {
    FileOp::WritePath {
        path: path(raw),
        blob: Blob::new(contents),
    }
}

#[test]
fn ops_are_sorted_into_canonical_order() {
    let spec = TransactionSpec::new(vec![
        FileOp::Timeout {
            duration: Duration::from_secs(5),
        },
        FileOp::ReadPath { path: path("/a") },
        write("/b", "x"),
        FileOp::DeletePath { path: path("/c") },
        FileOp::CheckPathExists { path: path("/d") },
    ])
    .unwrap();

    let categories: Vec<_> = spec.ops().iter().map(FileOp::category).collect();
    assert_eq!(
        categories,
        vec![
            OpCategory::Check,
            OpCategory::Delete,
            OpCategory::Write,
            OpCategory::Read,
            OpCategory::Timeout,
        ]
    );
}

#[test]
fn sort_is_stable_within_a_category() {
    let spec = TransactionSpec::new(vec![write("/a", "1"), write("/a", "2")]).unwrap();
    assert_eq!(spec.ops()[0], write("/a", "1"));
    assert_eq!(spec.ops()[1], write("/a", "2"));
}

#[test]
fn multiple_timeouts_rejected() {
    let err = TransactionSpec::new(vec![
        FileOp::Timeout {
            duration: Duration::from_secs(1),
        },
        FileOp::Timeout {
            duration: Duration::from_secs(2),
        },
    ])
    .unwrap_err();
    assert_eq!(err, SpecError::MultipleTimeouts);
}

#[test]
fn multiple_rev_restrictions_rejected() {
    let err = TransactionSpec::new(vec![
        FileOp::MinRevNum { rev_num: RevNum(1) },
        FileOp::MaxRevNum { rev_num: RevNum(9) },
    ])
    .unwrap_err();
    assert_eq!(err, SpecError::MultipleRevRestrictions);
}

#[test]
fn wait_mixed_with_write_rejected() {
    let err = TransactionSpec::new(vec![
        FileOp::WhenPathPresent { path: path("/x") },
        write("/y", "v"),
    ])
    .unwrap_err();
    assert_eq!(
        err,
        SpecError::WaitCombined {
            category: OpCategory::Write
        }
    );
}

#[test]
fn wait_mixed_with_read_rejected() {
    let err = TransactionSpec::new(vec![
        FileOp::WhenPathPresent { path: path("/x") },
        FileOp::ReadPath { path: path("/y") },
    ])
    .unwrap_err();
    assert_eq!(
        err,
        SpecError::WaitCombined {
            category: OpCategory::Read
        }
    );
}

#[test]
fn wait_with_checks_and_timeout_allowed() {
    let spec = TransactionSpec::new(vec![
        FileOp::WhenPathPresent { path: path("/x") },
        FileOp::MinRevNum { rev_num: RevNum(3) },
        FileOp::Timeout {
            duration: Duration::from_millis(500),
        },
    ])
    .unwrap();
    assert!(spec.has_wait_ops());
    assert!(!spec.has_push_ops());
    assert!(!spec.has_pull_ops());
    assert_eq!(spec.timeout(), Some(Duration::from_millis(500)));
}

#[test]
fn malformed_op_rejected_at_spec_construction() {
    let err = TransactionSpec::new(vec![FileOp::DeletePathRange {
        path: path("/list"),
        start: 9,
        end: 1,
    }])
    .unwrap_err();
    assert!(matches!(err, SpecError::Op(_)));
}

#[test]
fn shape_predicates() {
    let pull = TransactionSpec::new(vec![
        FileOp::ReadPath { path: path("/a") },
        FileOp::ListPathPrefix { prefix: path("/b") },
    ])
    .unwrap();
    assert!(pull.has_pull_ops());
    assert!(pull.has_read_ops());
    assert!(pull.has_list_ops());
    assert!(!pull.has_push_ops());

    let push = TransactionSpec::new(vec![write("/a", "1"), FileOp::DeleteAll]).unwrap();
    assert!(push.has_push_ops());
    assert!(!push.has_pull_ops());
    assert!(!push.has_wait_ops());
}

#[test]
fn empty_spec_is_a_pull() {
    let spec = TransactionSpec::new(vec![]).unwrap();
    assert!(!spec.has_push_ops());
    assert!(!spec.has_pull_ops());
    assert!(!spec.has_wait_ops());
    assert_eq!(spec.timeout(), None);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::codec;
use quill_core::{Blob, FileOp, StoragePath, TransactionSpec};
use std::time::Duration;
use tempfile::TempDir;

fn path(s: &str) -> StoragePath {
    StoragePath::new(s).unwrap()
}

fn spec(ops: Vec<FileOp>) -> TransactionSpec {
    TransactionSpec::new(ops).unwrap()
}

fn write_op(p: &str, contents: &str) -> FileOp {
    FileOp::WritePath {
        path: path(p),
        blob: Blob::new(contents),
    }
}

fn engine(tmp: &TempDir) -> Arc<LocalFile> {
    LocalFile::new(tmp.path().join("file"), StorageConfig::for_testing())
}

async fn read(file: &Arc<LocalFile>, p: &str) -> Option<Blob> {
    let result = file
        .transact(spec(vec![FileOp::ReadPath { path: path(p) }]))
        .await
        .unwrap();
    let mut data = result.data.unwrap();
    data.remove(&StorageId::Path(path(p)))
}

#[tokio::test]
async fn transacting_against_a_missing_file_fails() {
    let tmp = TempDir::new().unwrap();
    let file = engine(&tmp);
    let err = file
        .transact(spec(vec![FileOp::ReadPath { path: path("/a") }]))
        .await
        .unwrap_err();
    assert!(matches!(err, FileError::NotFound));
    assert!(!file.exists().await.unwrap());
}

#[tokio::test]
async fn fresh_file_is_empty_at_revision_zero() {
    let tmp = TempDir::new().unwrap();
    let file = engine(&tmp);
    file.create().await.unwrap();

    let result = file.transact(spec(vec![])).await.unwrap();
    assert_eq!(result.rev_num, RevNum(0));
    assert_eq!(result.new_rev_num, None);
    assert_eq!(result.data, None);
    assert_eq!(result.paths, None);
    assert!(file.current_snapshot().await.unwrap().is_empty());
}

#[tokio::test]
async fn pushes_commit_consecutive_revisions() {
    let tmp = TempDir::new().unwrap();
    let file = engine(&tmp);
    file.create().await.unwrap();

    let first = file
        .transact(spec(vec![write_op("/title", "Plan")]))
        .await
        .unwrap();
    assert_eq!(first.new_rev_num, Some(RevNum(0)));

    let second = file
        .transact(spec(vec![write_op("/body", "Details")]))
        .await
        .unwrap();
    assert_eq!(second.new_rev_num, Some(RevNum(1)));

    assert_eq!(read(&file, "/title").await, Some(Blob::new("Plan")));
    assert_eq!(read(&file, "/body").await, Some(Blob::new("Details")));
}

#[tokio::test]
async fn reads_omit_absent_targets() {
    let tmp = TempDir::new().unwrap();
    let file = engine(&tmp);
    file.create().await.unwrap();
    file.transact(spec(vec![write_op("/present", "x")]))
        .await
        .unwrap();

    let result = file
        .transact(spec(vec![
            FileOp::ReadPath { path: path("/present") },
            FileOp::ReadPath { path: path("/absent") },
        ]))
        .await
        .unwrap();
    let data = result.data.unwrap();
    assert_eq!(data.len(), 1);
    assert!(data.contains_key(&StorageId::Path(path("/present"))));
}

#[tokio::test]
async fn listing_returns_matching_paths() {
    let tmp = TempDir::new().unwrap();
    let file = engine(&tmp);
    file.create().await.unwrap();
    file.transact(spec(vec![
        write_op("/notes/0", "a"),
        write_op("/notes/1", "b"),
        write_op("/other", "c"),
    ]))
    .await
    .unwrap();

    let result = file
        .transact(spec(vec![FileOp::ListPathPrefix { prefix: path("/notes") }]))
        .await
        .unwrap();
    let paths = result.paths.unwrap();
    assert_eq!(
        paths.into_iter().collect::<Vec<_>>(),
        vec![path("/notes/0"), path("/notes/1")]
    );
}

#[tokio::test]
async fn recreating_a_file_erases_its_contents() {
    let tmp = TempDir::new().unwrap();
    let file = engine(&tmp);
    file.create().await.unwrap();
    file.transact(spec(vec![write_op("/title", "Old")]))
        .await
        .unwrap();

    file.create().await.unwrap();
    assert!(file.exists().await.unwrap());
    assert_eq!(read(&file, "/title").await, None);

    // The next push starts the revision log over.
    let result = file
        .transact(spec(vec![write_op("/title", "New")]))
        .await
        .unwrap();
    assert_eq!(result.new_rev_num, Some(RevNum(0)));
}

#[tokio::test]
async fn deleting_a_file_makes_it_not_found() {
    let tmp = TempDir::new().unwrap();
    let file = engine(&tmp);
    file.create().await.unwrap();
    file.transact(spec(vec![write_op("/title", "x")]))
        .await
        .unwrap();

    file.delete().await.unwrap();
    assert!(!file.exists().await.unwrap());
    let err = file.transact(spec(vec![])).await.unwrap_err();
    assert!(matches!(err, FileError::NotFound));

    // Deleting again is harmless.
    file.delete().await.unwrap();
}

#[tokio::test]
async fn delete_removes_the_storage_directory() {
    let tmp = TempDir::new().unwrap();
    let file = engine(&tmp);
    file.create().await.unwrap();
    file.transact(spec(vec![write_op("/title", "x")]))
        .await
        .unwrap();
    file.flush().await.unwrap();
    assert!(file.dir().is_dir());

    file.delete().await.unwrap();
    file.flush().await.unwrap();
    assert!(!file.dir().exists());
}

#[tokio::test]
async fn failed_precondition_aborts_the_transaction() {
    let tmp = TempDir::new().unwrap();
    let file = engine(&tmp);
    file.create().await.unwrap();

    let err = file
        .transact(spec(vec![
            FileOp::CheckPathExists { path: path("/absent") },
            write_op("/title", "never"),
        ]))
        .await
        .unwrap_err();
    assert!(matches!(err, FileError::Precondition(_)));
    assert!(err.is_retryable());
    assert_eq!(read(&file, "/title").await, None);
}

#[tokio::test]
async fn satisfied_wait_returns_immediately() {
    let tmp = TempDir::new().unwrap();
    let file = engine(&tmp);
    file.create().await.unwrap();
    file.transact(spec(vec![write_op("/ready", "1")]))
        .await
        .unwrap();

    let result = file
        .transact(spec(vec![FileOp::WhenPathPresent { path: path("/ready") }]))
        .await
        .unwrap();
    assert_eq!(result.rev_num, RevNum(0));
    assert_eq!(result.new_rev_num, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn wait_wakes_when_a_push_satisfies_it() {
    let tmp = TempDir::new().unwrap();
    let file = engine(&tmp);
    file.create().await.unwrap();

    let waiter = {
        let file = Arc::clone(&file);
        tokio::spawn(async move {
            file.transact(spec(vec![FileOp::WhenPathPresent {
                path: path("/signal"),
            }]))
            .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    file.transact(spec(vec![write_op("/signal", "go")]))
        .await
        .unwrap();

    let result = waiter.await.unwrap().unwrap();
    assert_eq!(result.rev_num, RevNum(0));
}

#[tokio::test]
async fn unsatisfiable_wait_times_out() {
    let tmp = TempDir::new().unwrap();
    let file = engine(&tmp);
    file.create().await.unwrap();

    let err = file
        .transact(spec(vec![
            FileOp::WhenPathPresent { path: path("/never") },
            FileOp::Timeout {
                duration: Duration::from_millis(20),
            },
        ]))
        .await
        .unwrap_err();
    assert!(matches!(err, FileError::Timeout { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn flushed_state_survives_a_reload() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("file");
    {
        let file = LocalFile::new(&dir, StorageConfig::for_testing());
        file.create().await.unwrap();
        file.transact(spec(vec![write_op("/title", "Plan")]))
            .await
            .unwrap();
        file.transact(spec(vec![write_op("/body", "Details")]))
            .await
            .unwrap();
        file.flush().await.unwrap();
    }

    let file = LocalFile::new(&dir, StorageConfig::for_testing());
    assert!(file.exists().await.unwrap());
    let snapshot = file.current_snapshot().await.unwrap();
    assert_eq!(snapshot.rev_num(), RevNum(1));
    assert_eq!(read(&file, "/title").await, Some(Blob::new("Plan")));
    assert_eq!(read(&file, "/body").await, Some(Blob::new("Details")));
}

#[tokio::test]
async fn debounced_write_back_reaches_disk() {
    let tmp = TempDir::new().unwrap();
    let file = engine(&tmp);
    file.create().await.unwrap();
    file.transact(spec(vec![write_op("/title", "x")]))
        .await
        .unwrap();

    // for_testing debounces by 10ms.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(file.dir().join(codec::change_file_name(RevNum(0))).is_file());
}

fn write_revision_file(dir: &Path, name: &str, rev: u64) {
    let change = quill_core::FileChange::new(
        RevNum(rev),
        quill_core::FileDelta::new(vec![write_op("/x", "y")]).unwrap(),
    );
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(name), codec::encode_change(&change).unwrap()).unwrap();
}

#[tokio::test]
async fn a_gap_in_the_revision_log_is_refused() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("file");
    write_revision_file(&dir, "00000000.json", 0);
    write_revision_file(&dir, "00000002.json", 2);

    let file = LocalFile::new(&dir, StorageConfig::for_testing());
    let err = file.exists().await.unwrap_err();
    assert!(matches!(
        err,
        FileError::RevisionGap {
            expected: RevNum(1),
            found: RevNum(2)
        }
    ));
    assert!(err.is_corruption());
}

#[tokio::test]
async fn a_misnamed_revision_file_is_refused() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("file");
    write_revision_file(&dir, "00000000.json", 0);
    write_revision_file(&dir, "00000001.json", 5);

    let file = LocalFile::new(&dir, StorageConfig::for_testing());
    let err = file.exists().await.unwrap_err();
    assert!(matches!(
        err,
        FileError::RevisionMismatch { found: RevNum(5), .. }
    ));
    assert!(err.is_corruption());
}

#[tokio::test]
async fn a_tampered_revision_file_is_refused() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("file");
    write_revision_file(&dir, "00000000.json", 0);
    let target = dir.join("00000000.json");
    let mut bytes = std::fs::read(&target).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    std::fs::write(&target, bytes).unwrap();

    let file = LocalFile::new(&dir, StorageConfig::for_testing());
    let err = file.exists().await.unwrap_err();
    assert!(matches!(err, FileError::CorruptChange { .. }));
    assert!(err.is_corruption());
}

#[tokio::test]
async fn foreign_files_in_the_directory_are_ignored() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("file");
    write_revision_file(&dir, "00000000.json", 0);
    std::fs::write(dir.join("README.md"), "notes").unwrap();

    let file = LocalFile::new(&dir, StorageConfig::for_testing());
    assert!(file.exists().await.unwrap());
    assert_eq!(read(&file, "/x").await, Some(Blob::new("y")));
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Disk-backed storage engine for one logical file
//!
//! A `LocalFile` owns the revision log of a single file: a directory with
//! one encoded `FileChange` per committed revision. Commits are applied in
//! memory immediately and written back after a debounce delay; a single
//! flush mutex serializes the write-back passes, and everything else runs
//! against the in-memory log.

use crate::codec;
use crate::config::StorageConfig;
use crate::error::FileError;
use quill_core::{
    Blob, Clock, FileChange, FileSnapshot, RevNum, StorageId, StoragePath, SystemClock,
    TransactionOutcome, TransactionSpec, Transactor,
};
use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify, OnceCell, Semaphore};
use tokio::task::JoinSet;

/// What `transact` returns; fields depend on the transaction's shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionResult {
    /// The revision the transaction observed (for a push, the one it made)
    pub rev_num: RevNum,
    /// The committed revision, present for push transactions
    pub new_rev_num: Option<RevNum>,
    /// Read results, present when the spec had read ops; absent targets
    /// are omitted from the map
    pub data: Option<BTreeMap<StorageId, Blob>>,
    /// Listed paths, present when the spec had list ops
    pub paths: Option<BTreeSet<StoragePath>>,
}

/// In-memory state of one file, guarded by the engine's state mutex
#[derive(Default)]
struct FileState {
    /// Whether the file should exist, independent of having revisions
    exists: bool,
    changes: Vec<FileChange>,
    /// Cached snapshot covering `changes[..applied]`
    snapshot: FileSnapshot,
    applied: usize,
    /// Count of changes already written back to disk
    flushed: usize,
    /// The next flush pass must clear the directory first
    erase_disk: bool,
    flush_scheduled: bool,
    /// Bumped by create/delete so a stale flush pass cannot mark
    /// rebuilt state as flushed
    generation: u64,
}

impl FileState {
    fn reset(&mut self) {
        self.changes.clear();
        self.snapshot = FileSnapshot::empty();
        self.applied = 0;
        self.flushed = 0;
    }

    /// The current snapshot, advancing the cache past any new changes
    fn snapshot(&mut self) -> FileSnapshot {
        while self.applied < self.changes.len() {
            self.snapshot = self.snapshot.compose(&self.changes[self.applied]);
            self.applied += 1;
        }
        self.snapshot.clone()
    }
}

/// The storage engine for one logical file
pub struct LocalFile {
    dir: PathBuf,
    config: StorageConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<FileState>,
    /// Signalled after every commit, create, and delete
    changed: Notify,
    /// Serializes write-back passes
    flush_serial: Mutex<()>,
    loaded: OnceCell<()>,
}

impl LocalFile {
    pub fn new(dir: impl Into<PathBuf>, config: StorageConfig) -> Arc<Self> {
        Self::with_clock(dir, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        dir: impl Into<PathBuf>,
        config: StorageConfig,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        Arc::new(Self {
            dir: dir.into(),
            config,
            clock,
            state: Mutex::new(FileState::default()),
            changed: Notify::new(),
            flush_serial: Mutex::new(()),
            loaded: OnceCell::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Mark the file as existing, erasing any prior content.
    ///
    /// Idempotent: creating twice in a row equals creating once.
    pub async fn create(self: &Arc<Self>) -> Result<(), FileError> {
        self.ensure_loaded().await?;
        let mut state = self.state.lock().await;
        let recreated = state.exists;
        state.reset();
        state.exists = true;
        state.erase_disk = true;
        state.generation += 1;
        self.schedule_flush(&mut state);
        drop(state);
        self.changed.notify_waiters();
        tracing::info!(dir = %self.dir.display(), recreated, "file created");
        Ok(())
    }

    /// Mark the file as not existing and schedule removal of its storage.
    ///
    /// Idempotent: deleting a nonexistent file is a no-op that still
    /// schedules cleanup.
    pub async fn delete(self: &Arc<Self>) -> Result<(), FileError> {
        self.ensure_loaded().await?;
        let mut state = self.state.lock().await;
        state.reset();
        state.exists = false;
        state.erase_disk = false;
        state.generation += 1;
        self.schedule_flush(&mut state);
        drop(state);
        self.changed.notify_waiters();
        tracing::info!(dir = %self.dir.display(), "file deleted");
        Ok(())
    }

    /// Whether the file currently exists
    pub async fn exists(&self) -> Result<bool, FileError> {
        self.ensure_loaded().await?;
        Ok(self.state.lock().await.exists)
    }

    /// The current snapshot of the file's contents
    pub async fn current_snapshot(&self) -> Result<FileSnapshot, FileError> {
        self.ensure_loaded().await?;
        let mut state = self.state.lock().await;
        if !state.exists {
            return Err(FileError::NotFound);
        }
        Ok(state.snapshot())
    }

    /// Execute one transaction.
    ///
    /// The whole pipeline races the spec's (clamped) timeout; expiry
    /// abandons the attempt and reports `FileError::Timeout`. Work already
    /// spawned (a scheduled flush) still completes in the background.
    pub async fn transact(
        self: &Arc<Self>,
        spec: TransactionSpec,
    ) -> Result<TransactionResult, FileError> {
        let limit = self.config.clamp_timeout(spec.timeout());
        match tokio::time::timeout(limit, self.transact_inner(&spec)).await {
            Ok(result) => result,
            Err(_) => Err(FileError::Timeout { limit }),
        }
    }

    async fn transact_inner(
        self: &Arc<Self>,
        spec: &TransactionSpec,
    ) -> Result<TransactionResult, FileError> {
        self.ensure_loaded().await?;
        loop {
            // Register for change notifications before observing state, so
            // a commit between the observation and the await still wakes us.
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.state.lock().await;
                if !state.exists {
                    return Err(FileError::NotFound);
                }
                let snapshot = state.snapshot();
                match Transactor::run(spec, &snapshot)? {
                    TransactionOutcome::Pull { data, paths } => {
                        return Ok(TransactionResult {
                            rev_num: snapshot.rev_num(),
                            new_rev_num: None,
                            data: spec.has_read_ops().then_some(data),
                            paths: spec.has_list_ops().then_some(paths),
                        });
                    }
                    TransactionOutcome::Push { delta } => {
                        let rev_num = RevNum(state.changes.len() as u64);
                        state.changes.push(FileChange::new(rev_num, delta));
                        self.schedule_flush(&mut state);
                        drop(state);
                        self.changed.notify_waiters();
                        tracing::debug!(dir = %self.dir.display(), %rev_num, "committed revision");
                        return Ok(TransactionResult {
                            rev_num,
                            new_rev_num: Some(rev_num),
                            data: None,
                            paths: None,
                        });
                    }
                    TransactionOutcome::Wait { satisfied: true } => {
                        return Ok(TransactionResult {
                            rev_num: snapshot.rev_num(),
                            new_rev_num: None,
                            data: None,
                            paths: None,
                        });
                    }
                    TransactionOutcome::Wait { satisfied: false } => {}
                }
            }

            notified.await;
        }
    }

    async fn ensure_loaded(&self) -> Result<(), FileError> {
        self.loaded.get_or_try_init(|| self.load()).await?;
        Ok(())
    }

    async fn load(&self) -> Result<(), FileError> {
        match self.load_from_disk().await {
            Ok(()) => Ok(()),
            Err(error) => {
                if error.is_corruption() {
                    tracing::error!(dir = %self.dir.display(), %error, "refusing corrupt file");
                }
                Err(error)
            }
        }
    }

    async fn load_from_disk(&self) -> Result<(), FileError> {
        let started = self.clock.now();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            match codec::parse_change_file_name(name) {
                Some(rev_num) => found.push((rev_num, name.to_string())),
                None => {
                    tracing::debug!(dir = %self.dir.display(), file = name, "ignoring foreign file");
                }
            }
        }
        found.sort_by_key(|(rev_num, _)| *rev_num);
        for (index, (rev_num, _)) in found.iter().enumerate() {
            let expected = RevNum(index as u64);
            if *rev_num != expected {
                return Err(FileError::RevisionGap {
                    expected,
                    found: *rev_num,
                });
            }
        }

        let count = found.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_io_parallel.max(1)));
        let mut tasks = JoinSet::new();
        for (rev_num, name) in found {
            let path = self.dir.join(&name);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| FileError::Io(std::io::Error::other(e)))?;
                let bytes = tokio::fs::read(&path).await?;
                let change = codec::decode_change(&bytes)
                    .map_err(|source| FileError::CorruptChange {
                        file: name.clone(),
                        source,
                    })?;
                if change.rev_num != rev_num {
                    return Err(FileError::RevisionMismatch {
                        file: name,
                        found: change.rev_num,
                    });
                }
                Ok((rev_num, change))
            });
        }

        let mut changes: Vec<Option<FileChange>> = vec![None; count];
        while let Some(joined) = tasks.join_next().await {
            let (rev_num, change) =
                joined.map_err(|e| FileError::Io(std::io::Error::other(e)))??;
            changes[rev_num.value() as usize] = Some(change);
        }

        let mut state = self.state.lock().await;
        state.exists = true;
        state.changes = changes.into_iter().flatten().collect();
        state.flushed = state.changes.len();
        drop(state);

        tracing::info!(
            dir = %self.dir.display(),
            revisions = count,
            elapsed = ?self.clock.elapsed_since(started),
            "loaded file"
        );
        Ok(())
    }

    /// Arrange one write-back pass after the debounce delay.
    ///
    /// Commits landing during the delay ride along with the same pass.
    fn schedule_flush(self: &Arc<Self>, state: &mut FileState) {
        if state.flush_scheduled {
            return;
        }
        state.flush_scheduled = true;
        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(this.config.debounce_delay).await;
            this.state.lock().await.flush_scheduled = false;
            if let Err(error) = this.flush().await {
                tracing::error!(dir = %this.dir.display(), %error, "write-back failed");
            }
        });
    }

    /// Write pending revisions to disk, or remove the storage directory
    /// when the file should not exist.
    ///
    /// Normally driven by the debounce task; callers needing durability
    /// right now (shutdown, tests) may invoke it directly.
    pub async fn flush(&self) -> Result<(), FileError> {
        let _serial = self.flush_serial.lock().await;
        let started = self.clock.now();

        let (exists, erase, base, pending, generation) = {
            let state = self.state.lock().await;
            (
                state.exists,
                state.erase_disk,
                state.flushed,
                state.changes[state.flushed..].to_vec(),
                state.generation,
            )
        };

        if !exists {
            match tokio::fs::remove_dir_all(&self.dir).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::warn!(dir = %self.dir.display(), "storage already removed");
                }
                Err(e) => return Err(e.into()),
            }
            return Ok(());
        }

        if erase {
            match tokio::fs::remove_dir_all(&self.dir).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        tokio::fs::create_dir_all(&self.dir).await?;

        let written = pending.len();
        let semaphore = Arc::new(Semaphore::new(self.config.max_io_parallel.max(1)));
        let mut tasks = JoinSet::new();
        for change in pending {
            let path = self.dir.join(codec::change_file_name(change.rev_num));
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| FileError::Io(std::io::Error::other(e)))?;
                let bytes = codec::encode_change(&change)
                    .map_err(|e| FileError::Io(std::io::Error::other(e)))?;
                tokio::fs::write(&path, bytes).await?;
                Ok::<(), FileError>(())
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.map_err(|e| FileError::Io(std::io::Error::other(e)))??;
        }

        let mut state = self.state.lock().await;
        if state.generation == generation {
            state.flushed = base + written;
            state.erase_disk = false;
        }
        drop(state);

        tracing::debug!(
            dir = %self.dir.display(),
            revisions = written,
            elapsed = ?self.clock.elapsed_since(started),
            "write-back complete"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;

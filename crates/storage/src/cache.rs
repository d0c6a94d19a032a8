// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cache of live storage engines
//!
//! One `LocalFile` per logical file must stay live while any caller holds
//! it, or its in-memory change log and scheduled flushes would be lost.
//! The cache owns engines strongly and hands out pinning handles: an entry
//! with outstanding handles is never evicted, and unpinned entries are
//! evicted least-recently-used once the cache is over capacity.

use crate::file::LocalFile;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard};

struct Entry {
    file: Arc<LocalFile>,
    pins: usize,
    last_used: u64,
}

struct CacheState {
    entries: HashMap<String, Entry>,
    tick: u64,
}

struct Shared {
    capacity: usize,
    state: Mutex<CacheState>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, CacheState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Evict unpinned entries, least recently used first, until the cache
    /// is back within capacity. Pinned entries are untouchable, so the
    /// cache may transiently hold more than `capacity` engines.
    fn evict_excess(&self, state: &mut CacheState) {
        while state.entries.len() > self.capacity {
            let victim = state
                .entries
                .iter()
                .filter(|(_, entry)| entry.pins == 0)
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            let Some(key) = victim else { break };
            state.entries.remove(&key);
            tracing::debug!(file = %key, "evicted idle storage engine");
        }
    }
}

/// Pinned-LRU cache of `LocalFile` instances, keyed by file identifier.
///
/// Cloning the cache clones a shared reference to one arena.
#[derive(Clone)]
pub struct FileCache {
    shared: Arc<Shared>,
}

impl FileCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                capacity: capacity.max(1),
                state: Mutex::new(CacheState {
                    entries: HashMap::new(),
                    tick: 0,
                }),
            }),
        }
    }

    /// The cached engine for `key`, or the one `factory` builds.
    ///
    /// The returned handle pins the entry for as long as it is alive.
    pub fn resolve_or_add(
        &self,
        key: &str,
        factory: impl FnOnce() -> Arc<LocalFile>,
    ) -> FileHandle {
        let mut state = self.shared.state();
        state.tick += 1;
        let tick = state.tick;

        let file = match state.entries.get_mut(key) {
            Some(entry) => {
                entry.pins += 1;
                entry.last_used = tick;
                Arc::clone(&entry.file)
            }
            None => {
                let file = factory();
                state.entries.insert(
                    key.to_string(),
                    Entry {
                        file: Arc::clone(&file),
                        pins: 1,
                        last_used: tick,
                    },
                );
                self.shared.evict_excess(&mut state);
                file
            }
        };
        drop(state);

        FileHandle {
            key: key.to_string(),
            file,
            shared: Arc::clone(&self.shared),
        }
    }

    /// The cached engine for `key`, without building a missing one
    pub fn get(&self, key: &str) -> Option<FileHandle> {
        let mut state = self.shared.state();
        state.tick += 1;
        let tick = state.tick;

        let entry = state.entries.get_mut(key)?;
        entry.pins += 1;
        entry.last_used = tick;
        let file = Arc::clone(&entry.file);
        drop(state);

        Some(FileHandle {
            key: key.to_string(),
            file,
            shared: Arc::clone(&self.shared),
        })
    }

    pub fn len(&self) -> usize {
        self.shared.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A pinning reference to a cached `LocalFile`.
///
/// Derefs to the engine; dropping the last handle for an entry makes it
/// evictable again.
pub struct FileHandle {
    key: String,
    file: Arc<LocalFile>,
    shared: Arc<Shared>,
}

impl FileHandle {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying engine, for callers that need to move it into a task
    pub fn file(&self) -> &Arc<LocalFile> {
        &self.file
    }
}

impl Deref for FileHandle {
    type Target = LocalFile;

    fn deref(&self) -> &LocalFile {
        &self.file
    }
}

impl Clone for FileHandle {
    fn clone(&self) -> Self {
        let mut state = self.shared.state();
        if let Some(entry) = state.entries.get_mut(&self.key) {
            entry.pins += 1;
        }
        drop(state);
        Self {
            key: self.key.clone(),
            file: Arc::clone(&self.file),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for FileHandle {
    fn drop(&mut self) {
        let mut state = self.shared.state();
        if let Some(entry) = state.entries.get_mut(&self.key) {
            entry.pins = entry.pins.saturating_sub(1);
        }
        self.shared.evict_excess(&mut state);
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! quill-storage: the disk-backed engine behind quill-core's model
//!
//! A `LocalFile` owns one logical file: an append-only revision log on
//! disk, an in-memory change list with a cached snapshot, debounced
//! write-back, and long-poll wait transactions. `FileCache` keeps engines
//! live while callers hold handles to them.

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod file;

// Re-exports
pub use cache::{FileCache, FileHandle};
pub use codec::CodecError;
pub use config::StorageConfig;
pub use error::FileError;
pub use file::{LocalFile, TransactionResult};

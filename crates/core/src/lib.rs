// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! quill-core: the pure model of the Quill storage engine
//!
//! This crate provides:
//! - Validated storage paths, content-addressed blobs, and revision numbers
//! - The `FileOp` vocabulary and validated `TransactionSpec` bundles
//! - The composable `FileDelta`/`FileSnapshot`/`FileChange` algebra
//! - The `Transactor`, which executes one spec against one snapshot
//!
//! Nothing here performs I/O; the disk-backed engine lives in
//! `quill-storage`.

pub mod blob;
pub mod clock;
pub mod delta;
pub mod id;
pub mod op;
pub mod path;
pub mod snapshot;
pub mod transaction;
pub mod transactor;

// Re-exports
pub use blob::{Blob, BlobHash};
pub use clock::{Clock, ManualClock, SystemClock};
pub use delta::{ComposeError, FileChange, FileDelta};
pub use id::{RevNum, StorageId};
pub use op::{FileOp, OpCategory, OpError};
pub use path::{PathError, StoragePath};
pub use snapshot::{FileSnapshot, SnapshotError};
pub use transaction::{SpecError, TransactionSpec};
pub use transactor::{PreconditionError, TransactionOutcome, Transactor};

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::blob::Blob;

#[test]
fn path_and_blob_ids_are_distinct() {
    let path_id = StorageId::from(StoragePath::new("/x").unwrap());
    let blob_id = StorageId::from(Blob::new("/x").hash());
    assert_ne!(path_id, blob_id);
}

#[test]
fn display_marks_blob_ids() {
    let path_id = StorageId::from(StoragePath::new("/doc/title").unwrap());
    assert_eq!(path_id.to_string(), "/doc/title");
    let blob_id = StorageId::from(Blob::new("abc").hash());
    assert!(blob_id.to_string().starts_with("blob:"));
}

#[test]
fn rev_num_next_increments() {
    assert_eq!(RevNum(0).next(), RevNum(1));
    assert_eq!(RevNum(41).next().value(), 42);
}

#[test]
fn rev_num_orders_numerically() {
    assert!(RevNum(2) < RevNum(10));
    assert_eq!(RevNum::default(), RevNum(0));
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk encoding of committed changes
//!
//! Each revision file holds one `FileChange`: a `crc32:xxxxxxxx` header
//! line followed by a JSON payload. The filename is the revision number
//! as 8 lowercase hex digits plus the fixed suffix.

use quill_core::{FileChange, RevNum};
use thiserror::Error;

/// Suffix shared by every revision file
pub const CHANGE_FILE_SUFFIX: &str = ".json";

const CRC_PREFIX: &str = "crc32:";

/// Errors from revision-file encoding and decoding
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("missing checksum header")]
    MissingHeader,
    #[error("malformed checksum header: {0:?}")]
    MalformedHeader(String),
    #[error("checksum mismatch: header {expected:08x}, payload {actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
    #[error("malformed change payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),
}

/// The revision file name for `rev_num`, e.g. `00000003.json`
pub fn change_file_name(rev_num: RevNum) -> String {
    format!("{:08x}{}", rev_num.value(), CHANGE_FILE_SUFFIX)
}

/// Recover the revision number from a file name produced by
/// [`change_file_name`]; anything else yields `None`
pub fn parse_change_file_name(name: &str) -> Option<RevNum> {
    let hex = name.strip_suffix(CHANGE_FILE_SUFFIX)?;
    if hex.len() != 8 || !hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)) {
        return None;
    }
    u64::from_str_radix(hex, 16).ok().map(RevNum)
}

/// Serialize a change with its integrity header
pub fn encode_change(change: &FileChange) -> Result<Vec<u8>, CodecError> {
    let payload = serde_json::to_vec(change)?;
    let crc = crc32fast::hash(&payload);
    let mut bytes = format!("{CRC_PREFIX}{crc:08x}\n").into_bytes();
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode a revision file, verifying its checksum
pub fn decode_change(bytes: &[u8]) -> Result<FileChange, CodecError> {
    let newline = bytes
        .iter()
        .position(|b| *b == b'\n')
        .ok_or(CodecError::MissingHeader)?;
    let (header, payload) = bytes.split_at(newline);
    let payload = &payload[1..];

    let header = std::str::from_utf8(header)
        .map_err(|_| CodecError::MalformedHeader(String::from_utf8_lossy(bytes).into_owned()))?;
    let expected = header
        .strip_prefix(CRC_PREFIX)
        .and_then(|hex| u32::from_str_radix(hex, 16).ok())
        .ok_or_else(|| CodecError::MalformedHeader(header.to_string()))?;

    let actual = crc32fast::hash(payload);
    if actual != expected {
        return Err(CodecError::ChecksumMismatch { expected, actual });
    }
    Ok(serde_json::from_slice(payload)?)
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;

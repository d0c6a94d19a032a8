// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage path identifiers

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from storage path validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("storage path is empty")]
    Empty,
    #[error("storage path must start with '/': {0}")]
    MissingLeadingSlash(String),
    #[error("storage path has an empty component: {0}")]
    EmptyComponent(String),
    #[error("storage path has invalid character {ch:?}: {path}")]
    InvalidCharacter { path: String, ch: char },
}

/// A validated `/`-delimited identifier for a mutable storage slot.
///
/// Paths are absolute, components are limited to alphanumerics and `_`,
/// and doubled or trailing slashes are rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoragePath(String);

impl StoragePath {
    pub fn new(path: impl Into<String>) -> Result<Self, PathError> {
        let path = path.into();
        if path.is_empty() {
            return Err(PathError::Empty);
        }
        let Some(rest) = path.strip_prefix('/') else {
            return Err(PathError::MissingLeadingSlash(path));
        };
        if rest.is_empty() {
            return Err(PathError::EmptyComponent(path));
        }
        for component in rest.split('/') {
            if component.is_empty() {
                return Err(PathError::EmptyComponent(path));
            }
            if let Some(ch) = component
                .chars()
                .find(|c| !c.is_ascii_alphanumeric() && *c != '_')
            {
                return Err(PathError::InvalidCharacter { path, ch });
            }
        }
        Ok(Self(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate the path's components, leading slash excluded
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0[1..].split('/')
    }

    /// Whether this path is `other` itself or a `/`-boundary ancestor of it
    pub fn is_prefix_of(&self, other: &StoragePath) -> bool {
        match other.0.strip_prefix(&self.0) {
            Some("") => true,
            Some(rest) => rest.starts_with('/'),
            None => false,
        }
    }

    /// The decimal value of the final component when this path is a direct
    /// child of `parent` with an all-digit name
    pub fn numeric_child_of(&self, parent: &StoragePath) -> Option<u64> {
        let rest = self.0.strip_prefix(&parent.0)?.strip_prefix('/')?;
        if rest.is_empty() || rest.contains('/') {
            return None;
        }
        rest.parse().ok()
    }
}

impl std::fmt::Display for StoragePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for StoragePath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StoragePath> for String {
    fn from(value: StoragePath) -> Self {
        value.0
    }
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for one storage engine instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Shortest timeout a transaction may request
    #[serde(with = "humantime_serde")]
    pub min_timeout: Duration,
    /// Longest timeout a transaction may request; also the default
    #[serde(with = "humantime_serde")]
    pub max_timeout: Duration,
    /// Quiet period between a commit and its write-back pass
    #[serde(with = "humantime_serde")]
    pub debounce_delay: Duration,
    /// Cap on simultaneously in-flight filesystem calls during bulk I/O
    pub max_io_parallel: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            min_timeout: Duration::from_millis(100),
            max_timeout: Duration::from_secs(30),
            debounce_delay: Duration::from_millis(250),
            max_io_parallel: 16,
        }
    }
}

impl StorageConfig {
    /// Config for tests (tiny debounce, permissive timeouts)
    pub fn for_testing() -> Self {
        Self {
            min_timeout: Duration::from_millis(1),
            max_timeout: Duration::from_secs(10),
            debounce_delay: Duration::from_millis(10),
            max_io_parallel: 4,
        }
    }

    /// The effective timeout for a transaction: the requested duration
    /// clamped into bounds, or the maximum when none was requested
    pub fn clamp_timeout(&self, requested: Option<Duration>) -> Duration {
        requested
            .unwrap_or(self.max_timeout)
            .clamp(self.min_timeout, self.max_timeout)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

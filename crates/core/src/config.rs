// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration for brook storage and snapshot retention
//!
//! Loaded from TOML with kebab-case keys:
//!
//! ```toml
//! [storage]
//! lease-duration-seconds = 60
//! max-events-per-batch = 90
//! recovery-backoff = "250ms"
//!
//! [snapshots]
//! default-retention-modulus = 100
//!
//! [snapshots.retention-modulus]
//! account-balance = 50
//! ```

use crate::retention::RetentionOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on how long recovery waits for its lock, whatever the lease
pub const MAX_RECOVERY_LOCK_WAIT: Duration = Duration::from_secs(30);

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Options governing the append, recovery and read protocols
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StorageOptions {
    pub lease_duration_seconds: u64,
    /// Elapsed time after which a large batch renews its lease
    pub lease_renewal_threshold_seconds: u64,
    pub max_events_per_batch: usize,
    pub max_request_size_bytes: usize,
    /// Page size of the event reader
    pub query_batch_size: usize,
    /// Largest gap recovery checks position by position before
    /// switching to one range query
    pub existence_probe_threshold: usize,
    /// Pause before re-reading the cursor when the recovery lock is busy
    #[serde(with = "humantime_serde")]
    pub recovery_backoff: Duration,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            lease_duration_seconds: 60,
            lease_renewal_threshold_seconds: 20,
            max_events_per_batch: 90,
            max_request_size_bytes: 1_800_000,
            query_batch_size: 100,
            existence_probe_threshold: 10,
            recovery_backoff: Duration::from_millis(250),
        }
    }
}

impl StorageOptions {
    pub fn lease_duration(&self) -> Duration {
        Duration::from_secs(self.lease_duration_seconds)
    }

    pub fn lease_renewal_threshold(&self) -> Duration {
        Duration::from_secs(self.lease_renewal_threshold_seconds)
    }

    /// How long recovery waits for its lock
    pub fn recovery_lock_wait(&self) -> Duration {
        self.lease_duration().min(MAX_RECOVERY_LOCK_WAIT)
    }

    pub fn with_max_events_per_batch(mut self, max: usize) -> Self {
        self.max_events_per_batch = max;
        self
    }

    pub fn with_max_request_size_bytes(mut self, max: usize) -> Self {
        self.max_request_size_bytes = max;
        self
    }

    pub fn with_query_batch_size(mut self, size: usize) -> Self {
        self.query_batch_size = size;
        self
    }

    pub fn with_existence_probe_threshold(mut self, threshold: usize) -> Self {
        self.existence_probe_threshold = threshold;
        self
    }

    pub fn with_recovery_backoff(mut self, backoff: Duration) -> Self {
        self.recovery_backoff = backoff;
        self
    }

    pub fn with_lease(mut self, duration_seconds: u64, renewal_threshold_seconds: u64) -> Self {
        self.lease_duration_seconds = duration_seconds;
        self.lease_renewal_threshold_seconds = renewal_threshold_seconds;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("lease-duration-seconds", self.lease_duration_seconds as usize),
            ("max-events-per-batch", self.max_events_per_batch),
            ("max-request-size-bytes", self.max_request_size_bytes),
            ("query-batch-size", self.query_batch_size),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }
        if self.lease_renewal_threshold_seconds >= self.lease_duration_seconds {
            return Err(ConfigError::Invalid {
                field: "lease-renewal-threshold-seconds",
                reason: format!(
                    "{}s must be below the {}s lease",
                    self.lease_renewal_threshold_seconds, self.lease_duration_seconds
                ),
            });
        }
        Ok(())
    }
}

/// Top-level configuration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BrookConfig {
    pub storage: StorageOptions,
    pub snapshots: RetentionOptions,
}

impl BrookConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: BrookConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.storage.validate()?;
        if self.snapshots.default_retention_modulus == 0 {
            return Err(ConfigError::Invalid {
                field: "default-retention-modulus",
                reason: "must be greater than zero".to_string(),
            });
        }
        if let Some((name, _)) = self.snapshots.retention_modulus.iter().find(|(_, m)| **m == 0) {
            return Err(ConfigError::Invalid {
                field: "retention-modulus",
                reason: format!("modulus for {} must be greater than zero", name),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot retention: which versions are kept as rebuild bases

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default interval between retained snapshot versions
pub const DEFAULT_RETENTION_MODULUS: u64 = 100;

/// Retention modulus per snapshot type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RetentionOptions {
    pub default_retention_modulus: u64,
    /// Overrides keyed by snapshot type
    pub retention_modulus: BTreeMap<String, u64>,
}

impl Default for RetentionOptions {
    fn default() -> Self {
        Self {
            default_retention_modulus: DEFAULT_RETENTION_MODULUS,
            retention_modulus: BTreeMap::new(),
        }
    }
}

impl RetentionOptions {
    pub fn with_modulus(mut self, snapshot_type: impl Into<String>, modulus: u64) -> Self {
        self.retention_modulus.insert(snapshot_type.into(), modulus);
        self
    }

    pub fn modulus_for(&self, snapshot_type: &str) -> u64 {
        self.retention_modulus
            .get(snapshot_type)
            .copied()
            .unwrap_or(self.default_retention_modulus)
    }

    /// Version to rebuild `version` of `snapshot_type` from
    pub fn base_version_for(&self, snapshot_type: &str, version: i64) -> i64 {
        base_version(version, self.modulus_for(snapshot_type))
    }
}

/// Largest multiple of `modulus` strictly below `version`, or 0.
///
/// A zero modulus disables retention and always rebuilds from 0.
pub fn base_version(version: i64, modulus: u64) -> i64 {
    let Ok(modulus) = i64::try_from(modulus) else {
        return 0;
    };
    if modulus == 0 || version <= 1 {
        return 0;
    }
    ((version - 1) / modulus) * modulus
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;

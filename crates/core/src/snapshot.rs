// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot identity and envelope types

use crate::key::{check_component, BrookKey, KeyError, KEY_SEPARATOR};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The sequence of snapshots of one projection over one brook
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotStreamKey {
    snapshot_type: String,
    brook: BrookKey,
}

impl SnapshotStreamKey {
    pub fn new(snapshot_type: impl Into<String>, brook: BrookKey) -> Result<Self, KeyError> {
        let snapshot_type = snapshot_type.into();
        check_component("snapshot type", &snapshot_type)?;
        Ok(Self {
            snapshot_type,
            brook,
        })
    }

    pub fn snapshot_type(&self) -> &str {
        &self.snapshot_type
    }

    pub fn brook(&self) -> &BrookKey {
        &self.brook
    }

    pub fn at(&self, version: i64) -> SnapshotAddress {
        SnapshotAddress {
            stream: self.clone(),
            version,
        }
    }
}

impl fmt::Display for SnapshotStreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.snapshot_type, KEY_SEPARATOR, self.brook)
    }
}

/// Where an envelope is stored: one slot per stream and version.
///
/// The reducer hash is not part of the address, so a rebuild under new
/// reducers overwrites the stale envelope in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotAddress {
    pub stream: SnapshotStreamKey,
    pub version: i64,
}

impl fmt::Display for SnapshotAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.stream, KEY_SEPARATOR, self.version)
    }
}

/// Identity of one materialized snapshot under one set of reducers
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SnapshotKey {
    pub stream: SnapshotStreamKey,
    pub version: i64,
    pub reducer_hash: String,
}

impl SnapshotKey {
    pub fn new(
        stream: SnapshotStreamKey,
        version: i64,
        reducer_hash: impl Into<String>,
    ) -> Result<Self, KeyError> {
        let reducer_hash = reducer_hash.into();
        check_component("reducer hash", &reducer_hash)?;
        Ok(Self {
            stream,
            version,
            reducer_hash,
        })
    }

    pub fn address(&self) -> SnapshotAddress {
        self.stream.at(self.version)
    }
}

impl fmt::Display for SnapshotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = KEY_SEPARATOR;
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.stream, self.reducer_hash, self.version
        )
    }
}

impl FromStr for SnapshotKey {
    type Err = KeyError;

    /// Parses `snapshot_type|brook_name|entity_id|reducer_hash|version`
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let malformed = || KeyError::Malformed(token.to_string());
        let parts: Vec<&str> = token.split(KEY_SEPARATOR).collect();
        let [snapshot_type, brook_name, entity_id, reducer_hash, version] = parts[..] else {
            return Err(malformed());
        };
        let version = version.parse::<i64>().map_err(|_| malformed())?;
        let brook = BrookKey::new(brook_name, entity_id)?;
        let stream = SnapshotStreamKey::new(snapshot_type, brook)?;
        Self::new(stream, version, reducer_hash)
    }
}

/// Persisted, serialized snapshot state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEnvelope {
    pub data: Vec<u8>,
    pub content_type: String,
    /// Fingerprint of the reducers that produced `data`
    pub reducer_hash: String,
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;

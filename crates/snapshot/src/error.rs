// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for snapshot activation

use brook_adapters::RepositoryError;
use brook_core::{KeyError, SnapshotAddress, SnapshotStreamKey};
use brook_storage::BrookError;
use thiserror::Error;

/// Errors from snapshot activation and access
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("invalid snapshot version {version} for {stream}")]
    InvalidVersion {
        stream: SnapshotStreamKey,
        version: i64,
    },
    #[error("invalid snapshot key: {0}")]
    Key(#[from] KeyError),
    #[error("replaying events failed: {0}")]
    Read(#[from] BrookError),
    #[error("snapshot store error at {address}: {source}")]
    Store {
        address: SnapshotAddress,
        #[source]
        source: RepositoryError,
    },
    #[error("failed to encode snapshot state for {address}: {source}")]
    Codec {
        address: SnapshotAddress,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to apply {type_tag} event at position {position}: {source}")]
    Reduce {
        position: i64,
        type_tag: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("replay of {stream} ({base}, {version}] returned {replayed} of {expected} events")]
    IncompleteReplay {
        stream: SnapshotStreamKey,
        base: i64,
        version: i64,
        replayed: i64,
        expected: i64,
    },
    #[error("snapshot {key} has not been activated")]
    NotActivated { key: String },
}

pub type Result<T, E = SnapshotError> = std::result::Result<T, E>;

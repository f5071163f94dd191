// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the brook append, recovery and read protocols

use brook_adapters::{LockError, RepositoryError};
use brook_core::{BrookKey, BrookPosition};
use thiserror::Error;

/// Coarse classification of a [`BrookError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Stale expected version; retry with a fresh head
    Conflict,
    /// Rejected before any I/O
    Validation,
    /// Storage failure that survived retries
    Storage,
    /// The brook lock is held elsewhere
    LockContention,
    /// Rollback left residue; the brook needs manual repair
    RollbackFailure,
    /// A crashed batch could not be resolved
    RecoveryUnresolvable,
}

/// Errors from brook operations
#[derive(Debug, Error)]
pub enum BrookError {
    #[error("invalid append to {key}: {reason}")]
    Validation { key: BrookKey, reason: String },
    #[error("appending {count} events to {key} at {head} overflows the position counter")]
    Overflow {
        key: BrookKey,
        head: BrookPosition,
        count: usize,
    },
    #[error("event {index} for {key} is {size} bytes, above the {limit} byte request limit")]
    EventTooLarge {
        key: BrookKey,
        index: usize,
        size: usize,
        limit: usize,
    },
    #[error("concurrency conflict on {key}: expected head {expected}, found {actual}")]
    Conflict {
        key: BrookKey,
        expected: BrookPosition,
        actual: BrookPosition,
    },
    #[error("storage error on {key}: {source}")]
    Repository {
        key: BrookKey,
        #[source]
        source: RepositoryError,
    },
    #[error("lock {lock_key} for {key} is held by another writer")]
    LockContended { key: BrookKey, lock_key: String },
    #[error("lock error on {key}: {source}")]
    Lock {
        key: BrookKey,
        #[source]
        source: LockError,
    },
    #[error("rollback of {key} left events at positions {positions:?}; brook is inconsistent")]
    RollbackFailed {
        key: BrookKey,
        positions: Vec<i64>,
        /// Whether the pending cursor could not be deleted either
        pending_cursor_left: bool,
        #[source]
        source: Box<BrookError>,
    },
    #[error("unable to recover orphaned batch on {key}")]
    RecoveryUnresolvable { key: BrookKey },
}

impl BrookError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BrookError::Validation { .. }
            | BrookError::Overflow { .. }
            | BrookError::EventTooLarge { .. } => ErrorKind::Validation,
            BrookError::Conflict { .. } => ErrorKind::Conflict,
            BrookError::Repository { .. } => ErrorKind::Storage,
            BrookError::LockContended { .. } | BrookError::Lock { .. } => {
                ErrorKind::LockContention
            }
            BrookError::RollbackFailed { .. } => ErrorKind::RollbackFailure,
            BrookError::RecoveryUnresolvable { .. } => ErrorKind::RecoveryUnresolvable,
        }
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    pub(crate) fn storage(key: &BrookKey) -> impl FnOnce(RepositoryError) -> BrookError + '_ {
        move |source| BrookError::Repository {
            key: key.clone(),
            source,
        }
    }

    pub(crate) fn lock(key: &BrookKey, lock_key: &str) -> impl FnOnce(LockError) -> BrookError {
        let key = key.clone();
        let lock_key = lock_key.to_string();
        move |source| match source {
            LockError::Contended { .. } => BrookError::LockContended { key, lock_key },
            source => BrookError::Lock { key, source },
        }
    }
}

pub type Result<T, E = BrookError> = std::result::Result<T, E>;

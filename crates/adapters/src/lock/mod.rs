// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Distributed lock port: exclusive, time-bounded leases per key

mod memory;

pub use memory::{MemoryLease, MemoryLockProvider};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Identity of a lease holder
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HolderId(pub String);

impl HolderId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for HolderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors from lock operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// Another holder kept the lease for the whole wait
    #[error("lock {key} is held by another owner")]
    Contended { key: String },
    /// The lease lapsed or was taken over before renewal or release
    #[error("lease on {key} expired")]
    Expired { key: String },
    #[error("lock backend failure: {0}")]
    Backend(String),
}

/// A held lease.
///
/// Dropping a lease that was not released releases it.
#[async_trait]
pub trait Lease: Send + Sync {
    fn key(&self) -> &str;

    /// Extend the lease by its full duration from now
    async fn renew(&mut self) -> Result<(), LockError>;

    /// Give the lease up
    async fn release(self) -> Result<(), LockError>;
}

/// Lock provider handing out per-key exclusive leases
#[async_trait]
pub trait DistributedLock: Clone + Send + Sync + 'static {
    type Lease: Lease + 'static;

    /// Acquire `key` for `lease`, waiting up to `wait` for the current holder
    async fn acquire(
        &self,
        key: &str,
        lease: Duration,
        wait: Duration,
    ) -> Result<Self::Lease, LockError>;
}

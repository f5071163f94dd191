// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process lease table
//!
//! A key is either free or held by one holder until its lease expires.
//! Expired holders are reclaimed by the next acquirer rather than swept.

use super::{DistributedLock, HolderId, Lease, LockError};
use async_trait::async_trait;
use brook_core::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Interval between acquisition attempts while waiting
const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Clone)]
struct LeaseRecord {
    holder: HolderId,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct LeaseTable {
    held: HashMap<String, LeaseRecord>,
    renewals: HashMap<String, u32>,
}

impl LeaseTable {
    fn holds(&self, key: &str, holder: &HolderId, now: Instant) -> bool {
        self.held
            .get(key)
            .is_some_and(|record| &record.holder == holder && record.expires_at > now)
    }

    fn remove_if_held_by(&mut self, key: &str, holder: &HolderId) -> bool {
        if self.held.get(key).is_some_and(|record| &record.holder == holder) {
            self.held.remove(key);
            true
        } else {
            false
        }
    }
}

/// Lock provider for a single process; clones share the lease table
#[derive(Clone, Debug)]
pub struct MemoryLockProvider<C: Clock = SystemClock> {
    table: Arc<Mutex<LeaseTable>>,
    clock: C,
}

impl MemoryLockProvider<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryLockProvider<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryLockProvider<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            table: Arc::new(Mutex::new(LeaseTable::default())),
            clock,
        }
    }

    fn table(&self) -> MutexGuard<'_, LeaseTable> {
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether `key` is held by an unexpired lease
    pub fn is_held(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.table()
            .held
            .get(key)
            .is_some_and(|record| record.expires_at > now)
    }

    /// Successful renewals of `key` across all holders
    pub fn renewal_count(&self, key: &str) -> u32 {
        self.table().renewals.get(key).copied().unwrap_or(0)
    }

    fn try_acquire(&self, key: &str, lease: Duration) -> Option<HolderId> {
        let now = self.clock.now();
        let mut table = self.table();
        let stale = match table.held.get(key) {
            Some(record) if record.expires_at > now => return None,
            Some(record) => Some(record.holder.clone()),
            None => None,
        };
        if let Some(stale) = stale {
            tracing::warn!(key, holder = %stale, "reclaiming expired lease");
        }
        let holder = HolderId::generate();
        table.held.insert(
            key.to_string(),
            LeaseRecord {
                holder: holder.clone(),
                expires_at: now + lease,
            },
        );
        Some(holder)
    }
}

#[async_trait]
impl<C: Clock> DistributedLock for MemoryLockProvider<C> {
    type Lease = MemoryLease<C>;

    async fn acquire(
        &self,
        key: &str,
        lease: Duration,
        wait: Duration,
    ) -> Result<MemoryLease<C>, LockError> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            if let Some(holder) = self.try_acquire(key, lease) {
                tracing::debug!(key, %holder, lease_ms = lease.as_millis() as u64, "lease acquired");
                return Ok(MemoryLease {
                    provider: self.clone(),
                    key: key.to_string(),
                    holder,
                    duration: lease,
                    released: false,
                });
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(LockError::Contended {
                    key: key.to_string(),
                });
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

/// Lease handed out by [`MemoryLockProvider`]
#[derive(Debug)]
pub struct MemoryLease<C: Clock = SystemClock> {
    provider: MemoryLockProvider<C>,
    key: String,
    holder: HolderId,
    duration: Duration,
    released: bool,
}

impl<C: Clock> MemoryLease<C> {
    pub fn holder(&self) -> &HolderId {
        &self.holder
    }
}

#[async_trait]
impl<C: Clock> Lease for MemoryLease<C> {
    fn key(&self) -> &str {
        &self.key
    }

    async fn renew(&mut self) -> Result<(), LockError> {
        let now = self.provider.clock.now();
        let mut table = self.provider.table();
        if !table.holds(&self.key, &self.holder, now) {
            return Err(LockError::Expired {
                key: self.key.clone(),
            });
        }
        if let Some(record) = table.held.get_mut(&self.key) {
            record.expires_at = now + self.duration;
        }
        *table.renewals.entry(self.key.clone()).or_default() += 1;
        Ok(())
    }

    async fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        let released = self
            .provider
            .table()
            .remove_if_held_by(&self.key, &self.holder);
        if released {
            Ok(())
        } else {
            Err(LockError::Expired {
                key: self.key.clone(),
            })
        }
    }
}

impl<C: Clock> Drop for MemoryLease<C> {
    fn drop(&mut self) {
        if !self.released {
            self.provider
                .table()
                .remove_if_held_by(&self.key, &self.holder);
        }
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

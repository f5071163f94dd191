// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cursor recovery: resolving the authoritative head of a brook
//!
//! A pending cursor without a committed cursor that covers it means a writer
//! died part way through a batch. Recovery decides, under its own lock, whether
//! that batch landed completely (commit it) or not (delete what landed and
//! restore the previous head).

use crate::error::{BrookError, Result};
use brook_adapters::{BrookRepository, DistributedLock, Lease, LockError, RetryPolicy};
use brook_core::{BrookKey, BrookPosition, PendingCursor, StorageOptions};
use tracing::Instrument;

/// Resolves the append position of a brook, recovering orphaned batches
#[derive(Clone)]
pub struct CursorRecovery<R, L, P> {
    repository: R,
    locks: L,
    retry: P,
    options: StorageOptions,
}

impl<R, L, P> CursorRecovery<R, L, P>
where
    R: BrookRepository,
    L: DistributedLock,
    P: RetryPolicy,
{
    pub fn new(repository: R, locks: L, retry: P, options: StorageOptions) -> Self {
        Self {
            repository,
            locks,
            retry,
            options,
        }
    }

    /// Head according to the committed cursor alone, without recovery
    pub async fn committed_position(&self, key: &BrookKey) -> Result<BrookPosition> {
        committed_head(&self.repository, &self.retry, key).await
    }

    /// Current head of the brook, resolving any orphaned batch first
    pub async fn get_or_recover(&self, key: &BrookKey) -> Result<BrookPosition> {
        let span = tracing::debug_span!("brook.recover", brook = %key);
        async {
            let (committed, pending) = self.read_cursors(key).await?;
            let Some(pending) = pending else {
                return Ok(committed.unwrap_or(BrookPosition::EMPTY));
            };
            if let Some(head) = committed.filter(|head| *head >= pending.position) {
                self.clear_stale_marker(key, head).await;
                return Ok(head);
            }
            self.recover(key, pending).await
        }
        .instrument(span)
        .await
    }

    async fn read_cursors(
        &self,
        key: &BrookKey,
    ) -> Result<(Option<BrookPosition>, Option<PendingCursor>)> {
        let committed = self
            .retry
            .execute(|| self.repository.read_cursor(key))
            .await
            .map_err(BrookError::storage(key))?
            .map(|cursor| cursor.position);
        let pending = self
            .retry
            .execute(|| self.repository.read_pending_cursor(key))
            .await
            .map_err(BrookError::storage(key))?;
        Ok((committed, pending))
    }

    /// Remove a marker whose batch already committed
    async fn clear_stale_marker(&self, key: &BrookKey, head: BrookPosition) {
        tracing::debug!(%head, "removing pending cursor left behind by a committed batch");
        if let Err(e) = self
            .retry
            .execute(|| self.repository.delete_pending_cursor(key))
            .await
        {
            tracing::warn!(error = %e, "failed to remove stale pending cursor");
        }
    }

    async fn recover(&self, key: &BrookKey, observed: PendingCursor) -> Result<BrookPosition> {
        let lock_key = key.recovery_lock_key();
        tracing::info!(
            original = %observed.original_position,
            target = %observed.position,
            "orphaned batch detected"
        );

        match self
            .locks
            .acquire(
                &lock_key,
                self.options.lease_duration(),
                self.options.recovery_lock_wait(),
            )
            .await
        {
            Ok(lease) => {
                let result = self.resolve_under_lock(key).await;
                if let Err(e) = lease.release().await {
                    tracing::warn!(error = %e, "failed to release recovery lease");
                }
                result
            }
            Err(LockError::Contended { .. }) => {
                tracing::warn!(
                    lock_key = %lock_key,
                    backoff_ms = self.options.recovery_backoff.as_millis() as u64,
                    "recovery lock busy, re-reading cursor"
                );
                tokio::time::sleep(self.options.recovery_backoff).await;
                let (committed, pending) = self.read_cursors(key).await?;
                match pending {
                    None => Ok(committed.unwrap_or(BrookPosition::EMPTY)),
                    Some(pending) if pending.is_covered_by(committed) => {
                        Ok(committed.unwrap_or(BrookPosition::EMPTY))
                    }
                    Some(_) => {
                        tracing::error!("orphaned batch is still unresolved");
                        Err(BrookError::RecoveryUnresolvable { key: key.clone() })
                    }
                }
            }
            Err(e) => Err(BrookError::lock(key, &lock_key)(e)),
        }
    }

    async fn resolve_under_lock(&self, key: &BrookKey) -> Result<BrookPosition> {
        // Another recoverer may have finished while we waited for the lock
        let (committed, pending) = self.read_cursors(key).await?;
        let Some(pending) = pending else {
            return Ok(committed.unwrap_or(BrookPosition::EMPTY));
        };
        if let Some(head) = committed.filter(|head| *head >= pending.position) {
            self.clear_stale_marker(key, head).await;
            return Ok(head);
        }

        if self.batch_landed(key, &pending).await? {
            self.retry
                .execute(|| self.repository.write_cursor(key, pending.position))
                .await
                .map_err(BrookError::storage(key))?;
            self.retry
                .execute(|| self.repository.delete_pending_cursor(key))
                .await
                .map_err(BrookError::storage(key))?;
            tracing::info!(head = %pending.position, "orphaned batch had fully landed, committed");
            return Ok(pending.position);
        }

        let mut failed_deletes = 0usize;
        for position in pending.positions() {
            if let Err(e) = self
                .retry
                .execute(|| self.repository.delete_event(key, position))
                .await
            {
                failed_deletes += 1;
                tracing::warn!(%position, error = %e, "failed to delete orphaned event");
            }
        }

        let original = pending.original_position;
        if !original.is_empty() && committed != Some(original) {
            self.retry
                .execute(|| self.repository.write_cursor(key, original))
                .await
                .map_err(BrookError::storage(key))?;
        }
        self.retry
            .execute(|| self.repository.delete_pending_cursor(key))
            .await
            .map_err(BrookError::storage(key))?;

        tracing::warn!(
            head = %original,
            discarded = pending.span(),
            failed_deletes,
            "orphaned batch was incomplete, rolled back"
        );
        Ok(original)
    }

    /// Whether every event of the pending batch is stored
    async fn batch_landed(&self, key: &BrookKey, pending: &PendingCursor) -> Result<bool> {
        let expected = pending.span();
        if expected <= self.options.existence_probe_threshold as i64 {
            for position in pending.positions() {
                let exists = self
                    .retry
                    .execute(|| self.repository.event_exists(key, position))
                    .await
                    .map_err(BrookError::storage(key))?;
                if !exists {
                    tracing::debug!(%position, "orphaned batch is missing an event");
                    return Ok(false);
                }
            }
            return Ok(true);
        }

        let found = self
            .retry
            .execute(|| {
                self.repository
                    .existing_positions(key, pending.original_position, pending.position)
            })
            .await
            .map_err(BrookError::storage(key))?;
        tracing::debug!(expected, found = found.len(), "range probe of orphaned batch");
        Ok(found.len() as i64 == expected)
    }
}

/// Head recorded by the committed cursor; a brook without one is empty
pub(crate) async fn committed_head<R, P>(
    repository: &R,
    retry: &P,
    key: &BrookKey,
) -> Result<BrookPosition>
where
    R: BrookRepository,
    P: RetryPolicy,
{
    let cursor = retry
        .execute(|| repository.read_cursor(key))
        .await
        .map_err(BrookError::storage(key))?;
    Ok(cursor.map_or(BrookPosition::EMPTY, |c| c.position))
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;

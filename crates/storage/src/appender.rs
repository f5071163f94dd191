// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event appender: the write side of the brook protocol
//!
//! Every append runs under the brook's write lease. A pending cursor marks
//! the batch boundary before any event is written, so a writer that dies
//! mid-batch leaves enough behind for [`CursorRecovery`] to finish or undo
//! the batch.

use crate::error::{BrookError, Result};
use crate::recovery::CursorRecovery;
use brook_adapters::{BrookRepository, DistributedLock, Lease, RetryPolicy};
use brook_core::{
    estimated_batch_size, BrookKey, BrookPosition, Clock, EventData, PendingCursor,
    StorageOptions, SystemClock,
};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// A large batch renews its lease at least every this many chunks
pub const RENEW_EVERY_CHUNKS: usize = 5;

/// Appends events to brooks
#[derive(Clone)]
pub struct EventAppender<R, L, P, C = SystemClock> {
    repository: R,
    locks: L,
    retry: P,
    recovery: CursorRecovery<R, L, P>,
    options: StorageOptions,
    clock: C,
}

impl<R, L, P> EventAppender<R, L, P, SystemClock>
where
    R: BrookRepository,
    L: DistributedLock,
    P: RetryPolicy,
{
    pub fn new(repository: R, locks: L, retry: P, options: StorageOptions) -> Self {
        Self::with_clock(repository, locks, retry, options, SystemClock)
    }
}

impl<R, L, P, C> EventAppender<R, L, P, C>
where
    R: BrookRepository,
    L: DistributedLock,
    P: RetryPolicy,
    C: Clock,
{
    pub fn with_clock(repository: R, locks: L, retry: P, options: StorageOptions, clock: C) -> Self {
        let recovery = CursorRecovery::new(
            repository.clone(),
            locks.clone(),
            retry.clone(),
            options.clone(),
        );
        Self {
            repository,
            locks,
            retry,
            recovery,
            options,
            clock,
        }
    }

    /// Append `events` after the current head and return the new head.
    ///
    /// With `expected_version` set, the append fails with
    /// [`BrookError::Conflict`] unless the brook holds exactly that many
    /// events. Dropping the returned future releases the write lease; any
    /// half-written batch is left to recovery.
    pub async fn append(
        &self,
        key: &BrookKey,
        events: &[EventData],
        expected_version: Option<BrookPosition>,
    ) -> Result<BrookPosition> {
        validate(key, events)?;
        let chunks = plan_chunks(key, events, &self.options)?;

        let span = tracing::info_span!(
            "brook.append",
            brook = %key,
            events = events.len(),
            bytes = estimated_batch_size(events),
            chunks = chunks.len(),
        );
        async {
            let lock_key = key.write_lock_key();
            let wait = self.options.lease_duration();
            let mut lease = self
                .locks
                .acquire(&lock_key, self.options.lease_duration(), wait)
                .await
                .map_err(BrookError::lock(key, &lock_key))?;

            let result = self
                .append_locked(key, events, &chunks, expected_version, &mut lease)
                .await;

            if let Err(e) = lease.release().await {
                tracing::warn!(error = %e, "failed to release write lease");
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn append_locked(
        &self,
        key: &BrookKey,
        events: &[EventData],
        chunks: &[&[EventData]],
        expected_version: Option<BrookPosition>,
        lease: &mut L::Lease,
    ) -> Result<BrookPosition> {
        let current = self.recovery.get_or_recover(key).await?;

        if let Some(expected) = expected_version {
            if expected.event_count() != current.event_count() {
                tracing::debug!(%expected, actual = %current, "expected version is stale");
                return Err(BrookError::Conflict {
                    key: key.clone(),
                    expected,
                    actual: current,
                });
            }
        }

        let target = current
            .advance(events.len())
            .ok_or_else(|| BrookError::Overflow {
                key: key.clone(),
                head: current,
                count: events.len(),
            })?;
        let pending = PendingCursor::new(current, target);

        if chunks.len() > 1 {
            self.append_large(key, pending, chunks, lease).await
        } else {
            self.append_single(key, pending, events).await
        }
    }

    async fn append_single(
        &self,
        key: &BrookKey,
        pending: PendingCursor,
        events: &[EventData],
    ) -> Result<BrookPosition> {
        self.write_pending(key, pending).await?;

        let first = pending.original_position.first_after();
        if let Err(e) = self
            .retry
            .execute(|| self.repository.append_events(key, first, events))
            .await
        {
            return self
                .resolve_failed_batch(key, pending, BrookError::storage(key)(e))
                .await;
        }

        self.commit(key, pending.position).await
    }

    /// Settle a single batch whose write reported failure.
    ///
    /// The failure may have arrived after the batch landed, so the pending
    /// cursor stays until recovery has checked what is stored. A batch that
    /// landed is committed and the append succeeds.
    async fn resolve_failed_batch(
        &self,
        key: &BrookKey,
        pending: PendingCursor,
        cause: BrookError,
    ) -> Result<BrookPosition> {
        tracing::warn!(error = %cause, "batch write failed, resolving pending batch");
        match self.recovery.get_or_recover(key).await {
            Ok(head) if head == pending.position => {
                tracing::info!(%head, "batch landed despite the failed write");
                Ok(head)
            }
            Ok(_) => Err(cause),
            Err(e) => {
                tracing::warn!(error = %e, "pending cursor left for recovery");
                Err(cause)
            }
        }
    }

    async fn append_large(
        &self,
        key: &BrookKey,
        pending: PendingCursor,
        chunks: &[&[EventData]],
        lease: &mut L::Lease,
    ) -> Result<BrookPosition> {
        self.write_pending(key, pending).await?;

        let mut progress = ChunkProgress::default();
        if let Err(e) = self
            .write_chunks(key, pending.original_position, chunks, lease, &mut progress)
            .await
        {
            return Err(self.roll_back(key, pending, progress, e).await);
        }

        self.commit(key, pending.position).await
    }

    /// Write chunks in order, tracking confirmed and attempted events
    async fn write_chunks(
        &self,
        key: &BrookKey,
        original: BrookPosition,
        chunks: &[&[EventData]],
        lease: &mut L::Lease,
        progress: &mut ChunkProgress,
    ) -> Result<()> {
        let threshold = self.options.lease_renewal_threshold();
        let mut last_renewal = self.clock.now();

        for (index, chunk) in chunks.iter().enumerate() {
            if index > 0 && self.renewal_due(index, last_renewal, threshold) {
                let lock_key = lease.key().to_string();
                lease
                    .renew()
                    .await
                    .map_err(BrookError::lock(key, &lock_key))?;
                last_renewal = self.clock.now();
                tracing::debug!(chunk = index, "write lease renewed");
            }

            let first = progress.next_position(original);
            progress.attempted = progress.confirmed + chunk.len();
            self.retry
                .execute(|| self.repository.append_events(key, first, chunk))
                .await
                .map_err(BrookError::storage(key))?;
            progress.confirmed = progress.attempted;
            tracing::debug!(chunk = index, %first, events = chunk.len(), "chunk written");
        }
        Ok(())
    }

    fn renewal_due(&self, index: usize, last_renewal: Instant, threshold: Duration) -> bool {
        index % RENEW_EVERY_CHUNKS == 0 || self.clock.elapsed_since(last_renewal) >= threshold
    }

    /// Undo a failed large batch.
    ///
    /// Deletes the confirmed chunks and the chunk in flight when the failure
    /// hit, whose write may have landed anyway, then checks the whole staged
    /// range. Returns `cause` itself when the brook is clean again and
    /// [`BrookError::RollbackFailed`] when anything was left behind. The
    /// pending cursor is kept while events remain so recovery can finish the
    /// cleanup.
    async fn roll_back(
        &self,
        key: &BrookKey,
        pending: PendingCursor,
        progress: ChunkProgress,
        cause: BrookError,
    ) -> BrookError {
        let original = pending.original_position;
        let first = original.first_after().value();
        let staged: Vec<BrookPosition> = (0..progress.attempted as i64)
            .map(|offset| BrookPosition::new(first + offset))
            .collect();
        tracing::warn!(
            error = %cause,
            confirmed = progress.confirmed,
            in_flight = progress.attempted - progress.confirmed,
            "large batch failed, rolling back"
        );

        let mut residue = BTreeSet::new();
        for &position in &staged {
            if let Err(e) = self
                .retry
                .execute(|| self.repository.delete_event(key, position))
                .await
            {
                tracing::error!(%position, error = %e, "rollback delete failed");
                residue.insert(position.value());
            }
        }

        match self
            .retry
            .execute(|| {
                self.repository
                    .existing_positions(key, original, pending.position)
            })
            .await
        {
            Ok(found) => {
                for position in found {
                    tracing::error!(%position, "event survived rollback");
                    residue.insert(position.value());
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "rollback verification failed");
                residue.extend(staged.iter().map(|position| position.value()));
            }
        }

        let pending_cursor_left = if residue.is_empty() {
            match self
                .retry
                .execute(|| self.repository.delete_pending_cursor(key))
                .await
            {
                Ok(()) => false,
                Err(e) => {
                    tracing::error!(error = %e, "rollback could not delete pending cursor");
                    true
                }
            }
        } else {
            true
        };

        if residue.is_empty() && !pending_cursor_left {
            tracing::info!(head = %original, "large batch rolled back");
            return cause;
        }
        BrookError::RollbackFailed {
            key: key.clone(),
            positions: residue.into_iter().collect(),
            pending_cursor_left,
            source: Box::new(cause),
        }
    }

    async fn write_pending(&self, key: &BrookKey, pending: PendingCursor) -> Result<()> {
        self.retry
            .execute(|| self.repository.write_pending_cursor(key, pending))
            .await
            .map_err(BrookError::storage(key))
    }

    /// Move the committed cursor to `target` and drop the pending marker
    async fn commit(&self, key: &BrookKey, target: BrookPosition) -> Result<BrookPosition> {
        self.retry
            .execute(|| self.repository.write_cursor(key, target))
            .await
            .map_err(BrookError::storage(key))?;

        // A leftover marker is covered by the committed cursor and cleared
        // by the next recovery pass
        if let Err(e) = self
            .retry
            .execute(|| self.repository.delete_pending_cursor(key))
            .await
        {
            tracing::warn!(error = %e, "failed to delete pending cursor after commit");
        }
        tracing::info!(head = %target, "batch committed");
        Ok(target)
    }
}

/// Events of a large batch handed to storage so far
#[derive(Debug, Default, Clone, Copy)]
struct ChunkProgress {
    /// Events whose write was acknowledged
    confirmed: usize,
    /// Confirmed events plus the chunk in flight
    attempted: usize,
}

impl ChunkProgress {
    fn next_position(&self, original: BrookPosition) -> BrookPosition {
        BrookPosition::new(original.first_after().value() + self.confirmed as i64)
    }
}

fn validate(key: &BrookKey, events: &[EventData]) -> Result<()> {
    if events.is_empty() {
        return Err(BrookError::Validation {
            key: key.clone(),
            reason: "no events to append".to_string(),
        });
    }
    if events.len() > i32::MAX as usize {
        return Err(BrookError::Validation {
            key: key.clone(),
            reason: format!("{} events exceed the per-append limit", events.len()),
        });
    }
    Ok(())
}

/// Split `events` into chunks that each fit in one storage request.
///
/// A batch within both limits comes back as a single chunk.
pub fn plan_chunks<'a>(
    key: &BrookKey,
    events: &'a [EventData],
    options: &StorageOptions,
) -> Result<Vec<&'a [EventData]>> {
    let max_events = options.max_events_per_batch.max(1);
    let max_bytes = options.max_request_size_bytes;

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut bytes = 0;
    for (index, event) in events.iter().enumerate() {
        let size = event.estimated_size();
        if size > max_bytes {
            return Err(BrookError::EventTooLarge {
                key: key.clone(),
                index,
                size,
                limit: max_bytes,
            });
        }
        let count = index - start;
        if count > 0 && (count >= max_events || bytes + size > max_bytes) {
            chunks.push(&events[start..index]);
            start = index;
            bytes = 0;
        }
        bytes += size;
    }
    if start < events.len() {
        chunks.push(&events[start..]);
    }
    Ok(chunks)
}

#[cfg(test)]
#[path = "appender_tests.rs"]
mod tests;

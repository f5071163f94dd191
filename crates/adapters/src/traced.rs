// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced repository wrapper for consistent observability

use crate::repository::{BrookRepository, RepositoryError};
use async_trait::async_trait;
use brook_core::{BrookEvent, BrookKey, BrookPosition, CommittedCursor, EventData, PendingCursor};
use tracing::Instrument;

/// Wrapper that adds tracing to any BrookRepository
#[derive(Clone)]
pub struct TracedRepository<R> {
    inner: R,
}

impl<R> TracedRepository<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

fn log_write_outcome<T>(result: &Result<T, RepositoryError>, start: std::time::Instant, what: &str) {
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match result {
        Ok(_) => tracing::debug!(elapsed_ms, "{what} stored"),
        Err(e) if e.is_transient() => {
            tracing::warn!(elapsed_ms, error = %e, "{what} failed transiently")
        }
        Err(e) => tracing::error!(elapsed_ms, error = %e, "{what} failed"),
    }
}

#[async_trait]
impl<R: BrookRepository> BrookRepository for TracedRepository<R> {
    async fn read_cursor(&self, key: &BrookKey) -> Result<Option<CommittedCursor>, RepositoryError> {
        let result = self.inner.read_cursor(key).await;
        tracing::trace!(brook = %key, cursor = ?result.as_ref().ok(), "read cursor");
        result
    }

    async fn write_cursor(
        &self,
        key: &BrookKey,
        position: BrookPosition,
    ) -> Result<(), RepositoryError> {
        let span = tracing::info_span!("repository.write_cursor", brook = %key, %position);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.write_cursor(key, position).await;
            log_write_outcome(&result, start, "cursor");
            result
        }
        .instrument(span)
        .await
    }

    async fn read_pending_cursor(
        &self,
        key: &BrookKey,
    ) -> Result<Option<PendingCursor>, RepositoryError> {
        let result = self.inner.read_pending_cursor(key).await;
        tracing::trace!(brook = %key, pending = ?result.as_ref().ok(), "read pending cursor");
        result
    }

    async fn write_pending_cursor(
        &self,
        key: &BrookKey,
        pending: PendingCursor,
    ) -> Result<(), RepositoryError> {
        let span = tracing::info_span!(
            "repository.write_pending_cursor",
            brook = %key,
            original = %pending.original_position,
            target = %pending.position,
        );
        async {
            let start = std::time::Instant::now();
            let result = self.inner.write_pending_cursor(key, pending).await;
            log_write_outcome(&result, start, "pending cursor");
            result
        }
        .instrument(span)
        .await
    }

    async fn delete_pending_cursor(&self, key: &BrookKey) -> Result<(), RepositoryError> {
        let span = tracing::info_span!("repository.delete_pending_cursor", brook = %key);
        async {
            let start = std::time::Instant::now();
            let result = self.inner.delete_pending_cursor(key).await;
            log_write_outcome(&result, start, "pending cursor delete");
            result
        }
        .instrument(span)
        .await
    }

    async fn append_events(
        &self,
        key: &BrookKey,
        first: BrookPosition,
        events: &[EventData],
    ) -> Result<(), RepositoryError> {
        let span = tracing::info_span!(
            "repository.append_events",
            brook = %key,
            %first,
            count = events.len(),
        );
        async {
            let start = std::time::Instant::now();
            let result = self.inner.append_events(key, first, events).await;
            log_write_outcome(&result, start, "events");
            result
        }
        .instrument(span)
        .await
    }

    async fn event_exists(
        &self,
        key: &BrookKey,
        position: BrookPosition,
    ) -> Result<bool, RepositoryError> {
        let result = self.inner.event_exists(key, position).await;
        tracing::trace!(brook = %key, %position, exists = ?result.as_ref().ok(), "probed event");
        result
    }

    async fn existing_positions(
        &self,
        key: &BrookKey,
        from_exclusive: BrookPosition,
        to_inclusive: BrookPosition,
    ) -> Result<Vec<BrookPosition>, RepositoryError> {
        let result = self
            .inner
            .existing_positions(key, from_exclusive, to_inclusive)
            .await;
        tracing::debug!(
            brook = %key,
            from = %from_exclusive,
            to = %to_inclusive,
            found = result.as_ref().map(|p| p.len()).ok(),
            "queried existing positions"
        );
        result
    }

    async fn delete_event(
        &self,
        key: &BrookKey,
        position: BrookPosition,
    ) -> Result<(), RepositoryError> {
        let result = self.inner.delete_event(key, position).await;
        // delete failures are reported by the caller, which decides if they matter
        match &result {
            Ok(()) => tracing::debug!(brook = %key, %position, "event deleted"),
            Err(e) => tracing::warn!(brook = %key, %position, error = %e, "event delete failed"),
        }
        result
    }

    async fn read_events(
        &self,
        key: &BrookKey,
        from_exclusive: BrookPosition,
        to_inclusive: BrookPosition,
        limit: usize,
    ) -> Result<Vec<BrookEvent>, RepositoryError> {
        let result = self
            .inner
            .read_events(key, from_exclusive, to_inclusive, limit)
            .await;
        tracing::trace!(
            brook = %key,
            from = %from_exclusive,
            to = %to_inclusive,
            limit,
            returned = result.as_ref().map(|page| page.len()).ok(),
            "read event page"
        );
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake repository with call recording and fault injection
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{BrookRepository, MemoryRepository, RepositoryError};
use async_trait::async_trait;
use brook_core::{BrookEvent, BrookKey, BrookPosition, CommittedCursor, EventData, PendingCursor};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Recorded repository call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryCall {
    ReadCursor,
    WriteCursor { position: i64 },
    ReadPending,
    WritePending { original: i64, target: i64 },
    DeletePending,
    Append { first: i64, count: usize },
    EventExists { position: i64 },
    ExistingPositions { from: i64, to: i64 },
    DeleteEvent { position: i64 },
    ReadEvents { from: i64, to: i64, limit: usize },
}

#[derive(Debug, Default)]
struct Faults {
    /// Append calls that succeed before every later append fails
    appends_before_failure: Option<usize>,
    /// Append calls that fail transiently before one is let through
    transient_appends: usize,
    /// Append call that stores its events but reports a transient failure
    lost_acknowledgement: Option<usize>,
    appends_seen: usize,
    failing_deletes: HashSet<i64>,
    /// Positions whose delete reports success but leaves the event behind
    sticky_positions: HashSet<i64>,
    fail_cursor_writes: bool,
    fail_pending_deletes: bool,
}

/// Fake repository for testing the brook protocols.
///
/// Stores documents in a [`MemoryRepository`]; clones share documents,
/// recorded calls and injected faults.
#[derive(Clone, Default)]
pub struct FakeRepository {
    store: MemoryRepository,
    calls: Arc<Mutex<Vec<RepositoryCall>>>,
    faults: Arc<Mutex<Faults>>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Underlying documents, for seeding crash states and inspecting results
    pub fn store(&self) -> &MemoryRepository {
        &self.store
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<RepositoryCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Let `count` more appends succeed, then fail every later append
    pub fn fail_appends_after(&self, count: usize) {
        let mut faults = self.faults();
        faults.appends_before_failure = Some(faults.appends_seen + count);
    }

    /// Fail the next `count` appends with a transient error
    pub fn fail_appends_transiently(&self, count: usize) {
        self.faults().transient_appends = count;
    }

    /// Let `count` more appends succeed, then store the next one but report
    /// a transient failure, as when a timeout arrives after the write landed
    pub fn land_then_fail_append(&self, count: usize) {
        let mut faults = self.faults();
        faults.lost_acknowledgement = Some(faults.appends_seen + count);
    }

    pub fn fail_delete_at(&self, position: i64) {
        self.faults().failing_deletes.insert(position);
    }

    /// Make deletes at `position` report success without removing the event
    pub fn stick_event_at(&self, position: i64) {
        self.faults().sticky_positions.insert(position);
    }

    pub fn fail_cursor_writes(&self, fail: bool) {
        self.faults().fail_cursor_writes = fail;
    }

    pub fn fail_pending_deletes(&self, fail: bool) {
        self.faults().fail_pending_deletes = fail;
    }

    /// Remove every injected fault
    pub fn heal(&self) {
        let mut faults = self.faults();
        let seen = faults.appends_seen;
        *faults = Faults {
            appends_seen: seen,
            ..Faults::default()
        };
    }

    fn faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, call: RepositoryCall) {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

#[async_trait]
impl BrookRepository for FakeRepository {
    async fn read_cursor(&self, key: &BrookKey) -> Result<Option<CommittedCursor>, RepositoryError> {
        self.record(RepositoryCall::ReadCursor);
        self.store.read_cursor(key).await
    }

    async fn write_cursor(
        &self,
        key: &BrookKey,
        position: BrookPosition,
    ) -> Result<(), RepositoryError> {
        self.record(RepositoryCall::WriteCursor {
            position: position.value(),
        });
        if self.faults().fail_cursor_writes {
            return Err(RepositoryError::Storage("injected cursor write failure".into()));
        }
        self.store.write_cursor(key, position).await
    }

    async fn read_pending_cursor(
        &self,
        key: &BrookKey,
    ) -> Result<Option<PendingCursor>, RepositoryError> {
        self.record(RepositoryCall::ReadPending);
        self.store.read_pending_cursor(key).await
    }

    async fn write_pending_cursor(
        &self,
        key: &BrookKey,
        pending: PendingCursor,
    ) -> Result<(), RepositoryError> {
        self.record(RepositoryCall::WritePending {
            original: pending.original_position.value(),
            target: pending.position.value(),
        });
        self.store.write_pending_cursor(key, pending).await
    }

    async fn delete_pending_cursor(&self, key: &BrookKey) -> Result<(), RepositoryError> {
        self.record(RepositoryCall::DeletePending);
        if self.faults().fail_pending_deletes {
            return Err(RepositoryError::Storage("injected pending delete failure".into()));
        }
        self.store.delete_pending_cursor(key).await
    }

    async fn append_events(
        &self,
        key: &BrookKey,
        first: BrookPosition,
        events: &[EventData],
    ) -> Result<(), RepositoryError> {
        self.record(RepositoryCall::Append {
            first: first.value(),
            count: events.len(),
        });
        let lose_acknowledgement = {
            let mut faults = self.faults();
            if faults.transient_appends > 0 {
                faults.transient_appends -= 1;
                return Err(RepositoryError::Transient("injected throttling".into()));
            }
            let seen = faults.appends_seen;
            faults.appends_seen += 1;
            if faults.appends_before_failure.is_some_and(|limit| seen >= limit) {
                return Err(RepositoryError::Storage("injected append failure".into()));
            }
            faults.lost_acknowledgement == Some(seen)
        };
        self.store.append_events(key, first, events).await?;
        if lose_acknowledgement {
            return Err(RepositoryError::Transient("injected timeout after write".into()));
        }
        Ok(())
    }

    async fn event_exists(
        &self,
        key: &BrookKey,
        position: BrookPosition,
    ) -> Result<bool, RepositoryError> {
        self.record(RepositoryCall::EventExists {
            position: position.value(),
        });
        self.store.event_exists(key, position).await
    }

    async fn existing_positions(
        &self,
        key: &BrookKey,
        from_exclusive: BrookPosition,
        to_inclusive: BrookPosition,
    ) -> Result<Vec<BrookPosition>, RepositoryError> {
        self.record(RepositoryCall::ExistingPositions {
            from: from_exclusive.value(),
            to: to_inclusive.value(),
        });
        self.store
            .existing_positions(key, from_exclusive, to_inclusive)
            .await
    }

    async fn delete_event(
        &self,
        key: &BrookKey,
        position: BrookPosition,
    ) -> Result<(), RepositoryError> {
        self.record(RepositoryCall::DeleteEvent {
            position: position.value(),
        });
        {
            let faults = self.faults();
            if faults.failing_deletes.contains(&position.value()) {
                return Err(RepositoryError::Storage(format!(
                    "injected delete failure at {}",
                    position
                )));
            }
            if faults.sticky_positions.contains(&position.value()) {
                return Ok(());
            }
        }
        self.store.delete_event(key, position).await
    }

    async fn read_events(
        &self,
        key: &BrookKey,
        from_exclusive: BrookPosition,
        to_inclusive: BrookPosition,
        limit: usize,
    ) -> Result<Vec<BrookEvent>, RepositoryError> {
        self.record(RepositoryCall::ReadEvents {
            from: from_exclusive.value(),
            to: to_inclusive.value(),
            limit,
        });
        self.store
            .read_events(key, from_exclusive, to_inclusive, limit)
            .await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;

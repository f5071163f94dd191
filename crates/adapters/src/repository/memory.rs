// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process document store

use super::{BrookRepository, RepositoryError};
use async_trait::async_trait;
use brook_core::{BrookEvent, BrookKey, BrookPosition, CommittedCursor, EventData, PendingCursor};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct BrookDocuments {
    cursor: Option<CommittedCursor>,
    pending: Option<PendingCursor>,
    events: BTreeMap<i64, BrookEvent>,
}

/// Repository keeping every brook in memory.
///
/// Clones share the same documents.
#[derive(Clone, Debug, Default)]
pub struct MemoryRepository {
    brooks: Arc<Mutex<HashMap<BrookKey, BrookDocuments>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<BrookKey, BrookDocuments>> {
        self.brooks.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Positions currently holding an event
    pub fn stored_positions(&self, key: &BrookKey) -> Vec<i64> {
        self.lock()
            .get(key)
            .map(|docs| docs.events.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Committed and pending cursor of a brook, read without I/O semantics
    pub fn cursors(&self, key: &BrookKey) -> (Option<CommittedCursor>, Option<PendingCursor>) {
        self.lock()
            .get(key)
            .map(|docs| (docs.cursor, docs.pending))
            .unwrap_or_default()
    }

    /// Store an event directly, bypassing the append protocol
    pub fn insert_event(&self, key: &BrookKey, position: BrookPosition, data: &EventData) {
        self.lock()
            .entry(key.clone())
            .or_default()
            .events
            .insert(position.value(), BrookEvent::from_data(position, data));
    }
}

#[async_trait]
impl BrookRepository for MemoryRepository {
    async fn read_cursor(&self, key: &BrookKey) -> Result<Option<CommittedCursor>, RepositoryError> {
        Ok(self.lock().get(key).and_then(|docs| docs.cursor))
    }

    async fn write_cursor(
        &self,
        key: &BrookKey,
        position: BrookPosition,
    ) -> Result<(), RepositoryError> {
        self.lock().entry(key.clone()).or_default().cursor = Some(CommittedCursor { position });
        Ok(())
    }

    async fn read_pending_cursor(
        &self,
        key: &BrookKey,
    ) -> Result<Option<PendingCursor>, RepositoryError> {
        Ok(self.lock().get(key).and_then(|docs| docs.pending))
    }

    async fn write_pending_cursor(
        &self,
        key: &BrookKey,
        pending: PendingCursor,
    ) -> Result<(), RepositoryError> {
        self.lock().entry(key.clone()).or_default().pending = Some(pending);
        Ok(())
    }

    async fn delete_pending_cursor(&self, key: &BrookKey) -> Result<(), RepositoryError> {
        if let Some(docs) = self.lock().get_mut(key) {
            docs.pending = None;
        }
        Ok(())
    }

    async fn append_events(
        &self,
        key: &BrookKey,
        first: BrookPosition,
        events: &[EventData],
    ) -> Result<(), RepositoryError> {
        let mut brooks = self.lock();
        let docs = brooks.entry(key.clone()).or_default();

        let positions: Vec<BrookPosition> = (0..events.len() as i64)
            .map(|offset| BrookPosition::new(first.value() + offset))
            .collect();
        if let Some(taken) = positions
            .iter()
            .find(|position| docs.events.contains_key(&position.value()))
        {
            return Err(RepositoryError::Conflict { position: *taken });
        }

        for (position, data) in positions.into_iter().zip(events) {
            docs.events
                .insert(position.value(), BrookEvent::from_data(position, data));
        }
        Ok(())
    }

    async fn event_exists(
        &self,
        key: &BrookKey,
        position: BrookPosition,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .lock()
            .get(key)
            .is_some_and(|docs| docs.events.contains_key(&position.value())))
    }

    async fn existing_positions(
        &self,
        key: &BrookKey,
        from_exclusive: BrookPosition,
        to_inclusive: BrookPosition,
    ) -> Result<Vec<BrookPosition>, RepositoryError> {
        if to_inclusive <= from_exclusive {
            return Ok(Vec::new());
        }
        Ok(self
            .lock()
            .get(key)
            .map(|docs| {
                docs.events
                    .range(from_exclusive.value() + 1..=to_inclusive.value())
                    .map(|(position, _)| BrookPosition::new(*position))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete_event(
        &self,
        key: &BrookKey,
        position: BrookPosition,
    ) -> Result<(), RepositoryError> {
        if let Some(docs) = self.lock().get_mut(key) {
            docs.events.remove(&position.value());
        }
        Ok(())
    }

    async fn read_events(
        &self,
        key: &BrookKey,
        from_exclusive: BrookPosition,
        to_inclusive: BrookPosition,
        limit: usize,
    ) -> Result<Vec<BrookEvent>, RepositoryError> {
        if to_inclusive <= from_exclusive {
            return Ok(Vec::new());
        }
        Ok(self
            .lock()
            .get(key)
            .map(|docs| {
                docs.events
                    .range(from_exclusive.value() + 1..=to_inclusive.value())
                    .take(limit)
                    .map(|(_, event)| event.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

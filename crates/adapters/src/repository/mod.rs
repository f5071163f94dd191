// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document-store port for brook events and cursor documents

mod memory;

pub use memory::MemoryRepository;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeRepository, RepositoryCall};

use async_trait::async_trait;
use brook_core::{BrookEvent, BrookKey, BrookPosition, CommittedCursor, EventData, PendingCursor};
use thiserror::Error;

/// Errors from the document store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// Throttling, timeouts and other failures worth retrying
    #[error("transient storage failure: {0}")]
    Transient(String),
    #[error("event already stored at position {position}")]
    Conflict { position: BrookPosition },
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RepositoryError {
    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Transient(_))
    }
}

/// Storage operations the brook protocols are built on.
///
/// Only single-document operations and one batch insert are assumed atomic;
/// nothing spans documents.
#[async_trait]
pub trait BrookRepository: Clone + Send + Sync + 'static {
    /// Read the committed cursor
    async fn read_cursor(&self, key: &BrookKey) -> Result<Option<CommittedCursor>, RepositoryError>;

    /// Create or overwrite the committed cursor
    async fn write_cursor(&self, key: &BrookKey, position: BrookPosition)
        -> Result<(), RepositoryError>;

    /// Read the pending cursor of an in-flight or crashed batch
    async fn read_pending_cursor(
        &self,
        key: &BrookKey,
    ) -> Result<Option<PendingCursor>, RepositoryError>;

    /// Create or overwrite the pending cursor
    async fn write_pending_cursor(
        &self,
        key: &BrookKey,
        pending: PendingCursor,
    ) -> Result<(), RepositoryError>;

    /// Delete the pending cursor; deleting an absent cursor succeeds
    async fn delete_pending_cursor(&self, key: &BrookKey) -> Result<(), RepositoryError>;

    /// Insert `events` at consecutive positions starting with `first`.
    ///
    /// The batch lands entirely or not at all. An occupied position fails
    /// with [`RepositoryError::Conflict`].
    async fn append_events(
        &self,
        key: &BrookKey,
        first: BrookPosition,
        events: &[EventData],
    ) -> Result<(), RepositoryError>;

    /// Check whether an event is stored at `position`
    async fn event_exists(&self, key: &BrookKey, position: BrookPosition)
        -> Result<bool, RepositoryError>;

    /// Positions in `(from_exclusive, to_inclusive]` that hold an event
    async fn existing_positions(
        &self,
        key: &BrookKey,
        from_exclusive: BrookPosition,
        to_inclusive: BrookPosition,
    ) -> Result<Vec<BrookPosition>, RepositoryError>;

    /// Delete the event at `position`; deleting an absent event succeeds
    async fn delete_event(&self, key: &BrookKey, position: BrookPosition)
        -> Result<(), RepositoryError>;

    /// Up to `limit` events in `(from_exclusive, to_inclusive]`, ascending
    async fn read_events(
        &self,
        key: &BrookKey,
        from_exclusive: BrookPosition,
        to_inclusive: BrookPosition,
        limit: usize,
    ) -> Result<Vec<BrookEvent>, RepositoryError>;
}

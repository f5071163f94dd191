// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Brook store: recovery, appender and reader over one set of ports

use crate::appender::EventAppender;
use crate::error::Result;
use crate::reader::EventReader;
use crate::recovery::CursorRecovery;
use brook_adapters::{BrookRepository, DistributedLock, RetryPolicy};
use brook_core::{BrookEvent, BrookKey, BrookPosition, Clock, EventData, StorageOptions, SystemClock};
use futures::Stream;

/// Entry point for writing and reading brooks
#[derive(Clone)]
pub struct BrookStore<R, L, P, C = SystemClock> {
    recovery: CursorRecovery<R, L, P>,
    appender: EventAppender<R, L, P, C>,
    reader: EventReader<R, P>,
}

impl<R, L, P> BrookStore<R, L, P, SystemClock>
where
    R: BrookRepository,
    L: DistributedLock,
    P: RetryPolicy,
{
    pub fn new(repository: R, locks: L, retry: P, options: StorageOptions) -> Self {
        Self::with_clock(repository, locks, retry, options, SystemClock)
    }
}

impl<R, L, P, C> BrookStore<R, L, P, C>
where
    R: BrookRepository,
    L: DistributedLock,
    P: RetryPolicy,
    C: Clock,
{
    pub fn with_clock(repository: R, locks: L, retry: P, options: StorageOptions, clock: C) -> Self {
        Self {
            recovery: CursorRecovery::new(
                repository.clone(),
                locks.clone(),
                retry.clone(),
                options.clone(),
            ),
            reader: EventReader::new(repository.clone(), retry.clone(), &options),
            appender: EventAppender::with_clock(repository, locks, retry, options, clock),
        }
    }

    /// See [`EventAppender::append`]
    pub async fn append(
        &self,
        key: &BrookKey,
        events: &[EventData],
        expected_version: Option<BrookPosition>,
    ) -> Result<BrookPosition> {
        self.appender.append(key, events, expected_version).await
    }

    /// Authoritative head, recovering a crashed batch if one is found
    pub async fn head(&self, key: &BrookKey) -> Result<BrookPosition> {
        self.recovery.get_or_recover(key).await
    }

    /// Head according to the committed cursor, without recovery
    pub async fn committed_head(&self, key: &BrookKey) -> Result<BrookPosition> {
        self.recovery.committed_position(key).await
    }

    pub fn read(
        &self,
        key: &BrookKey,
        from_exclusive: BrookPosition,
        to_inclusive: BrookPosition,
    ) -> impl Stream<Item = Result<BrookEvent>> + Send + 'static {
        self.reader.read(key, from_exclusive, to_inclusive)
    }

    pub fn read_committed(
        &self,
        key: &BrookKey,
        from_exclusive: BrookPosition,
    ) -> impl Stream<Item = Result<BrookEvent>> + Send + 'static {
        self.reader.read_committed(key, from_exclusive)
    }

    pub fn reader(&self) -> &EventReader<R, P> {
        &self.reader
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

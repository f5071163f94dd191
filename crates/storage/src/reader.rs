// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event reader: paged, forward-only streams over a brook

use crate::error::{BrookError, Result};
use crate::recovery::committed_head;
use brook_adapters::{BrookRepository, RetryPolicy};
use brook_core::{BrookEvent, BrookKey, BrookPosition, StorageOptions};
use futures::{Stream, StreamExt};

/// Reads events from brooks without taking locks
#[derive(Clone)]
pub struct EventReader<R, P> {
    repository: R,
    retry: P,
    page_size: usize,
}

impl<R, P> EventReader<R, P>
where
    R: BrookRepository,
    P: RetryPolicy,
{
    pub fn new(repository: R, retry: P, options: &StorageOptions) -> Self {
        Self {
            repository,
            retry,
            page_size: options.query_batch_size.max(1),
        }
    }

    /// Events in `(from_exclusive, to_inclusive]`, ascending.
    ///
    /// Pages are fetched lazily as the stream is polled and at most one
    /// page is held at a time. The stream ends after the first storage
    /// error. Events appended while reading may or may not be seen.
    pub fn read(
        &self,
        key: &BrookKey,
        from_exclusive: BrookPosition,
        to_inclusive: BrookPosition,
    ) -> impl Stream<Item = Result<BrookEvent>> + Send + 'static {
        let repository = self.repository.clone();
        let retry = self.retry.clone();
        let page_size = self.page_size;
        let key = key.clone();

        async_stream::try_stream! {
            let mut cursor = from_exclusive;
            while cursor < to_inclusive {
                let page = retry
                    .execute(|| repository.read_events(&key, cursor, to_inclusive, page_size))
                    .await
                    .map_err(BrookError::storage(&key))?;
                let fetched = page.len();
                tracing::trace!(brook = %key, after = %cursor, fetched, "read page");

                for event in page {
                    cursor = event.position;
                    yield event;
                }
                if fetched < page_size {
                    break;
                }
            }
        }
    }

    /// Events after `from_exclusive` up to the committed head at call time.
    ///
    /// Never observes events of a batch that has not committed yet.
    pub fn read_committed(
        &self,
        key: &BrookKey,
        from_exclusive: BrookPosition,
    ) -> impl Stream<Item = Result<BrookEvent>> + Send + 'static {
        let reader = self.clone();
        let key = key.clone();

        async_stream::try_stream! {
            let head = committed_head(&reader.repository, &reader.retry, &key).await?;
            let events = reader.read(&key, from_exclusive, head);
            futures::pin_mut!(events);
            while let Some(event) = events.next().await {
                yield event?;
            }
        }
    }
}

#[cfg(test)]
#[path = "reader_tests.rs"]
mod tests;

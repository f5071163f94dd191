// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot cache: versioned state rebuilt from retained ancestors
//!
//! Activating `(stream, version)` either hydrates a stored envelope written
//! by the same reducers, or rebuilds: take the state at the nearest retained
//! base version (activating it recursively), replay the events between base
//! and version, and hand the result to the persister.

use crate::error::{Result, SnapshotError};
use crate::persister::{SnapshotPersister, SpawnedPersister};
use crate::reducer::Reducer;
use crate::registry::{KeyedRegistry, SlotState};
use brook_adapters::{BrookRepository, RetryPolicy, SnapshotRepository};
use brook_core::{
    BrookPosition, RetentionOptions, SnapshotAddress, SnapshotEnvelope, SnapshotKey,
    SnapshotStreamKey, JSON_CONTENT_TYPE,
};
use brook_storage::EventReader;
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use std::sync::Arc;
use tracing::Instrument;

/// Where a snapshot entry is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Unactivated,
    Resolving,
    Hydrated,
}

impl From<SlotState> for EntryState {
    fn from(state: SlotState) -> Self {
        match state {
            SlotState::Vacant => EntryState::Unactivated,
            SlotState::Initializing => EntryState::Resolving,
            SlotState::Ready => EntryState::Hydrated,
        }
    }
}

struct CacheInner<D: Reducer, R, P, S, Q> {
    reducer: D,
    reader: EventReader<R, P>,
    snapshots: S,
    persister: Q,
    retention: RetentionOptions,
    entries: KeyedRegistry<SnapshotKey, D::State>,
}

/// Process-wide cache of hydrated snapshots for one reducer.
///
/// Entries are keyed by the full [`SnapshotKey`], reducer hash included, so
/// concurrent activations of one key share a single resolution. Clones
/// share entries.
pub struct SnapshotCache<D: Reducer, R, P, S, Q = SpawnedPersister<S>> {
    inner: Arc<CacheInner<D, R, P, S, Q>>,
}

impl<D: Reducer, R, P, S, Q> Clone for SnapshotCache<D, R, P, S, Q> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D, R, P, S> SnapshotCache<D, R, P, S, SpawnedPersister<S>>
where
    D: Reducer,
    R: BrookRepository,
    P: RetryPolicy,
    S: SnapshotRepository,
{
    pub fn new(
        reducer: D,
        reader: EventReader<R, P>,
        snapshots: S,
        retention: RetentionOptions,
    ) -> Self {
        let persister = SpawnedPersister::new(snapshots.clone());
        Self::with_persister(reducer, reader, snapshots, persister, retention)
    }
}

impl<D, R, P, S, Q> SnapshotCache<D, R, P, S, Q>
where
    D: Reducer,
    R: BrookRepository,
    P: RetryPolicy,
    S: SnapshotRepository,
    Q: SnapshotPersister,
{
    pub fn with_persister(
        reducer: D,
        reader: EventReader<R, P>,
        snapshots: S,
        persister: Q,
        retention: RetentionOptions,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                reducer,
                reader,
                snapshots,
                persister,
                retention,
                entries: KeyedRegistry::new(),
            }),
        }
    }

    pub fn reducer(&self) -> &D {
        &self.inner.reducer
    }

    /// Key of `(stream, version)` under the current reducers
    pub fn snapshot_key(&self, stream: &SnapshotStreamKey, version: i64) -> Result<SnapshotKey> {
        if version < 0 {
            return Err(SnapshotError::InvalidVersion {
                stream: stream.clone(),
                version,
            });
        }
        Ok(SnapshotKey::new(
            stream.clone(),
            version,
            self.inner.reducer.reducer_hash(),
        )?)
    }

    /// State of `stream` after `version` events, hydrating it if needed
    pub async fn activate(&self, stream: &SnapshotStreamKey, version: i64) -> Result<D::State> {
        let key = self.snapshot_key(stream, version)?;
        let span = tracing::info_span!("snapshot.activate", snapshot = %key);
        self.activate_key(key).instrument(span).await
    }

    /// State of an already hydrated entry
    pub fn state(&self, stream: &SnapshotStreamKey, version: i64) -> Result<D::State> {
        let key = self.snapshot_key(stream, version)?;
        self.inner
            .entries
            .get(&key)
            .ok_or_else(|| SnapshotError::NotActivated {
                key: key.to_string(),
            })
    }

    pub fn entry_state(&self, stream: &SnapshotStreamKey, version: i64) -> Result<EntryState> {
        let key = self.snapshot_key(stream, version)?;
        Ok(self.inner.entries.state(&key).into())
    }

    /// Forget a hydrated entry; the stored envelope is untouched
    pub fn evict(&self, stream: &SnapshotStreamKey, version: i64) -> Result<bool> {
        let key = self.snapshot_key(stream, version)?;
        Ok(self.inner.entries.remove(&key))
    }

    fn activate_key(&self, key: SnapshotKey) -> BoxFuture<'_, Result<D::State>> {
        async move {
            self.inner
                .entries
                .get_or_try_init(&key, || self.resolve(&key))
                .await
        }
        .boxed()
    }

    async fn resolve(&self, key: &SnapshotKey) -> Result<D::State> {
        if key.version == 0 {
            return Ok(self.inner.reducer.initial_state());
        }
        let address = key.address();
        if let Some(state) = self.load(key, &address).await? {
            return Ok(state);
        }
        let state = self.rebuild(key).await?;
        self.persist(key, &address, &state)?;
        Ok(state)
    }

    /// Stored state for `key`, if an envelope from the same reducers exists
    async fn load(&self, key: &SnapshotKey, address: &SnapshotAddress) -> Result<Option<D::State>> {
        let envelope = self
            .inner
            .snapshots
            .read_envelope(address)
            .await
            .map_err(|source| SnapshotError::Store {
                address: address.clone(),
                source,
            })?;
        let Some(envelope) = envelope else {
            tracing::debug!(version = key.version, "no stored snapshot");
            return Ok(None);
        };
        if envelope.reducer_hash != key.reducer_hash {
            tracing::info!(
                version = key.version,
                stored_hash = %envelope.reducer_hash,
                "stored snapshot was built by other reducers"
            );
            return Ok(None);
        }
        match serde_json::from_slice(&envelope.data) {
            Ok(state) => {
                tracing::debug!(version = key.version, "hydrated from stored snapshot");
                Ok(Some(state))
            }
            Err(e) => {
                tracing::warn!(version = key.version, error = %e, "stored snapshot is unreadable");
                Ok(None)
            }
        }
    }

    async fn rebuild(&self, key: &SnapshotKey) -> Result<D::State> {
        let stream = &key.stream;
        let base = self
            .inner
            .retention
            .base_version_for(stream.snapshot_type(), key.version);

        let mut state = if base > 0 {
            tracing::debug!(version = key.version, base, "rebuilding from retained base");
            let base_key = SnapshotKey {
                version: base,
                ..key.clone()
            };
            self.activate_key(base_key).await?
        } else {
            self.inner.reducer.initial_state()
        };

        let events = self.inner.reader.read(
            stream.brook(),
            BrookPosition::new(base),
            BrookPosition::new(key.version),
        );
        futures::pin_mut!(events);
        let mut replayed = 0i64;
        while let Some(event) = events.next().await {
            let event = event?;
            state = self.inner.reducer.reduce(state, &event)?;
            replayed += 1;
        }

        let expected = key.version - base;
        if replayed < expected {
            return Err(SnapshotError::IncompleteReplay {
                stream: stream.clone(),
                base,
                version: key.version,
                replayed,
                expected,
            });
        }
        tracing::info!(version = key.version, base, replayed, "snapshot rebuilt");
        Ok(state)
    }

    fn persist(&self, key: &SnapshotKey, address: &SnapshotAddress, state: &D::State) -> Result<()> {
        let data = serde_json::to_vec(state).map_err(|source| SnapshotError::Codec {
            address: address.clone(),
            source,
        })?;
        self.inner.persister.persist(
            key,
            SnapshotEnvelope {
                data,
                content_type: JSON_CONTENT_TYPE.to_string(),
                reducer_hash: key.reducer_hash.clone(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background persistence of rebuilt snapshots

use brook_adapters::SnapshotRepository;
use brook_core::{SnapshotEnvelope, SnapshotKey};
use tracing::Instrument;

/// Accepts rebuilt envelopes for storage without making the caller wait
pub trait SnapshotPersister: Clone + Send + Sync + 'static {
    /// Store `envelope` at the address of `key`, replacing any envelope
    /// already there. Failures are reported through logs only.
    fn persist(&self, key: &SnapshotKey, envelope: SnapshotEnvelope);
}

/// Persists each envelope on its own spawned task.
///
/// Tasks are never joined; dropping or cancelling the caller does not stop
/// a write already handed over. Must be used within a tokio runtime.
#[derive(Clone)]
pub struct SpawnedPersister<S> {
    snapshots: S,
}

impl<S: SnapshotRepository> SpawnedPersister<S> {
    pub fn new(snapshots: S) -> Self {
        Self { snapshots }
    }
}

impl<S: SnapshotRepository> SnapshotPersister for SpawnedPersister<S> {
    fn persist(&self, key: &SnapshotKey, envelope: SnapshotEnvelope) {
        let snapshots = self.snapshots.clone();
        let address = key.address();
        let span = tracing::debug_span!("snapshot.persist", snapshot = %key);
        tokio::spawn(
            async move {
                let start = std::time::Instant::now();
                match snapshots.write_envelope(&address, &envelope).await {
                    Ok(()) => tracing::debug!(
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        bytes = envelope.data.len(),
                        "snapshot persisted"
                    ),
                    Err(e) => tracing::warn!(
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        error = %e,
                        "snapshot persist failed, will rebuild on next activation"
                    ),
                }
            }
            .instrument(span),
        );
    }
}

#[cfg(test)]
#[path = "persister_tests.rs"]
mod tests;

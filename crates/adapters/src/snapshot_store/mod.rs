// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document-store port for snapshot envelopes

mod memory;

pub use memory::MemorySnapshotRepository;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeSnapshotRepository;

use crate::repository::RepositoryError;
use async_trait::async_trait;
use brook_core::{SnapshotAddress, SnapshotEnvelope};

/// Envelope storage, one document per snapshot address
#[async_trait]
pub trait SnapshotRepository: Clone + Send + Sync + 'static {
    async fn read_envelope(
        &self,
        address: &SnapshotAddress,
    ) -> Result<Option<SnapshotEnvelope>, RepositoryError>;

    /// Create or overwrite the envelope at `address`
    async fn write_envelope(
        &self,
        address: &SnapshotAddress,
        envelope: &SnapshotEnvelope,
    ) -> Result<(), RepositoryError>;
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process envelope storage

use super::SnapshotRepository;
use crate::repository::RepositoryError;
use async_trait::async_trait;
use brook_core::{SnapshotAddress, SnapshotEnvelope};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Snapshot store keeping envelopes in memory; clones share envelopes
#[derive(Clone, Debug, Default)]
pub struct MemorySnapshotRepository {
    envelopes: Arc<Mutex<HashMap<SnapshotAddress, SnapshotEnvelope>>>,
}

impl MemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.envelopes.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SnapshotRepository for MemorySnapshotRepository {
    async fn read_envelope(
        &self,
        address: &SnapshotAddress,
    ) -> Result<Option<SnapshotEnvelope>, RepositoryError> {
        Ok(self
            .envelopes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(address)
            .cloned())
    }

    async fn write_envelope(
        &self,
        address: &SnapshotAddress,
        envelope: &SnapshotEnvelope,
    ) -> Result<(), RepositoryError> {
        self.envelopes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(address.clone(), envelope.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake snapshot store recording writes
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{MemorySnapshotRepository, SnapshotRepository};
use crate::repository::RepositoryError;
use async_trait::async_trait;
use brook_core::{SnapshotAddress, SnapshotEnvelope};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Fake snapshot store for testing.
///
/// Records every write attempt, can be told to fail writes, and lets tests
/// wait for background writes to arrive.
#[derive(Clone, Default)]
pub struct FakeSnapshotRepository {
    store: MemorySnapshotRepository,
    writes: Arc<Mutex<Vec<(SnapshotAddress, SnapshotEnvelope)>>>,
    reads: Arc<Mutex<Vec<SnapshotAddress>>>,
    fail_writes: Arc<AtomicBool>,
    written: Arc<Notify>,
}

impl FakeSnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write attempt, including failed ones
    pub fn writes(&self) -> Vec<(SnapshotAddress, SnapshotEnvelope)> {
        self.writes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn reads(&self) -> Vec<SnapshotAddress> {
        self.reads.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Wait until at least `count` write attempts were recorded
    pub async fn wait_for_writes(&self, count: usize) {
        loop {
            let notified = self.written.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.writes.lock().unwrap_or_else(|e| e.into_inner()).len() >= count {
                return;
            }
            notified.await;
        }
    }

    /// Store an envelope directly, bypassing the write log
    pub async fn seed(&self, address: &SnapshotAddress, envelope: &SnapshotEnvelope) {
        let _ = self.store.write_envelope(address, envelope).await;
    }
}

#[async_trait]
impl SnapshotRepository for FakeSnapshotRepository {
    async fn read_envelope(
        &self,
        address: &SnapshotAddress,
    ) -> Result<Option<SnapshotEnvelope>, RepositoryError> {
        self.reads
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(address.clone());
        self.store.read_envelope(address).await
    }

    async fn write_envelope(
        &self,
        address: &SnapshotAddress,
        envelope: &SnapshotEnvelope,
    ) -> Result<(), RepositoryError> {
        let result = if self.fail_writes.load(Ordering::SeqCst) {
            Err(RepositoryError::Storage("injected envelope write failure".into()))
        } else {
            self.store.write_envelope(address, envelope).await
        };
        self.writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((address.clone(), envelope.clone()));
        self.written.notify_waiters();
        result
    }
}

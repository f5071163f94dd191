// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Ports to the external collaborators of the brook engine
//!
//! - **Repository** - documents for events and cursors
//! - **Snapshot store** - envelope documents
//! - **Lock** - per-key exclusive leases with renewal
//! - **Retry** - bounded retry of transient storage failures

pub mod lock;
pub mod repository;
pub mod retry;
pub mod snapshot_store;
pub mod traced;

pub use lock::{DistributedLock, HolderId, Lease, LockError, MemoryLease, MemoryLockProvider};
pub use repository::{BrookRepository, MemoryRepository, RepositoryError};
pub use retry::{BackoffRetry, NoRetry, RetryPolicy};
pub use snapshot_store::{MemorySnapshotRepository, SnapshotRepository};
pub use traced::TracedRepository;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use repository::{FakeRepository, RepositoryCall};
#[cfg(any(test, feature = "test-support"))]
pub use snapshot_store::FakeSnapshotRepository;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! brook-snapshot: versioned snapshots folded from brook events
//!
//! - **Reducers** - fold events into state, fingerprinted by a reducer hash
//! - **Registry** - one shared, lazily initialized value per key
//! - **Cache** - hydrate or rebuild snapshots from retained ancestors
//! - **Persister** - write rebuilt envelopes in the background

pub mod cache;
pub mod error;
pub mod persister;
pub mod reducer;
pub mod registry;

pub use cache::{EntryState, SnapshotCache};
pub use error::{Result, SnapshotError};
pub use persister::{SnapshotPersister, SpawnedPersister};
pub use reducer::{Reducer, ReducerSet};
pub use registry::{KeyedRegistry, SlotState};

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! brook-core: data model shared by the brook storage engine
//!
//! This crate provides:
//! - Brook identity, positions, events and cursor documents
//! - Snapshot keys, envelopes and retention rules
//! - Storage and snapshot configuration
//! - A clock abstraction for lease timing

pub mod clock;
pub mod config;
pub mod cursor;
pub mod event;
pub mod key;
pub mod retention;
pub mod snapshot;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{BrookConfig, ConfigError, StorageOptions, MAX_RECOVERY_LOCK_WAIT};
pub use cursor::{CommittedCursor, PendingCursor};
pub use event::{estimated_batch_size, BrookEvent, EventData, JSON_CONTENT_TYPE};
pub use key::{BrookKey, BrookPosition, KeyError};
pub use retention::{base_version, RetentionOptions};
pub use snapshot::{SnapshotAddress, SnapshotEnvelope, SnapshotKey, SnapshotStreamKey};

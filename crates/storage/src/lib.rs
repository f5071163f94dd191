// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! brook-storage: crash-consistent append, recovery and reads over brooks
//!
//! Writes go through a two-phase protocol: a pending cursor is written
//! before any event and the committed cursor after the last one. Anything
//! in between is resolved by cursor recovery on the next access.

pub mod appender;
pub mod error;
pub mod reader;
pub mod recovery;
pub mod store;

pub use appender::{plan_chunks, EventAppender, RENEW_EVERY_CHUNKS};
pub use error::{BrookError, ErrorKind, Result};
pub use reader::EventReader;
pub use recovery::CursorRecovery;
pub use store::BrookStore;

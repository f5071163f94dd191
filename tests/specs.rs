//! Behavioral specifications for the brook storage engine.
//!
//! These tests are black-box: they drive the public API of the workspace
//! crates against the in-memory ports and verify heads, stored events and
//! snapshot state.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// brook/
#[path = "specs/brook/append.rs"]
mod brook_append;
#[path = "specs/brook/recovery.rs"]
mod brook_recovery;
#[path = "specs/brook/config.rs"]
mod brook_config;

// snapshot/
#[path = "specs/snapshot/rebuild.rs"]
mod snapshot_rebuild;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Brook identity and position types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator used when a key is flattened into a single token
pub const KEY_SEPARATOR: char = '|';

/// Errors from constructing or parsing keys
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    #[error("{field} must not contain '|': {value}")]
    ContainsSeparator { field: &'static str, value: String },
    #[error("malformed key token: {0}")]
    Malformed(String),
}

pub(crate) fn check_component(field: &'static str, value: &str) -> Result<(), KeyError> {
    if value.is_empty() {
        return Err(KeyError::Empty { field });
    }
    if value.contains(KEY_SEPARATOR) {
        return Err(KeyError::ContainsSeparator {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Identity of one append-only stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BrookKey {
    brook_name: String,
    entity_id: String,
}

impl BrookKey {
    pub fn new(brook_name: impl Into<String>, entity_id: impl Into<String>) -> Result<Self, KeyError> {
        let brook_name = brook_name.into();
        let entity_id = entity_id.into();
        check_component("brook name", &brook_name)?;
        check_component("entity id", &entity_id)?;
        Ok(Self {
            brook_name,
            entity_id,
        })
    }

    pub fn brook_name(&self) -> &str {
        &self.brook_name
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Key of the exclusive lease serializing appends to this brook
    pub fn write_lock_key(&self) -> String {
        format!("{}:write", self)
    }

    /// Key of the lease guarding recovery of an orphaned batch.
    /// Distinct from the write lock so recovery never waits on a writer.
    pub fn recovery_lock_key(&self) -> String {
        format!("{}:recovery", self)
    }
}

impl fmt::Display for BrookKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.brook_name, KEY_SEPARATOR, self.entity_id)
    }
}

impl FromStr for BrookKey {
    type Err = KeyError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let (brook_name, entity_id) = token
            .split_once(KEY_SEPARATOR)
            .ok_or_else(|| KeyError::Malformed(token.to_string()))?;
        Self::new(brook_name, entity_id)
    }
}

/// Position within a brook
///
/// `-1` marks an empty stream; the first event sits at position 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BrookPosition(i64);

impl BrookPosition {
    /// Head of a brook with no events
    pub const EMPTY: BrookPosition = BrookPosition(-1);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 < 0
    }

    /// Number of events stored up to and including this position
    pub const fn event_count(self) -> i64 {
        if self.0 < 0 {
            0
        } else {
            self.0
        }
    }

    /// Position reached after appending `count` events on top of this head.
    ///
    /// Returns `None` on overflow.
    pub fn advance(self, count: usize) -> Option<BrookPosition> {
        let count = i64::try_from(count).ok()?;
        self.event_count().checked_add(count).map(BrookPosition)
    }

    /// First position written by an append on top of this head
    pub const fn first_after(self) -> BrookPosition {
        BrookPosition(self.event_count().saturating_add(1))
    }
}

impl Default for BrookPosition {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Display for BrookPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for BrookPosition {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;

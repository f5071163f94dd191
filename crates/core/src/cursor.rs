// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cursor documents tracking how far a brook has been durably written

use crate::key::BrookPosition;
use serde::{Deserialize, Serialize};

/// Head of a brook after its last fully committed batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CommittedCursor {
    pub position: BrookPosition,
}

/// Marker staged before a batch write and removed once it commits.
///
/// Its presence is the only signal that a batch is in flight or that its
/// writer crashed part way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PendingCursor {
    /// Head before the batch
    pub original_position: BrookPosition,
    /// Head the batch moves to once every event has landed
    pub position: BrookPosition,
}

impl PendingCursor {
    pub fn new(original_position: BrookPosition, position: BrookPosition) -> Self {
        Self {
            original_position,
            position,
        }
    }

    /// Positions the batch writes, in ascending order
    pub fn positions(&self) -> impl Iterator<Item = BrookPosition> {
        let first = self.original_position.first_after().value();
        (first..=self.position.value()).map(BrookPosition::new)
    }

    /// Number of events the batch writes
    pub fn span(&self) -> i64 {
        (self.position.value() - self.original_position.event_count()).max(0)
    }

    /// True when a committed head already covers this batch
    pub fn is_covered_by(&self, committed: Option<BrookPosition>) -> bool {
        committed.is_some_and(|head| head >= self.position)
    }
}

#[cfg(test)]
#[path = "cursor_tests.rs"]
mod tests;

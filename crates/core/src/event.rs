// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events as submitted for append and as stored in a brook

use crate::key::BrookPosition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed per-event allowance for document envelope fields when sizing batches
pub const EVENT_ENVELOPE_OVERHEAD: usize = 256;

/// Default content type for event payloads
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// An event submitted for append; the appender assigns its position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    pub id: String,
    /// Discriminant used to route the event to its reducer handler
    pub type_tag: String,
    pub content_type: String,
    pub payload: Vec<u8>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub time: DateTime<Utc>,
}

impl EventData {
    pub fn new(type_tag: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            type_tag: type_tag.into(),
            content_type: JSON_CONTENT_TYPE.to_string(),
            payload: payload.into(),
            metadata: BTreeMap::new(),
            time: Utc::now(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Approximate stored size of this event, used to bound request sizes
    pub fn estimated_size(&self) -> usize {
        let metadata: usize = self.metadata.iter().map(|(k, v)| k.len() + v.len()).sum();
        EVENT_ENVELOPE_OVERHEAD
            + self.id.len()
            + self.type_tag.len()
            + self.content_type.len()
            + self.payload.len()
            + metadata
    }
}

/// An event stored in a brook at a fixed position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrookEvent {
    pub position: BrookPosition,
    pub id: String,
    pub type_tag: String,
    pub content_type: String,
    pub payload: Vec<u8>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub time: DateTime<Utc>,
}

impl BrookEvent {
    pub fn from_data(position: BrookPosition, data: &EventData) -> Self {
        Self {
            position,
            id: data.id.clone(),
            type_tag: data.type_tag.clone(),
            content_type: data.content_type.clone(),
            payload: data.payload.clone(),
            metadata: data.metadata.clone(),
            time: data.time,
        }
    }
}

/// Total estimated size of a batch of events
pub fn estimated_batch_size(events: &[EventData]) -> usize {
    events.iter().map(EventData::estimated_size).sum()
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;

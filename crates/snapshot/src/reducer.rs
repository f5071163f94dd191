// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reducers: folding brook events into snapshot state

use crate::error::SnapshotError;
use brook_core::BrookEvent;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Folds events of one brook into the state of one snapshot type
pub trait Reducer: Send + Sync + 'static {
    type State: Clone + Serialize + DeserializeOwned + Send + Sync + 'static;

    fn snapshot_type(&self) -> &str;

    fn initial_state(&self) -> Self::State;

    /// Apply one event to `state`
    fn reduce(&self, state: Self::State, event: &BrookEvent) -> Result<Self::State, SnapshotError>;

    /// Fingerprint of the folding logic; envelopes written under another
    /// hash are rebuilt
    fn reducer_hash(&self) -> String;
}

type Handler<S> = Box<dyn Fn(S, &BrookEvent) -> Result<S, serde_json::Error> + Send + Sync>;

/// Reducer dispatching events to handlers by type tag.
///
/// Payloads are decoded from JSON into each handler's event type. Events
/// whose tag has no handler leave the state unchanged.
pub struct ReducerSet<S> {
    snapshot_type: String,
    revision: String,
    initial: S,
    handlers: BTreeMap<String, Handler<S>>,
}

impl<S> ReducerSet<S>
where
    S: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(snapshot_type: impl Into<String>, initial: S) -> Self {
        Self {
            snapshot_type: snapshot_type.into(),
            revision: "1".to_string(),
            initial,
            handlers: BTreeMap::new(),
        }
    }

    /// Label folded into the hash; bump it when a handler's logic changes
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = revision.into();
        self
    }

    /// Register `handler` for events tagged `type_tag`
    pub fn on<E, F>(mut self, type_tag: impl Into<String>, handler: F) -> Self
    where
        E: DeserializeOwned + 'static,
        F: Fn(S, E) -> S + Send + Sync + 'static,
    {
        let handler: Handler<S> = Box::new(move |state, event| {
            let decoded: E = serde_json::from_slice(&event.payload)?;
            Ok(handler(state, decoded))
        });
        self.handlers.insert(type_tag.into(), handler);
        self
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

impl<S> Reducer for ReducerSet<S>
where
    S: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    type State = S;

    fn snapshot_type(&self) -> &str {
        &self.snapshot_type
    }

    fn initial_state(&self) -> S {
        self.initial.clone()
    }

    fn reduce(&self, state: S, event: &BrookEvent) -> Result<S, SnapshotError> {
        let Some(handler) = self.handlers.get(&event.type_tag) else {
            tracing::trace!(type_tag = %event.type_tag, "no handler, event skipped");
            return Ok(state);
        };
        handler(state, event).map_err(|source| SnapshotError::Reduce {
            position: event.position.value(),
            type_tag: event.type_tag.clone(),
            source,
        })
    }

    fn reducer_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.snapshot_type.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.revision.as_bytes());
        // BTreeMap keys iterate sorted
        for tag in self.handlers.keys() {
            hasher.update(b"\n");
            hasher.update(tag.as_bytes());
        }
        hex_encode(&hasher.finalize()[..16])
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
#[path = "reducer_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keyed registry: at most one live instance per key

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::OnceCell;

/// Lifecycle of a registry slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Never requested, removed, or its initialization failed
    Vacant,
    /// Initialization in progress
    Initializing,
    Ready,
}

/// Map from key to a lazily initialized shared value.
///
/// Concurrent callers for one key await a single initialization. A failed
/// initialization leaves the key vacant so a later caller retries. Clones
/// share the same slots.
pub struct KeyedRegistry<K, V> {
    slots: Arc<Mutex<HashMap<K, Arc<OnceCell<V>>>>>,
}

impl<K, V> Clone for KeyedRegistry<K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<K, V> Default for KeyedRegistry<K, V> {
    fn default() -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K, V> KeyedRegistry<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<K, Arc<OnceCell<V>>>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Value for `key`, running `init` if no caller has produced it yet
    pub async fn get_or_try_init<F, Fut, E>(&self, key: &K, init: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = Arc::clone(self.slots().entry(key.clone()).or_default());
        match slot.get_or_try_init(init).await {
            Ok(value) => Ok(value.clone()),
            Err(e) => {
                let mut slots = self.slots();
                let stale = slots
                    .get(key)
                    .is_some_and(|current| Arc::ptr_eq(current, &slot) && !current.initialized());
                if stale {
                    slots.remove(key);
                }
                Err(e)
            }
        }
    }

    /// Value for `key` if it is initialized; never creates it
    pub fn get(&self, key: &K) -> Option<V> {
        self.slots().get(key).and_then(|slot| slot.get().cloned())
    }

    pub fn state(&self, key: &K) -> SlotState {
        match self.slots().get(key) {
            None => SlotState::Vacant,
            Some(slot) if slot.initialized() => SlotState::Ready,
            Some(_) => SlotState::Initializing,
        }
    }

    /// Drop the slot for `key`; callers already awaiting it are unaffected
    pub fn remove(&self, key: &K) -> bool {
        self.slots().remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.slots().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots().is_empty()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;

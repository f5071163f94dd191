// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use brook_core::{BrookKey, SnapshotStreamKey};

fn address(version: i64) -> SnapshotAddress {
    let brook = BrookKey::new("accounts", "a-1").unwrap();
    SnapshotStreamKey::new("balance", brook).unwrap().at(version)
}

fn envelope(hash: &str) -> SnapshotEnvelope {
    SnapshotEnvelope {
        data: b"1".to_vec(),
        content_type: "application/json".to_string(),
        reducer_hash: hash.to_string(),
    }
}

#[tokio::test]
async fn missing_envelope_reads_as_none() {
    let store = MemorySnapshotRepository::new();
    assert_eq!(store.read_envelope(&address(3)).await.unwrap(), None);
    assert!(store.is_empty());
}

#[tokio::test]
async fn write_replaces_envelope_at_address() {
    let store = MemorySnapshotRepository::new();

    store.write_envelope(&address(3), &envelope("old")).await.unwrap();
    store.write_envelope(&address(3), &envelope("new")).await.unwrap();
    store.write_envelope(&address(4), &envelope("new")).await.unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(
        store.read_envelope(&address(3)).await.unwrap(),
        Some(envelope("new"))
    );
}

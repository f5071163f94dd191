// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use brook_core::{BrookPosition, EventData};
use serde::Deserialize;

#[derive(Deserialize)]
struct Deposited {
    amount: i64,
}

#[derive(Deserialize)]
struct Withdrawn {
    amount: i64,
}

fn balance() -> ReducerSet<i64> {
    ReducerSet::new("balance", 0)
        .on("Deposited", |state, e: Deposited| state + e.amount)
        .on("Withdrawn", |state, e: Withdrawn| state - e.amount)
}

fn event(position: i64, type_tag: &str, payload: &str) -> BrookEvent {
    BrookEvent::from_data(BrookPosition::new(position), &EventData::new(type_tag, payload))
}

#[test]
fn dispatches_by_type_tag() {
    let reducer = balance();
    let state = reducer
        .reduce(reducer.initial_state(), &event(1, "Deposited", r#"{"amount":10}"#))
        .unwrap();
    let state = reducer
        .reduce(state, &event(2, "Withdrawn", r#"{"amount":3}"#))
        .unwrap();
    assert_eq!(state, 7);
}

#[test]
fn unknown_tags_are_skipped() {
    let reducer = balance();
    let state = reducer
        .reduce(5, &event(1, "Renamed", r#"{"name":"x"}"#))
        .unwrap();
    assert_eq!(state, 5);
}

#[test]
fn undecodable_payload_is_a_reduce_error() {
    let reducer = balance();
    let err = reducer
        .reduce(0, &event(4, "Deposited", "not json"))
        .unwrap_err();
    match err {
        SnapshotError::Reduce {
            position, type_tag, ..
        } => {
            assert_eq!(position, 4);
            assert_eq!(type_tag, "Deposited");
        }
        other => panic!("expected reduce error, got {other:?}"),
    }
}

#[test]
fn hash_is_stable_and_order_independent() {
    let forward = ReducerSet::new("balance", 0)
        .on("A", |s: i64, _: serde_json::Value| s)
        .on("B", |s: i64, _: serde_json::Value| s);
    let backward = ReducerSet::new("balance", 0)
        .on("B", |s: i64, _: serde_json::Value| s)
        .on("A", |s: i64, _: serde_json::Value| s);

    assert_eq!(forward.reducer_hash(), backward.reducer_hash());
    assert_eq!(forward.reducer_hash().len(), 32);
    assert!(!forward.reducer_hash().contains('|'));
}

#[test]
fn hash_tracks_handlers_type_and_revision() {
    let base = balance().reducer_hash();
    let fewer = ReducerSet::new("balance", 0)
        .on("Deposited", |state, e: Deposited| state + e.amount)
        .reducer_hash();
    let renamed = ReducerSet::new("ledger", 0)
        .on("Deposited", |state, e: Deposited| state + e.amount)
        .on("Withdrawn", |state, e: Withdrawn| state - e.amount)
        .reducer_hash();
    let revised = balance().with_revision("2").reducer_hash();

    assert_ne!(base, fewer);
    assert_ne!(base, renamed);
    assert_ne!(base, revised);
}

#[test]
fn tags_are_listed_sorted() {
    let reducer = balance();
    let tags: Vec<&str> = reducer.tags().collect();
    assert_eq!(tags, vec!["Deposited", "Withdrawn"]);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn new_event_defaults_to_json() {
    let event = EventData::new("Deposited", r#"{"amount":5}"#);
    assert_eq!(event.content_type, JSON_CONTENT_TYPE);
    assert!(event.metadata.is_empty());
    assert!(!event.id.is_empty());
}

#[test]
fn events_get_distinct_ids() {
    let a = EventData::new("Deposited", "{}");
    let b = EventData::new("Deposited", "{}");
    assert_ne!(a.id, b.id);
}

#[test]
fn estimated_size_counts_every_field() {
    let plain = EventData::new("T", vec![0u8; 10]);
    let tagged = plain.clone().with_metadata("trace", "abc");
    let retyped = plain.clone().with_content_type("application/octet-stream");

    assert_eq!(
        plain.estimated_size(),
        EVENT_ENVELOPE_OVERHEAD + plain.id.len() + 1 + JSON_CONTENT_TYPE.len() + 10
    );
    assert_eq!(tagged.estimated_size(), plain.estimated_size() + 8);
    assert!(retyped.estimated_size() > plain.estimated_size());
}

#[test]
fn batch_size_is_the_sum_of_event_sizes() {
    let events = vec![EventData::new("A", "x"), EventData::new("B", "yy")];
    assert_eq!(
        estimated_batch_size(&events),
        events[0].estimated_size() + events[1].estimated_size()
    );
    assert_eq!(estimated_batch_size(&[]), 0);
}

#[test]
fn stored_event_carries_submitted_fields() {
    let data = EventData::new("Deposited", "{}").with_metadata("source", "api");
    let stored = BrookEvent::from_data(BrookPosition::new(7), &data);

    assert_eq!(stored.position, BrookPosition::new(7));
    assert_eq!(stored.id, data.id);
    assert_eq!(stored.type_tag, "Deposited");
    assert_eq!(stored.payload, data.payload);
    assert_eq!(stored.metadata.get("source").map(String::as_str), Some("api"));
    assert_eq!(stored.time, data.time);
}

#[test]
fn stored_event_round_trips_through_json() {
    let stored = BrookEvent::from_data(BrookPosition::new(1), &EventData::new("A", "{}"));
    let json = serde_json::to_string(&stored).unwrap();
    let parsed: BrookEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, stored);
}

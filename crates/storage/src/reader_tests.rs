// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use brook_adapters::{FakeRepository, NoRetry, RepositoryCall};
use brook_core::EventData;
use futures::TryStreamExt;

fn key() -> BrookKey {
    BrookKey::new("ledger", "main").unwrap()
}

fn seeded(count: i64) -> FakeRepository {
    let repo = FakeRepository::new();
    for position in 1..=count {
        repo.store().insert_event(
            &key(),
            BrookPosition::new(position),
            &EventData::new("Posted", format!("{{\"seq\":{position}}}")),
        );
    }
    repo
}

fn reader(repo: &FakeRepository, page_size: usize) -> EventReader<FakeRepository, NoRetry> {
    EventReader::new(
        repo.clone(),
        NoRetry,
        &StorageOptions::default().with_query_batch_size(page_size),
    )
}

fn positions(events: &[BrookEvent]) -> Vec<i64> {
    events.iter().map(|e| e.position.value()).collect()
}

fn page_reads(repo: &FakeRepository) -> Vec<(i64, i64, usize)> {
    repo.calls()
        .into_iter()
        .filter_map(|call| match call {
            RepositoryCall::ReadEvents { from, to, limit } => Some((from, to, limit)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn reads_whole_brook_in_pages() {
    let repo = seeded(5);

    let events: Vec<BrookEvent> = reader(&repo, 2)
        .read(&key(), BrookPosition::EMPTY, BrookPosition::new(5))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(positions(&events), vec![1, 2, 3, 4, 5]);
    assert_eq!(page_reads(&repo), vec![(-1, 5, 2), (2, 5, 2), (4, 5, 2)]);
}

#[tokio::test]
async fn range_ending_on_page_boundary_needs_no_extra_page() {
    let repo = seeded(4);

    let events: Vec<BrookEvent> = reader(&repo, 2)
        .read(&key(), BrookPosition::EMPTY, BrookPosition::new(4))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(events.len(), 4);
    assert_eq!(page_reads(&repo).len(), 2);
}

#[tokio::test]
async fn reads_a_bounded_range() {
    let repo = seeded(10);

    let events: Vec<BrookEvent> = reader(&repo, 100)
        .read(&key(), BrookPosition::new(3), BrookPosition::new(6))
        .try_collect()
        .await
        .unwrap();

    assert_eq!(positions(&events), vec![4, 5, 6]);
    assert_eq!(events[0].type_tag, "Posted");
    assert_eq!(events[0].payload, b"{\"seq\":4}".to_vec());
}

#[tokio::test]
async fn empty_range_yields_nothing_without_io() {
    let repo = seeded(3);

    let events: Vec<BrookEvent> = reader(&repo, 10)
        .read(&key(), BrookPosition::new(3), BrookPosition::new(3))
        .try_collect()
        .await
        .unwrap();

    assert!(events.is_empty());
    assert!(repo.calls().is_empty());
}

#[tokio::test]
async fn stream_is_lazy() {
    let repo = seeded(10);
    let stream = reader(&repo, 3).read(&key(), BrookPosition::EMPTY, BrookPosition::new(10));
    assert!(repo.calls().is_empty());

    let first: Vec<BrookEvent> = stream.take(2).try_collect().await.unwrap();

    assert_eq!(positions(&first), vec![1, 2]);
    assert_eq!(page_reads(&repo).len(), 1);
}

#[tokio::test]
async fn unknown_brook_reads_as_empty() {
    let repo = FakeRepository::new();

    let events: Vec<BrookEvent> = reader(&repo, 10)
        .read(&key(), BrookPosition::EMPTY, BrookPosition::new(50))
        .try_collect()
        .await
        .unwrap();

    assert!(events.is_empty());
}

#[tokio::test]
async fn read_committed_stops_at_committed_cursor() {
    let repo = seeded(5);
    repo.store()
        .write_cursor(&key(), BrookPosition::new(3))
        .await
        .unwrap();

    let events: Vec<BrookEvent> = reader(&repo, 10)
        .read_committed(&key(), BrookPosition::EMPTY)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(positions(&events), vec![1, 2, 3]);
}

#[tokio::test]
async fn read_committed_on_uncommitted_brook_reads_nothing() {
    let repo = seeded(2);

    let events: Vec<BrookEvent> = reader(&repo, 10)
        .read_committed(&key(), BrookPosition::EMPTY)
        .try_collect()
        .await
        .unwrap();

    assert!(events.is_empty());
    assert_eq!(repo.calls(), vec![RepositoryCall::ReadCursor]);
}

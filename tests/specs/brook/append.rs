//! Append specs
//!
//! Verify heads, ordering and optimistic concurrency of appends.

use crate::prelude::*;
use proptest::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn append_to_empty_brook_then_read_back() {
    let world = World::new();

    let head = world
        .store
        .append(&world.key(), &deposits(1, 3), None)
        .await
        .unwrap();

    assert_eq!(head, BrookPosition::new(3));
    assert_eq!(world.positions(0, 3).await, vec![1, 2, 3]);
}

#[tokio::test]
async fn expected_version_zero_only_matches_an_empty_brook() {
    let world = World::new();
    let zero = Some(BrookPosition::new(0));

    let head = world
        .store
        .append(&world.key(), &deposits(1, 5), zero)
        .await
        .unwrap();
    assert_eq!(head, BrookPosition::new(5));

    let err = world
        .store
        .append(&world.key(), &deposits(6, 1), zero)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(world.head().await, 5);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn head_is_the_sum_of_appends_and_reads_are_contiguous(
        sizes in proptest::collection::vec(1usize..15, 1..8),
        max_events in 1usize..6,
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let (heads, positions) = runtime.block_on(async {
            let world = World::with_options(
                StorageOptions::default().with_max_events_per_batch(max_events),
            );
            let mut heads = Vec::new();
            let mut next = 1;
            for size in &sizes {
                let head = world
                    .store
                    .append(&world.key(), &deposits(next, *size), None)
                    .await
                    .unwrap();
                next += *size as i64;
                heads.push(head.value());
            }
            let total = next - 1;
            (heads, world.positions(0, total).await)
        });

        let mut expected_head = 0;
        for (size, head) in sizes.iter().zip(&heads) {
            expected_head += *size as i64;
            prop_assert_eq!(*head, expected_head);
        }
        prop_assert_eq!(positions, (1..=expected_head).collect::<Vec<_>>());
    }
}

#[tokio::test]
async fn stale_expected_version_never_moves_the_head() {
    let world = World::new();
    world
        .store
        .append(&world.key(), &deposits(1, 4), None)
        .await
        .unwrap();

    for stale in [-1, 0, 2, 3, 5, 9] {
        let err = world
            .store
            .append(&world.key(), &deposits(5, 2), Some(BrookPosition::new(stale)))
            .await
            .unwrap_err();
        assert!(matches!(err, BrookError::Conflict { .. }), "{stale}: {err}");
        assert_eq!(world.head().await, 4);
    }
    assert_eq!(world.repo.store().stored_positions(&world.key()).len(), 4);
}

#[tokio::test]
async fn concurrent_writers_are_serialized() {
    let world = World::new();
    let key = world.key();

    let writers = (0..8).map(|n| {
        let store = world.store.clone();
        let key = key.clone();
        tokio::spawn(async move { store.append(&key, &deposits(n, 3), None).await })
    });
    for writer in futures::future::join_all(writers).await {
        writer.unwrap().unwrap();
    }

    assert_eq!(world.head().await, 24);
    assert_eq!(world.positions(-1, 24).await, (1..=24).collect::<Vec<_>>());
    assert!(!world.locks.is_held(&key.write_lock_key()));
}

#[tokio::test]
async fn read_committed_hides_an_uncommitted_batch() {
    let world = World::new();
    world.crash_mid_batch(3, 6, [4, 5]).await;

    let events: Vec<BrookEvent> = world
        .store
        .read_committed(&world.key(), BrookPosition::EMPTY)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(events.len(), 3);
    // The relaxed read sees whatever is stored
    assert_eq!(world.positions(-1, 6).await, vec![1, 2, 3, 4, 5]);
}

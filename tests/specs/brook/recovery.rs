//! Recovery specs
//!
//! Verify crashed and failed batches never leave a partial write visible.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn incomplete_batch_is_undone() {
    let world = World::new();
    world.crash_mid_batch(5, 8, [6, 7]).await;

    assert_eq!(world.head().await, 5);
    assert_eq!(
        world.repo.store().stored_positions(&world.key()),
        vec![1, 2, 3, 4, 5]
    );
}

#[tokio::test]
async fn recovery_is_idempotent() {
    let world = World::new();
    world.crash_mid_batch(5, 8, [6, 7]).await;

    let first = world.head().await;
    let second = world.head().await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn landed_batch_is_committed() {
    let world = World::new();
    world.crash_mid_batch(5, 8, [6, 7, 8]).await;

    assert_eq!(world.head().await, 8);
    assert_eq!(world.store.committed_head(&world.key()).await.unwrap(), BrookPosition::new(8));
}

#[tokio::test]
async fn next_append_continues_after_recovery() {
    let world = World::new();
    world.crash_mid_batch(5, 8, [6, 7]).await;

    let head = world
        .store
        .append(&world.key(), &deposits(6, 2), Some(BrookPosition::new(5)))
        .await
        .unwrap();

    assert_eq!(head, BrookPosition::new(7));
    assert_eq!(world.positions(0, 7).await, (1..=7).collect::<Vec<_>>());
}

#[tokio::test]
async fn failed_large_batch_leaves_no_trace() {
    for written_chunks in 0..4 {
        let world = World::with_options(StorageOptions::default().with_max_events_per_batch(3));
        world
            .store
            .append(&world.key(), &deposits(1, 2), None)
            .await
            .unwrap();
        world.repo.fail_appends_after(written_chunks);

        let err = world
            .store
            .append(&world.key(), &deposits(3, 12), None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Storage, "after {written_chunks} chunks");
        assert_eq!(world.head().await, 2);
        assert_eq!(world.repo.store().stored_positions(&world.key()), vec![1, 2]);
        let appended: Vec<i64> = world
            .repo
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                RepositoryCall::Append { first, .. } if first > 2 => Some(first),
                _ => None,
            })
            .collect();
        assert_eq!(appended.len(), written_chunks + 1);
    }
}

#[tokio::test]
async fn rollback_residue_is_reported() {
    let world = World::with_options(StorageOptions::default().with_max_events_per_batch(2));
    world.repo.fail_appends_after(1);
    world.repo.fail_delete_at(2);

    let err = world
        .store
        .append(&world.key(), &deposits(1, 6), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RollbackFailure);
    assert!(err.to_string().contains("[2]"), "{err}");
}

#[tokio::test]
async fn write_that_landed_without_acknowledgement_does_not_block_the_brook() {
    let world = World::new();
    world.repo.land_then_fail_append(0);

    let head = world
        .store
        .append(&world.key(), &deposits(1, 3), None)
        .await
        .unwrap();
    assert_eq!(head, BrookPosition::new(3));

    for (first, expected) in [(4, 5), (6, 6)] {
        let count = (expected - first + 1) as usize;
        let head = world
            .store
            .append(&world.key(), &deposits(first, count), None)
            .await
            .unwrap();
        assert_eq!(head.value(), expected);
    }
    assert_eq!(world.positions(0, 6).await, (1..=6).collect::<Vec<_>>());
    assert_eq!(world.repo.store().cursors(&world.key()).1, None);
}

#[tokio::test]
async fn chunk_that_landed_without_acknowledgement_is_rolled_back() {
    let world = World::with_options(StorageOptions::default().with_max_events_per_batch(2));
    world
        .store
        .append(&world.key(), &deposits(1, 2), None)
        .await
        .unwrap();
    world.repo.land_then_fail_append(1);

    let err = world
        .store
        .append(&world.key(), &deposits(3, 6), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Storage);
    assert_eq!(world.head().await, 2);
    assert_eq!(world.repo.store().stored_positions(&world.key()), vec![1, 2]);
}

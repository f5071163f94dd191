//! Snapshot rebuild specs
//!
//! Verify snapshots rebuild from retained ancestors and follow reducer changes.

use crate::prelude::*;
use brook_core::{SnapshotEnvelope, JSON_CONTENT_TYPE};
use brook_snapshot::Reducer;
use similar_asserts::assert_eq;

async fn seeded_world(events: i64) -> World {
    let world = World::new();
    let mut position = 0;
    while position < events {
        let count = (events - position).min(50) as usize;
        world
            .store
            .append(&world.key(), &deposits(position + 1, count), None)
            .await
            .unwrap();
        position += count as i64;
    }
    world
}

#[tokio::test]
async fn rebuild_folds_delta_onto_retained_base() {
    let world = seeded_world(364).await;
    let cache = world.balance_cache(100, "1");
    let base = SnapshotEnvelope {
        data: encoded(sum_to(300)),
        content_type: JSON_CONTENT_TYPE.to_string(),
        reducer_hash: cache.reducer().reducer_hash(),
    };
    world.snapshots.seed(&world.stream().at(300), &base).await;
    world.repo.clear_calls();

    let state = cache.activate(&world.stream(), 364).await.unwrap();

    assert_eq!(state, sum_to(364));
    let reads: Vec<(i64, i64)> = world
        .repo
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            RepositoryCall::ReadEvents { from, to, .. } => Some((from, to)),
            _ => None,
        })
        .collect();
    assert_eq!(reads, vec![(300, 364)]);
}

#[tokio::test]
async fn ancestor_and_full_replay_agree() {
    let world = seeded_world(97).await;

    for modulus in [0, 1, 7, 10, 32, 96, 100] {
        let cache = world.balance_cache(modulus, &format!("m{modulus}"));
        for version in [1, 9, 10, 11, 50, 96, 97] {
            let state = cache.activate(&world.stream(), version).await.unwrap();
            assert_eq!(state, sum_to(version), "modulus {modulus}, version {version}");
        }
    }
}

#[tokio::test]
async fn reducer_change_forces_a_new_persist() {
    let world = seeded_world(20).await;

    let before = world.balance_cache(100, "1");
    before.activate(&world.stream(), 20).await.unwrap();
    world.snapshots.wait_for_writes(1).await;

    // Same reducers hydrate the stored envelope and persist nothing
    let same = world.balance_cache(100, "1");
    same.activate(&world.stream(), 20).await.unwrap();

    let after = world.balance_cache(100, "2");
    after.activate(&world.stream(), 20).await.unwrap();
    world.snapshots.wait_for_writes(2).await;

    let writes = world.snapshots.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].1.reducer_hash, before.reducer().reducer_hash());
    assert_eq!(writes[1].1.reducer_hash, after.reducer().reducer_hash());
    assert_eq!(writes[0].0, writes[1].0);
}

fn encoded(value: i64) -> Vec<u8> {
    value.to_string().into_bytes()
}

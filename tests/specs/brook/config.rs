//! Configuration specs
//!
//! Verify a TOML configuration drives the engine.

use crate::prelude::*;
use brook_core::BrookConfig;

const CONFIG: &str = r#"
[storage]
max-events-per-batch = 2
query-batch-size = 3
recovery-backoff = "5ms"

[snapshots]
default-retention-modulus = 50

[snapshots.retention-modulus]
balance = 4
"#;

#[tokio::test]
async fn configured_limits_shape_writes_and_reads() {
    let config = BrookConfig::from_toml_str(CONFIG).unwrap();
    let world = World::with_options(config.storage.clone());

    world
        .store
        .append(&world.key(), &deposits(1, 5), None)
        .await
        .unwrap();
    assert_eq!(world.positions(0, 5).await.len(), 5);

    let calls = world.repo.calls();
    let appends = calls
        .iter()
        .filter(|call| matches!(call, RepositoryCall::Append { .. }))
        .count();
    let pages: Vec<usize> = calls
        .iter()
        .filter_map(|call| match call {
            RepositoryCall::ReadEvents { limit, .. } => Some(*limit),
            _ => None,
        })
        .collect();
    assert_eq!(appends, 3);
    assert_eq!(pages, vec![3, 3]);
    assert_eq!(config.snapshots.base_version_for("balance", 10), 8);
    assert_eq!(config.snapshots.base_version_for("other", 120), 100);
}

#[test]
fn invalid_configuration_is_rejected() {
    let err = BrookConfig::from_toml_str("[storage]\nquery-batch-size = 0\n").unwrap_err();
    assert!(err.to_string().contains("query-batch-size"), "{err}");
}

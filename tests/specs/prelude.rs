//! Shared fixtures for the behavioral specs

pub use brook_adapters::{
    FakeRepository, FakeSnapshotRepository, MemoryLockProvider, NoRetry, RepositoryCall,
};
pub use brook_core::{
    BrookEvent, BrookKey, BrookPosition, EventData, PendingCursor, RetentionOptions,
    SnapshotStreamKey, StorageOptions,
};
pub use brook_snapshot::{ReducerSet, SnapshotCache};
pub use brook_storage::{BrookError, BrookStore, ErrorKind};
pub use futures::TryStreamExt;

use serde::Deserialize;

pub type Store = BrookStore<FakeRepository, MemoryLockProvider, NoRetry>;
pub type BalanceCache = SnapshotCache<ReducerSet<i64>, FakeRepository, NoRetry, FakeSnapshotRepository>;

#[derive(Deserialize)]
pub struct Deposited {
    pub amount: i64,
}

/// A store over fresh in-memory ports
pub struct World {
    pub repo: FakeRepository,
    pub locks: MemoryLockProvider,
    pub snapshots: FakeSnapshotRepository,
    pub store: Store,
}

impl World {
    pub fn new() -> Self {
        Self::with_options(StorageOptions::default())
    }

    pub fn with_options(options: StorageOptions) -> Self {
        let repo = FakeRepository::new();
        let locks = MemoryLockProvider::new();
        let store = BrookStore::new(repo.clone(), locks.clone(), NoRetry, options);
        Self {
            repo,
            locks,
            snapshots: FakeSnapshotRepository::new(),
            store,
        }
    }

    pub fn key(&self) -> BrookKey {
        BrookKey::new("accounts", "acct-42").unwrap()
    }

    /// Read `(from, to]` and return the positions seen
    pub async fn positions(&self, from: i64, to: i64) -> Vec<i64> {
        let events: Vec<BrookEvent> = self
            .store
            .read(&self.key(), BrookPosition::new(from), BrookPosition::new(to))
            .try_collect()
            .await
            .unwrap();
        events.iter().map(|e| e.position.value()).collect()
    }

    pub async fn head(&self) -> i64 {
        self.store.head(&self.key()).await.unwrap().value()
    }

    /// Leave the brook as a writer that crashed mid-batch would
    pub async fn crash_mid_batch(
        &self,
        committed: i64,
        target: i64,
        landed: impl IntoIterator<Item = i64>,
    ) {
        use brook_adapters::BrookRepository;
        for position in 1..=committed {
            self.insert(position);
        }
        for position in landed {
            self.insert(position);
        }
        self.repo
            .store()
            .write_cursor(&self.key(), BrookPosition::new(committed))
            .await
            .unwrap();
        self.repo
            .store()
            .write_pending_cursor(
                &self.key(),
                PendingCursor::new(BrookPosition::new(committed), BrookPosition::new(target)),
            )
            .await
            .unwrap();
    }

    /// Store a deposit of `position` at `position`, bypassing the appender
    pub fn insert(&self, position: i64) {
        self.repo
            .store()
            .insert_event(&self.key(), BrookPosition::new(position), &deposit(position));
    }

    pub fn stream(&self) -> SnapshotStreamKey {
        SnapshotStreamKey::new("balance", self.key()).unwrap()
    }

    pub fn balance_cache(&self, modulus: u64, revision: &str) -> BalanceCache {
        SnapshotCache::new(
            balance_reducer().with_revision(revision),
            self.store.reader().clone(),
            self.snapshots.clone(),
            RetentionOptions::default().with_modulus("balance", modulus),
        )
    }
}

pub fn balance_reducer() -> ReducerSet<i64> {
    ReducerSet::new("balance", 0).on("Deposited", |state, e: Deposited| state + e.amount)
}

pub fn deposit(amount: i64) -> EventData {
    EventData::new("Deposited", format!("{{\"amount\":{amount}}}"))
}

/// `count` deposits of `first`, `first + 1`, ...
pub fn deposits(first: i64, count: usize) -> Vec<EventData> {
    (0..count as i64).map(|n| deposit(first + n)).collect()
}

pub fn sum_to(n: i64) -> i64 {
    n * (n + 1) / 2
}

//! Refresh engine: one list, diff, fetch, publish pass over the secret store.

use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::snapshot::{LoadedSecret, Snapshot, SnapshotCache};
use crate::errors::{MirrorError, Result};
use crate::secrets::{list_all_secrets, SecretPolicy, SecretStoreClient};

/// Result of a successful refresh cycle
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    /// The snapshot published by this cycle
    pub snapshot: Arc<Snapshot>,
    /// Whether the published content differs from the previous snapshot
    pub changed: bool,
    /// Secrets fetched from the store this cycle
    pub fetched: usize,
    /// Secrets carried over from the previous snapshot without a fetch
    pub reused: usize,
    /// Secrets present before that are no longer loaded
    pub removed: usize,
}

/// Position of a listed secret in the new snapshot
enum Slot {
    Reused(String, Arc<LoadedSecret>),
    Fetch(String),
}

/// Runs refresh cycles against a store client and publishes into a [`SnapshotCache`].
///
/// Cycles are serialized: a second caller waits for the running cycle to finish
/// and then diffs against the snapshot it published.
#[derive(Debug)]
pub struct RefreshEngine {
    client: Arc<dyn SecretStoreClient>,
    policy: Arc<dyn SecretPolicy>,
    store: String,
    cache: SnapshotCache,
    cycle: Mutex<()>,
}

impl RefreshEngine {
    pub fn new(
        client: Arc<dyn SecretStoreClient>,
        policy: Arc<dyn SecretPolicy>,
        store: impl Into<String>,
    ) -> Self {
        Self {
            client,
            policy,
            store: store.into(),
            cache: SnapshotCache::new(),
            cycle: Mutex::new(()),
        }
    }

    /// Store address this engine lists
    pub fn store(&self) -> &str {
        &self.store
    }

    /// Cache the engine publishes into
    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Run one refresh cycle.
    ///
    /// On error nothing is published and the previous snapshot stays current.
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let _cycle = self.cycle.lock().await;
        let previous = self.cache.current();
        let items = list_all_secrets(self.client.as_ref(), &self.store).await?;

        let mut remaining = previous.working_copy();
        let mut slots = Vec::with_capacity(items.len());
        let mut to_fetch = Vec::new();
        let mut placed: HashSet<&str> = HashSet::with_capacity(items.len());

        for item in &items {
            if !item.enabled {
                debug!(secret = %item.name, "Skipping disabled secret");
                continue;
            }
            if !self.policy.should_load(item) {
                continue;
            }
            let Some(id) = item.identifier() else {
                debug!(secret = %item.name, "Skipping secret without identifier");
                continue;
            };
            // First listing of an identifier wins; overlapping pages may repeat it
            if !placed.insert(id) {
                debug!(secret = %item.name, id, "Skipping repeated listing of secret");
                continue;
            }

            // Stale records stay in `remaining` so they still count as a change
            let reusable = remaining
                .get(id)
                .is_some_and(|record| record.is_current(item.updated_at.as_ref()));
            let reused_record = if reusable { remaining.remove(id) } else { None };
            match reused_record {
                Some(record) => slots.push(Slot::Reused(id.to_string(), record)),
                None => {
                    slots.push(Slot::Fetch(id.to_string()));
                    to_fetch.push(id.to_string());
                }
            }
        }

        let fetched =
            try_join_all(to_fetch.iter().map(|id| self.client.fetch_secret(id))).await?;

        let mut fetched = fetched.into_iter();
        let mut records = Vec::with_capacity(slots.len());
        let mut reused = 0;
        for slot in slots {
            match slot {
                Slot::Reused(id, record) => {
                    reused += 1;
                    records.push((id, record));
                }
                Slot::Fetch(id) => {
                    let secret = fetched.next().ok_or_else(|| {
                        MirrorError::internal("Fetched secrets out of step with listing")
                    })?;
                    let key = self.policy.key_for(&secret);
                    let record = LoadedSecret::new(key, secret.value, secret.updated_at);
                    records.push((id, Arc::new(record)));
                }
            }
        }

        // `remaining` still holds stale records that were re-fetched above
        let fetched_ids: HashSet<&str> = to_fetch.iter().map(String::as_str).collect();
        let removed = remaining.keys().filter(|id| !fetched_ids.contains(id.as_str())).count();
        let changed = !to_fetch.is_empty() || !remaining.is_empty();

        let snapshot = self.cache.publish(Snapshot::from_records(records));

        if changed {
            info!(
                store = %self.store,
                fetched = to_fetch.len(),
                reused,
                removed,
                keys = snapshot.data().len(),
                "Secret snapshot changed"
            );
        } else {
            debug!(store = %self.store, reused, "Secret snapshot unchanged");
        }

        Ok(RefreshOutcome { snapshot, changed, fetched: to_fetch.len(), reused, removed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::{
        DefaultSecretPolicy, FetchedSecret, InMemorySecretStore, PrefixSecretPolicy, SecretItem,
        SecretPage,
    };
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::time::Duration;

    fn ts(secs: i64) -> Option<DateTime<Utc>> {
        Some(Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap())
    }

    fn engine_for(store: &InMemorySecretStore) -> RefreshEngine {
        RefreshEngine::new(Arc::new(store.clone()), Arc::new(DefaultSecretPolicy), "kv")
    }

    #[tokio::test]
    async fn test_replaced_and_added_secrets() {
        let store = InMemorySecretStore::new();
        store.put("secretA", "v1", ts(1));
        store.put("secretB", "v2", ts(1));
        let engine = engine_for(&store);

        let first = engine.refresh().await.unwrap();
        assert!(first.changed);
        assert_eq!(first.snapshot.get("secretA"), Some("v1"));
        assert_eq!(first.snapshot.get("secretB"), Some("v2"));

        store.remove("secretB");
        store.put("secretC", "v3", ts(2));

        let second = engine.refresh().await.unwrap();
        assert!(second.changed);
        assert_eq!(second.fetched, 1);
        assert_eq!(second.reused, 1);
        assert_eq!(second.removed, 1);
        assert_eq!(second.snapshot.get("secretA"), Some("v1"));
        assert_eq!(second.snapshot.get("secretC"), Some("v3"));
        assert_eq!(second.snapshot.get("secretB"), None);
        assert_eq!(store.fetch_count("secretA"), 1);
    }

    #[tokio::test]
    async fn test_second_cycle_without_changes_is_noop() {
        let store = InMemorySecretStore::new();
        store.put("a", "1", ts(1));
        store.put("b", "2", None);
        let engine = engine_for(&store);

        let first = engine.refresh().await.unwrap();
        let second = engine.refresh().await.unwrap();

        assert!(!second.changed);
        assert_eq!(second.fetched, 0);
        assert_eq!(second.reused, 2);
        assert_eq!(first.snapshot.data(), second.snapshot.data());
        assert_eq!(store.fetch_calls(), 2);
        assert!(Arc::ptr_eq(
            first.snapshot.record("secrets/a").unwrap(),
            second.snapshot.record("secrets/a").unwrap()
        ));
    }

    #[tokio::test]
    async fn test_stale_timestamp_refetches() {
        let store = InMemorySecretStore::new();
        store.put("a", "1", ts(1));
        let engine = engine_for(&store);
        engine.refresh().await.unwrap();

        store.put("a", "2", ts(5));
        let outcome = engine.refresh().await.unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.removed, 0);
        assert_eq!(outcome.snapshot.get("a"), Some("2"));
        assert_eq!(store.fetch_count("a"), 2);
    }

    #[tokio::test]
    async fn test_timestamp_appearing_counts_as_stale() {
        let store = InMemorySecretStore::new();
        store.put("a", "1", None);
        let engine = engine_for(&store);
        engine.refresh().await.unwrap();

        store.put("a", "1", ts(1));
        assert!(engine.refresh().await.unwrap().changed);

        store.put("a", "1", None);
        assert!(engine.refresh().await.unwrap().changed);
        assert_eq!(store.fetch_count("a"), 3);
    }

    #[tokio::test]
    async fn test_disabled_secret_is_removed() {
        let store = InMemorySecretStore::new();
        store.put("a", "1", ts(1));
        store.put("b", "2", ts(1));
        let engine = engine_for(&store);
        engine.refresh().await.unwrap();

        store.set_enabled("b", false);
        let outcome = engine.refresh().await.unwrap();
        assert!(outcome.changed);
        assert_eq!(outcome.removed, 1);
        assert!(!outcome.snapshot.data().contains_key("b"));
        assert_eq!(store.fetch_count("b"), 1);
    }

    #[tokio::test]
    async fn test_rejected_secrets_never_loaded() {
        let store = InMemorySecretStore::new();
        store.put("app--Key", "1", ts(1));
        store.put("other--Key", "2", ts(1));
        let engine = RefreshEngine::new(
            Arc::new(store.clone()),
            Arc::new(PrefixSecretPolicy::new("app")),
            "kv",
        );

        let outcome = engine.refresh().await.unwrap();
        assert_eq!(outcome.snapshot.data().to_map().len(), 1);
        assert_eq!(outcome.snapshot.get("Key"), Some("1"));
        assert_eq!(store.fetch_count("other--Key"), 0);
    }

    #[tokio::test]
    async fn test_list_failure_keeps_previous_snapshot() {
        let store = InMemorySecretStore::new();
        store.put("a", "1", ts(1));
        let engine = engine_for(&store);
        let first = engine.refresh().await.unwrap();

        store.fail_listing(true);
        store.put("a", "2", ts(2));
        assert!(engine.refresh().await.is_err());
        assert!(Arc::ptr_eq(&engine.cache().current(), &first.snapshot));
    }

    #[tokio::test]
    async fn test_partial_fetch_failure_fails_cycle() {
        let store = InMemorySecretStore::new();
        store.put("a", "1", ts(1));
        let engine = engine_for(&store);
        engine.refresh().await.unwrap();

        store.put("b", "2", ts(1));
        store.put("c", "3", ts(1));
        store.fail_fetch("c", true);

        let err = engine.refresh().await.unwrap_err();
        assert!(matches!(err, MirrorError::Store { .. }));
        let current = engine.cache().current();
        assert_eq!(current.len(), 1);
        assert_eq!(current.get("b"), None);
    }

    #[derive(Debug)]
    struct ItemsWithoutIds;

    #[async_trait]
    impl SecretStoreClient for ItemsWithoutIds {
        async fn list_secrets(&self, _store: &str) -> Result<SecretPage> {
            let mut orphan = SecretItem::new("", "orphan");
            orphan.id = None;
            Ok(SecretPage { items: vec![orphan], next_link: None })
        }

        async fn list_secrets_next_page(&self, next_link: &str) -> Result<SecretPage> {
            Err(MirrorError::store(format!("unexpected link {}", next_link)))
        }

        async fn fetch_secret(&self, id: &str) -> Result<FetchedSecret> {
            Err(MirrorError::not_found(id))
        }
    }

    #[tokio::test]
    async fn test_items_without_identifier_are_skipped() {
        let engine =
            RefreshEngine::new(Arc::new(ItemsWithoutIds), Arc::new(DefaultSecretPolicy), "kv");
        let outcome = engine.refresh().await.unwrap();
        assert!(!outcome.changed);
        assert!(outcome.snapshot.is_empty());
    }

    /// Every fetch waits until all of them have started
    #[derive(Debug)]
    struct BarrierStore {
        names: Vec<String>,
        barrier: tokio::sync::Barrier,
    }

    #[async_trait]
    impl SecretStoreClient for BarrierStore {
        async fn list_secrets(&self, _store: &str) -> Result<SecretPage> {
            let items =
                self.names.iter().map(|n| SecretItem::new(format!("secrets/{}", n), n)).collect();
            Ok(SecretPage { items, next_link: None })
        }

        async fn list_secrets_next_page(&self, next_link: &str) -> Result<SecretPage> {
            Err(MirrorError::store(format!("unexpected link {}", next_link)))
        }

        async fn fetch_secret(&self, id: &str) -> Result<FetchedSecret> {
            self.barrier.wait().await;
            let name = id.trim_start_matches("secrets/").to_string();
            Ok(FetchedSecret {
                id: id.to_string(),
                value: format!("value-of-{}", name).into(),
                name,
                updated_at: None,
            })
        }
    }

    #[tokio::test]
    async fn test_fetches_run_concurrently() {
        let names: Vec<String> = (0..8).map(|i| format!("s{}", i)).collect();
        let client = BarrierStore { barrier: tokio::sync::Barrier::new(names.len()), names };
        let engine = RefreshEngine::new(Arc::new(client), Arc::new(DefaultSecretPolicy), "kv");

        let outcome = tokio::time::timeout(Duration::from_secs(5), engine.refresh())
            .await
            .expect("fetches should not run one at a time")
            .unwrap();
        assert_eq!(outcome.fetched, 8);
        assert_eq!(outcome.snapshot.get("s7"), Some("value-of-s7"));
    }

    /// Both listing pages carry the same secret
    #[derive(Debug, Default)]
    struct OverlappingPages {
        fetches: std::sync::atomic::AtomicUsize,
    }

    impl OverlappingPages {
        fn page(next_link: Option<&str>) -> SecretPage {
            let item = SecretItem::new("secrets/a", "a").with_updated_at(ts(1));
            SecretPage { items: vec![item], next_link: next_link.map(str::to_string) }
        }
    }

    #[async_trait]
    impl SecretStoreClient for OverlappingPages {
        async fn list_secrets(&self, _store: &str) -> Result<SecretPage> {
            Ok(Self::page(Some("page-2")))
        }

        async fn list_secrets_next_page(&self, _next_link: &str) -> Result<SecretPage> {
            Ok(Self::page(None))
        }

        async fn fetch_secret(&self, id: &str) -> Result<FetchedSecret> {
            self.fetches.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(FetchedSecret {
                id: id.to_string(),
                name: "a".into(),
                value: "1".into(),
                updated_at: ts(1),
            })
        }
    }

    #[tokio::test]
    async fn test_repeated_identifier_settles() {
        let client = Arc::new(OverlappingPages::default());
        let engine = RefreshEngine::new(client.clone(), Arc::new(DefaultSecretPolicy), "kv");

        let first = engine.refresh().await.unwrap();
        assert!(first.changed);
        assert_eq!(first.fetched, 1);
        assert_eq!(first.snapshot.len(), 1);

        for _ in 0..2 {
            let outcome = engine.refresh().await.unwrap();
            assert!(!outcome.changed);
            assert_eq!(outcome.fetched, 0);
            assert_eq!(outcome.reused, 1);
        }
        assert_eq!(client.fetches.load(std::sync::atomic::Ordering::SeqCst), 1);
        assert_eq!(engine.cache().current().get("a"), Some("1"));
    }
}

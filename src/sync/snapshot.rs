//! Immutable secret snapshots and the cache that publishes them.
//!
//! A [`Snapshot`] is built once per refresh cycle and never mutated after that.
//! Records that did not change between cycles are shared by `Arc`, so publishing
//! an equivalent snapshot costs one map of pointer copies.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::watch;

use crate::secrets::SecretValue;

/// A loaded secret: configuration key, value and the store timestamp it was
/// fetched at. Replaced wholesale, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSecret {
    key: String,
    value: SecretValue,
    updated_at: Option<DateTime<Utc>>,
}

impl LoadedSecret {
    pub fn new(
        key: impl Into<String>,
        value: SecretValue,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self { key: key.into(), value, updated_at }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &str {
        self.value.expose()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Whether a listed timestamp still matches this record.
    ///
    /// Two absent timestamps match; one absent and one present do not.
    pub fn is_current(&self, listed: Option<&DateTime<Utc>>) -> bool {
        self.updated_at.as_ref() == listed
    }
}

/// Flat configuration data published from a snapshot.
///
/// Keys compare case-insensitively. When two records share a key, the one that
/// came later in listing order wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigData {
    entries: HashMap<String, Arc<LoadedSecret>>,
}

impl ConfigData {
    fn fold_key(key: &str) -> String {
        key.to_lowercase()
    }

    fn insert(&mut self, record: Arc<LoadedSecret>) {
        self.entries.insert(Self::fold_key(record.key()), record);
    }

    /// Value published under `key`, compared case-insensitively
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&Self::fold_key(key)).map(|record| record.value())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&Self::fold_key(key))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(key, value)` pairs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.values().map(|record| (record.key(), record.value()))
    }

    /// Copy into an ordered map of owned keys and values
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }
}

/// Secrets keyed by store identifier, plus the configuration data derived from them
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    records: HashMap<String, Arc<LoadedSecret>>,
    data: ConfigData,
}

impl Snapshot {
    /// Build a snapshot from records in listing order
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = (String, Arc<LoadedSecret>)>,
    {
        let mut snapshot = Self::default();
        for (id, record) in records {
            snapshot.data.insert(Arc::clone(&record));
            snapshot.records.insert(id, record);
        }
        snapshot
    }

    /// Record loaded for a store identifier
    pub fn record(&self, id: &str) -> Option<&Arc<LoadedSecret>> {
        self.records.get(id)
    }

    /// Iterate `(identifier, record)` pairs
    pub fn records(&self) -> impl Iterator<Item = (&str, &Arc<LoadedSecret>)> + '_ {
        self.records.iter().map(|(id, record)| (id.as_str(), record))
    }

    /// Number of loaded secrets
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Published configuration data
    pub fn data(&self) -> &ConfigData {
        &self.data
    }

    /// Shorthand for `data().get(key)`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key)
    }

    /// Mutable copy of the record index, sharing every record
    pub(crate) fn working_copy(&self) -> HashMap<String, Arc<LoadedSecret>> {
        self.records.clone()
    }
}

/// Holds the current snapshot and swaps it atomically.
///
/// Reading takes the watch channel's read lock for one `Arc` clone. Iteration
/// happens on the cloned `Arc` with no lock held, so a reader always sees
/// exactly one published snapshot and never blocks the publisher while it reads.
#[derive(Debug)]
pub struct SnapshotCache {
    current: watch::Sender<Arc<Snapshot>>,
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotCache {
    /// Create a cache holding an empty snapshot
    pub fn new() -> Self {
        let (current, _) = watch::channel(Arc::new(Snapshot::default()));
        Self { current }
    }

    /// The currently published snapshot
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.borrow().clone()
    }

    /// Replace the current snapshot
    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        self.current.send_replace(Arc::clone(&snapshot));
        snapshot
    }

    /// Receiver that observes every publication
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.current.subscribe()
    }
}

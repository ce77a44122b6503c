//! In-memory secret store.
//!
//! A [`SecretStoreClient`] that keeps its secrets in process memory. Intended for
//! local development, tests and benchmarks. It pages its listings, counts every
//! call it serves and can be told to fail listings or individual fetches.
//!
//! Clones share the same underlying store, so a test can hand one clone to a
//! mirror and keep mutating the other.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::client::SecretStoreClient;
use super::types::{FetchedSecret, SecretItem, SecretPage, SecretValue};
use crate::errors::{MirrorError, Result};

/// Default number of items per listing page
pub const DEFAULT_PAGE_SIZE: usize = 25;

const SKIP_PARAM: &str = "?skip=";

#[derive(Debug, Clone)]
struct StoredSecret {
    id: String,
    name: String,
    value: SecretValue,
    enabled: bool,
    updated_at: Option<DateTime<Utc>>,
}

impl StoredSecret {
    fn item(&self) -> SecretItem {
        SecretItem::new(self.id.clone(), self.name.clone())
            .with_enabled(self.enabled)
            .with_updated_at(self.updated_at)
    }
}

#[derive(Debug, Default)]
struct StoreState {
    /// Insertion order is listing order
    secrets: Vec<StoredSecret>,
    fail_listing: bool,
    failing_fetches: HashSet<String>,
    fetches_by_name: HashMap<String, usize>,
}

#[derive(Debug, Default)]
struct CallCounters {
    list: AtomicUsize,
    next_page: AtomicUsize,
    fetch: AtomicUsize,
}

/// Secret store held in memory
#[derive(Debug, Clone)]
pub struct InMemorySecretStore {
    state: Arc<Mutex<StoreState>>,
    counters: Arc<CallCounters>,
    page_size: usize,
}

impl Default for InMemorySecretStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySecretStore {
    /// Create an empty store with the default page size
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Create an empty store that pages listings every `page_size` items
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(StoreState::default())),
            counters: Arc::new(CallCounters::default()),
            page_size: page_size.max(1),
        }
    }

    /// Identifier the store assigns to a secret name
    pub fn id_for(name: &str) -> String {
        format!("secrets/{}", name)
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Insert a secret or replace an existing one in place, keeping its listing position
    pub fn put(&self, name: &str, value: &str, updated_at: Option<DateTime<Utc>>) {
        let mut state = self.state();
        match state.secrets.iter_mut().find(|s| s.name == name) {
            Some(existing) => {
                existing.value = SecretValue::new(value);
                existing.updated_at = updated_at;
            }
            None => state.secrets.push(StoredSecret {
                id: Self::id_for(name),
                name: name.to_string(),
                value: SecretValue::new(value),
                enabled: true,
                updated_at,
            }),
        }
    }

    /// Enable or disable a secret; returns false if it does not exist
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let mut state = self.state();
        match state.secrets.iter_mut().find(|s| s.name == name) {
            Some(secret) => {
                secret.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Remove a secret; returns false if it did not exist
    pub fn remove(&self, name: &str) -> bool {
        let mut state = self.state();
        let before = state.secrets.len();
        state.secrets.retain(|s| s.name != name);
        state.secrets.len() != before
    }

    /// Make every listing call fail until switched off
    pub fn fail_listing(&self, fail: bool) {
        self.state().fail_listing = fail;
    }

    /// Make fetches of one secret fail until switched off
    pub fn fail_fetch(&self, name: &str, fail: bool) {
        let mut state = self.state();
        if fail {
            state.failing_fetches.insert(name.to_string());
        } else {
            state.failing_fetches.remove(name);
        }
    }

    /// Number of first-page listing calls served
    pub fn list_calls(&self) -> usize {
        self.counters.list.load(Ordering::SeqCst)
    }

    /// Number of continuation-page calls served
    pub fn next_page_calls(&self) -> usize {
        self.counters.next_page.load(Ordering::SeqCst)
    }

    /// Number of fetch calls served, including failed ones
    pub fn fetch_calls(&self) -> usize {
        self.counters.fetch.load(Ordering::SeqCst)
    }

    /// Number of fetch calls served for one secret name
    pub fn fetch_count(&self, name: &str) -> usize {
        self.state().fetches_by_name.get(name).copied().unwrap_or(0)
    }

    fn page_from(&self, store: &str, offset: usize) -> Result<SecretPage> {
        let state = self.state();
        if state.fail_listing {
            return Err(MirrorError::store(format!("Listing '{}' failed", store)));
        }

        let end = (offset + self.page_size).min(state.secrets.len());
        let items = state.secrets.get(offset..end).unwrap_or_default();
        let next_link =
            (end < state.secrets.len()).then(|| format!("{}{}{}", store, SKIP_PARAM, end));

        Ok(SecretPage { items: items.iter().map(StoredSecret::item).collect(), next_link })
    }
}

#[async_trait]
impl SecretStoreClient for InMemorySecretStore {
    async fn list_secrets(&self, store: &str) -> Result<SecretPage> {
        self.counters.list.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.page_from(store, 0)
    }

    async fn list_secrets_next_page(&self, next_link: &str) -> Result<SecretPage> {
        self.counters.next_page.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let (store, offset) = next_link
            .rsplit_once(SKIP_PARAM)
            .and_then(|(store, skip)| skip.parse::<usize>().ok().map(|offset| (store, offset)))
            .ok_or_else(|| MirrorError::store(format!("Malformed page link '{}'", next_link)))?;
        self.page_from(store, offset)
    }

    async fn fetch_secret(&self, id: &str) -> Result<FetchedSecret> {
        self.counters.fetch.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let mut state = self.state();
        let secret = state
            .secrets
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| MirrorError::not_found(id))?;
        *state.fetches_by_name.entry(secret.name.clone()).or_default() += 1;

        if state.failing_fetches.contains(&secret.name) {
            return Err(MirrorError::store(format!("Fetching '{}' failed", id)));
        }

        Ok(FetchedSecret {
            id: secret.id,
            name: secret.name,
            value: secret.value,
            updated_at: secret.updated_at,
        })
    }
}

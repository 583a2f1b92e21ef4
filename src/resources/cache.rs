//! Process-wide grammar/theme cache
//!
//! Reads go through an `ArcSwap` snapshot and never block. Writes (load
//! bookkeeping and publishing) serialize on a mutex around the in-flight
//! table. Each key has at most one load in flight; concurrent requests for
//! the same key wait on the same `watch` channel.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use tokio::sync::watch;

use super::loader::{Resource, ResourceLoader};
use super::{ResourceKey, ResourceKind};
use crate::syntax::Grammar;
use crate::theme::Theme;

type LoadOutcome = Result<(), String>;

/// Lifecycle of a cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Unloaded,
    Loading,
    Loaded,
}

/// Point-in-time view of one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: ResourceKey,
    pub status: LoadStatus,
    pub loaded_at: Option<Instant>,
}

/// The last failed load of a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub at: Instant,
    pub message: String,
}

/// Outcome of `ensure_loaded`, per key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<ResourceKey>,
    pub failed: Vec<(ResourceKey, String)>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Immutable published state
#[derive(Debug, Clone, Default)]
struct CacheSnapshot {
    grammars: HashMap<String, Arc<Grammar>>,
    themes: HashMap<String, Arc<Theme>>,
    loaded_at: HashMap<ResourceKey, Instant>,
}

impl CacheSnapshot {
    fn contains(&self, key: &ResourceKey) -> bool {
        match key.kind {
            ResourceKind::Grammar => self.grammars.contains_key(&key.id),
            ResourceKind::Theme => self.themes.contains_key(&key.id),
        }
    }
}

#[derive(Default)]
struct CacheState {
    in_flight: HashMap<ResourceKey, watch::Receiver<Option<LoadOutcome>>>,
    failures: HashMap<ResourceKey, LoadFailure>,
}

pub struct ResourceCache {
    loader: Arc<dyn ResourceLoader>,
    snapshot: ArcSwap<CacheSnapshot>,
    state: Mutex<CacheState>,
    /// Bumped by `reset`; loads started under an older generation are dropped
    generation: AtomicU64,
    load_count: AtomicUsize,
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snap = self.snapshot.load();
        f.debug_struct("ResourceCache")
            .field("grammars", &snap.grammars.len())
            .field("themes", &snap.themes.len())
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}

impl ResourceCache {
    pub fn new(loader: Arc<dyn ResourceLoader>) -> Self {
        Self {
            loader,
            snapshot: ArcSwap::from_pointee(CacheSnapshot::default()),
            state: Mutex::new(CacheState::default()),
            generation: AtomicU64::new(0),
            load_count: AtomicUsize::new(0),
        }
    }

    /// Whether the loader can produce `key` at all
    pub fn knows(&self, key: &ResourceKey) -> bool {
        self.loader.knows(key)
    }

    pub fn is_loaded(&self, kind: ResourceKind, id: &str) -> bool {
        let snap = self.snapshot.load();
        match kind {
            ResourceKind::Grammar => snap.grammars.contains_key(id),
            ResourceKind::Theme => snap.themes.contains_key(id),
        }
    }

    /// Ids of every loaded resource of `kind`, sorted
    pub fn loaded_identifiers(&self, kind: ResourceKind) -> Vec<String> {
        let snap = self.snapshot.load();
        let mut ids: Vec<String> = match kind {
            ResourceKind::Grammar => snap.grammars.keys().cloned().collect(),
            ResourceKind::Theme => snap.themes.keys().cloned().collect(),
        };
        ids.sort();
        ids
    }

    pub fn grammar(&self, id: &str) -> Option<Arc<Grammar>> {
        self.snapshot.load().grammars.get(id).cloned()
    }

    pub fn theme(&self, id: &str) -> Option<Arc<Theme>> {
        self.snapshot.load().themes.get(id).cloned()
    }

    pub fn status(&self, key: &ResourceKey) -> LoadStatus {
        if self.snapshot.load().contains(key) {
            return LoadStatus::Loaded;
        }
        if self.state.lock().in_flight.contains_key(key) {
            LoadStatus::Loading
        } else {
            LoadStatus::Unloaded
        }
    }

    pub fn entry(&self, key: &ResourceKey) -> CacheEntry {
        CacheEntry {
            key: key.clone(),
            status: self.status(key),
            loaded_at: self.snapshot.load().loaded_at.get(key).copied(),
        }
    }

    /// The most recent failure for `key`, cleared once it loads
    pub fn failure(&self, key: &ResourceKey) -> Option<LoadFailure> {
        self.state.lock().failures.get(key).cloned()
    }

    /// Number of underlying loads started since creation
    pub fn load_count(&self) -> usize {
        self.load_count.load(Ordering::SeqCst)
    }

    /// Forget everything. Loads in flight finish but are not committed.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        state.in_flight.clear();
        state.failures.clear();
        self.snapshot.store(Arc::new(CacheSnapshot::default()));
        tracing::debug!("Resource cache reset");
    }

    /// Load every key that is neither loaded nor loading, join loads
    /// already in flight, and wait for all of them.
    pub async fn ensure_loaded(self: &Arc<Self>, keys: Vec<ResourceKey>) -> LoadReport {
        let mut report = LoadReport::default();
        let mut waits = Vec::new();
        let mut seen = HashSet::new();

        {
            let mut state = self.state.lock();
            for key in keys {
                if !seen.insert(key.clone()) {
                    continue;
                }
                if self.snapshot.load().contains(&key) {
                    report.loaded.push(key);
                    continue;
                }
                if let Some(rx) = state.in_flight.get(&key) {
                    tracing::trace!("Joining in-flight load of {}", key);
                    waits.push((key, rx.clone()));
                    continue;
                }
                let (tx, rx) = watch::channel(None);
                state.in_flight.insert(key.clone(), rx.clone());
                self.spawn_load(key.clone(), tx);
                waits.push((key, rx));
            }
        }

        for (key, mut rx) in waits {
            let outcome = match rx.wait_for(Option::is_some).await {
                Ok(value) => value
                    .clone()
                    .unwrap_or_else(|| Err("load produced no result".to_string())),
                Err(_) => Err("load task ended without reporting".to_string()),
            };
            match outcome {
                Ok(()) => report.loaded.push(key),
                Err(message) => report.failed.push((key, message)),
            }
        }
        report
    }

    fn spawn_load(self: &Arc<Self>, key: ResourceKey, tx: watch::Sender<Option<LoadOutcome>>) {
        let generation = self.generation.load(Ordering::SeqCst);
        self.load_count.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Loading {}", key);

        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let loader = Arc::clone(&cache.loader);
            let load_key = key.clone();
            let result = tokio::task::spawn_blocking(move || loader.load(&load_key)).await;
            let outcome = match result {
                Ok(Ok(resource)) => cache.commit(&key, resource, generation),
                Ok(Err(e)) => cache.record_failure(&key, format!("{:#}", e), generation),
                Err(e) => cache.record_failure(&key, format!("load task failed: {}", e), generation),
            };
            let _ = tx.send(Some(outcome));
        });
    }

    /// Publish a loaded resource, then clear its in-flight marker
    fn commit(&self, key: &ResourceKey, resource: Resource, generation: u64) -> LoadOutcome {
        if resource.kind() != key.kind {
            return self.record_failure(
                key,
                format!("loader returned a {} for {}", resource.kind(), key),
                generation,
            );
        }

        let mut state = self.state.lock();
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("Discarding load of {} started before a reset", key);
            return Err("cache was reset during the load".to_string());
        }

        let mut next = CacheSnapshot::clone(&self.snapshot.load());
        match resource {
            Resource::Grammar(grammar) => {
                next.grammars.insert(key.id.clone(), grammar);
            }
            Resource::Theme(theme) => {
                next.themes.insert(key.id.clone(), theme);
            }
        }
        next.loaded_at.insert(key.clone(), Instant::now());
        self.snapshot.store(Arc::new(next));

        state.in_flight.remove(key);
        state.failures.remove(key);
        tracing::debug!("Loaded {}", key);
        Ok(())
    }

    fn record_failure(&self, key: &ResourceKey, message: String, generation: u64) -> LoadOutcome {
        let mut state = self.state.lock();
        if self.generation.load(Ordering::SeqCst) == generation {
            tracing::warn!("Failed to load {}: {}", key, message);
            state.in_flight.remove(key);
            state.failures.insert(
                key.clone(),
                LoadFailure {
                    at: Instant::now(),
                    message: message.clone(),
                },
            );
        }
        Err(message)
    }
}

//! Grammar and theme resources
//!
//! Grammars and themes are loaded lazily through a [`ResourceLoader`] and
//! cached process-wide in a [`ResourceCache`]. Readers query the cache
//! synchronously; loads are asynchronous and deduplicated per key.

mod cache;
mod loader;

use std::sync::{Arc, OnceLock};

pub use cache::{CacheEntry, LoadFailure, LoadReport, LoadStatus, ResourceCache};
pub use loader::{BuiltinLoader, Resource, ResourceLoader};

use crate::syntax::LanguageId;

/// The two kinds of cached resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Grammar,
    Theme,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Grammar => write!(f, "grammar"),
            ResourceKind::Theme => write!(f, "theme"),
        }
    }
}

/// Cache key: `(kind, id)`. Grammar ids are canonical language ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub kind: ResourceKind,
    pub id: String,
}

impl ResourceKey {
    pub fn new(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn grammar(language: LanguageId) -> Self {
        Self::new(ResourceKind::Grammar, language.id())
    }

    pub fn theme(id: impl Into<String>) -> Self {
        Self::new(ResourceKind::Theme, id)
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

static GLOBAL_CACHE: OnceLock<Arc<ResourceCache>> = OnceLock::new();

/// Initialize the process-wide cache. Later calls return the existing one.
pub fn init(loader: Arc<dyn ResourceLoader>) -> Arc<ResourceCache> {
    let mut fresh = false;
    let cache = GLOBAL_CACHE
        .get_or_init(|| {
            fresh = true;
            Arc::new(ResourceCache::new(loader))
        })
        .clone();
    if !fresh {
        tracing::warn!("Resource cache already initialized, keeping the existing loader");
    }
    cache
}

/// The process-wide cache, initialized with the builtin loader on first use
pub fn global() -> Arc<ResourceCache> {
    GLOBAL_CACHE
        .get_or_init(|| Arc::new(ResourceCache::new(Arc::new(BuiltinLoader))))
        .clone()
}

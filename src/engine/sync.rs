//! Load batching for missing grammars and themes
//!
//! At most one batch is outstanding. A new batch is issued only when the
//! document needs something the outstanding batch does not cover; it
//! supersedes the old one, whose completion is then ignored.

use std::collections::BTreeSet;
use std::time::Duration;

use crate::config::MIN_RETRY_AFTER_MS;
use crate::decoration::ComputeOptions;
use crate::model::Document;
use crate::resources::{ResourceCache, ResourceKey};
use crate::syntax::LanguageId;

/// A set of keys requested together under one completion token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub token: u64,
    pub keys: Vec<ResourceKey>,
    /// Document version the batch was issued for
    pub version: u64,
}

/// How a completion relates to the synchronizer's current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The newest batch of a live engine
    Current,
    /// Superseded, unknown, or arriving after teardown
    Stale,
}

#[derive(Debug)]
pub struct ResourceSynchronizer {
    next_token: u64,
    outstanding: Option<Batch>,
    torn_down: bool,
    retry_after: Duration,
}

impl ResourceSynchronizer {
    pub fn new(retry_after: Duration) -> Self {
        let floor = Duration::from_millis(MIN_RETRY_AFTER_MS);
        if retry_after < floor {
            tracing::warn!("Retry backoff {:?} is below {:?}, using {:?}", retry_after, floor, floor);
        }
        Self {
            next_token: 1,
            outstanding: None,
            torn_down: false,
            retry_after: retry_after.max(floor),
        }
    }

    pub fn retry_after(&self) -> Duration {
        self.retry_after
    }

    pub fn outstanding(&self) -> Option<&Batch> {
        self.outstanding.as_ref()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Keys the document needs that are known to the loader, not loaded,
    /// and not within the retry backoff of a failed load
    pub fn missing(
        &self,
        doc: &Document,
        cache: &ResourceCache,
        options: &ComputeOptions,
    ) -> Vec<ResourceKey> {
        let mut wanted = BTreeSet::new();
        let mut push_language = |name: &str| {
            if let Some(lang) = LanguageId::resolve(name).filter(LanguageId::has_highlighting) {
                wanted.insert(ResourceKey::grammar(lang));
            }
        };
        push_language(&options.default_language);
        let regions = doc.code_regions();
        for region in &regions {
            if let Some(language) = region.language {
                push_language(language);
            }
        }

        wanted.insert(ResourceKey::theme(options.default_theme.clone()));
        for region in &regions {
            if let Some(theme) = region.theme.map(str::trim).filter(|t| !t.is_empty()) {
                wanted.insert(ResourceKey::theme(theme));
            }
        }

        wanted
            .into_iter()
            .filter(|key| !cache.is_loaded(key.kind, &key.id))
            .filter(|key| cache.knows(key))
            .filter(|key| !self.backing_off(key, cache))
            .collect()
    }

    fn backing_off(&self, key: &ResourceKey, cache: &ResourceCache) -> bool {
        match cache.failure(key) {
            Some(failure) if failure.at.elapsed() < self.retry_after => {
                tracing::trace!("Not retrying {} yet: {}", key, failure.message);
                true
            }
            _ => false,
        }
    }

    /// The batch to issue for `doc`, if anything new is missing
    pub fn sync(
        &mut self,
        doc: &Document,
        cache: &ResourceCache,
        options: &ComputeOptions,
    ) -> Option<Batch> {
        self.sync_skipping(doc, cache, options, &[])
    }

    /// Like [`sync`](Self::sync), leaving out `skip`. Used after a
    /// completion so the keys that batch just failed are not re-requested
    /// by the same completion.
    pub fn sync_skipping(
        &mut self,
        doc: &Document,
        cache: &ResourceCache,
        options: &ComputeOptions,
        skip: &[ResourceKey],
    ) -> Option<Batch> {
        if self.torn_down {
            return None;
        }
        let mut missing = self.missing(doc, cache, options);
        missing.retain(|key| !skip.contains(key));
        if missing.is_empty() {
            return None;
        }
        if let Some(batch) = &self.outstanding {
            if missing.iter().all(|key| batch.keys.contains(key)) {
                return None;
            }
        }

        let batch = Batch {
            token: self.next_token,
            keys: missing,
            version: doc.version(),
        };
        self.next_token += 1;
        if let Some(previous) = &self.outstanding {
            tracing::debug!("Batch {} superseded by {}", previous.token, batch.token);
        }
        tracing::debug!(
            "Issuing load batch {} for version {}: {}",
            batch.token,
            batch.version,
            batch
                .keys
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.outstanding = Some(batch.clone());
        Some(batch)
    }

    /// Validate a completion token, retiring the batch if it is current
    pub fn complete(&mut self, token: u64) -> Completion {
        if self.torn_down {
            tracing::debug!("Discarding completion {} after teardown", token);
            return Completion::Stale;
        }
        match &self.outstanding {
            Some(batch) if batch.token == token => {
                self.outstanding = None;
                Completion::Current
            }
            _ => {
                tracing::debug!("Discarding stale completion {}", token);
                Completion::Stale
            }
        }
    }

    /// Stop honouring completions
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.outstanding = None;
    }
}

//! Highlight engine: the host-facing surface
//!
//! One editing thread owns the engine and feeds it transactions in version
//! order. Each transaction is either remapped or recomputed (see
//! [`detector`]); missing grammars and themes are requested in the
//! background (see [`sync`]) and their completions come back over a
//! channel drained by [`HighlightEngine::process_async_messages`].
//!
//! ## Flow
//!
//! ```text
//! apply(tx) → ChangeDetector { Remap | Recompute }
//!          → ResourceSynchronizer::sync → (tokio) ensure_loaded
//!          → Msg::Resource(BatchLoaded) → token check → forced recompute
//! ```

pub mod detector;
pub mod sync;

use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;

pub use detector::{ChangeDetector, Decision, DetectorState, RecomputeReason};
pub use sync::{Batch, Completion, ResourceSynchronizer};

use crate::commands;
use crate::config::HighlightConfig;
use crate::decoration::{compute, ComputeOptions, DecorationSet};
use crate::messages::{Msg, ResourceMsg};
use crate::model::{CodeRegion, Document, Selection, Transaction, TransformError};
use crate::resources::{self, ResourceCache, ResourceKey};
use crate::syntax::language_class;

type DecorationsHook = Box<dyn FnMut(&DecorationSet) + Send>;

pub struct HighlightEngine {
    cache: Arc<ResourceCache>,
    runtime: Handle,
    options: ComputeOptions,
    language_class_prefix: String,
    detector: ChangeDetector,
    sync: ResourceSynchronizer,
    doc: Arc<Document>,
    selection: Selection,
    decorations: DecorationSet,
    hook: Option<DecorationsHook>,
    msg_tx: mpsc::Sender<Msg>,
    msg_rx: mpsc::Receiver<Msg>,
}

impl std::fmt::Debug for HighlightEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighlightEngine")
            .field("version", &self.doc.version())
            .field("decorations", &self.decorations.len())
            .field("detector", &self.detector.state())
            .field("outstanding", &self.sync.outstanding().map(|b| b.token))
            .finish()
    }
}

impl HighlightEngine {
    /// Engine using an explicit cache; loads are spawned on `runtime`
    pub fn new(cache: Arc<ResourceCache>, runtime: Handle, config: &HighlightConfig) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel();
        let doc = Arc::new(Document::default());
        Self {
            cache,
            runtime,
            options: ComputeOptions::from(config),
            language_class_prefix: config.language_class_prefix.clone(),
            detector: ChangeDetector::new(),
            sync: ResourceSynchronizer::new(config.retry_after()),
            decorations: DecorationSet::empty(doc.version()),
            doc,
            selection: Selection::default(),
            hook: None,
            msg_tx,
            msg_rx,
        }
    }

    /// Engine using the process-wide cache
    pub fn with_global_cache(runtime: Handle, config: &HighlightConfig) -> Self {
        Self::new(resources::global(), runtime, config)
    }

    /// Seed the engine with its first document: compute decorations with
    /// whatever is loaded and request everything missing
    pub fn init(&mut self, doc: Arc<Document>) -> &DecorationSet {
        tracing::debug!("Initializing with document version {}", doc.version());
        self.doc = doc;
        self.selection = Selection::default();
        self.detector.mark_dirty();
        self.recompute(RecomputeReason::Forced);
        self.issue_sync();
        self.notify();
        &self.decorations
    }

    /// Bring decorations up to date with `tx.after()`
    pub fn apply(&mut self, tx: &Transaction) -> &DecorationSet {
        if tx.before().version() != self.doc.version() {
            tracing::warn!(
                "Transaction from version {} does not follow current version {}, recomputing",
                tx.before().version(),
                self.doc.version()
            );
            self.adopt(tx);
            self.detector.mark_dirty();
            self.recompute(RecomputeReason::Forced);
        } else {
            let decision = self.detector.observe(tx);
            self.adopt(tx);
            match decision {
                Decision::Recompute(reason) => self.recompute(reason),
                Decision::Remap => match self.decorations.remap(tx.mapping(), &self.doc) {
                    Ok(remapped) => {
                        tracing::trace!("Remapped {} decorations", remapped.len());
                        self.decorations = remapped;
                    }
                    Err(e) => {
                        tracing::warn!("Remap failed ({}), recomputing", e);
                        self.recompute(RecomputeReason::Forced);
                    }
                },
            }
        }
        self.issue_sync();
        self.notify();
        &self.decorations
    }

    fn adopt(&mut self, tx: &Transaction) {
        self.doc = Arc::clone(tx.after());
        self.selection = tx.selection_after();
    }

    fn recompute(&mut self, reason: RecomputeReason) {
        let start = Instant::now();
        self.decorations = compute(&self.doc, &self.cache, &self.options);
        self.detector.mark_clean();
        tracing::debug!(
            "Recomputed {} decorations for version {} ({:?}) in {:?}",
            self.decorations.len(),
            self.doc.version(),
            reason,
            start.elapsed()
        );
    }

    fn issue_sync(&mut self) {
        self.issue_sync_skipping(&[]);
    }

    fn issue_sync_skipping(&mut self, skip: &[ResourceKey]) {
        let Some(batch) = self
            .sync
            .sync_skipping(&self.doc, &self.cache, &self.options, skip)
        else {
            return;
        };
        let cache = Arc::clone(&self.cache);
        let tx = self.msg_tx.clone();
        self.runtime.spawn(async move {
            let report = cache.ensure_loaded(batch.keys).await;
            let _ = tx.send(Msg::batch_loaded(batch.token, batch.version, report));
        });
    }

    fn notify(&mut self) {
        if let Some(hook) = self.hook.as_mut() {
            hook(&self.decorations);
        }
    }

    /// Apply completed loads. Returns whether decorations changed.
    pub fn process_async_messages(&mut self) -> bool {
        let mut changed = false;
        while let Ok(msg) = self.msg_rx.try_recv() {
            changed |= self.handle_msg(msg);
        }
        changed
    }

    /// Block until the outstanding batch (if any) completes or `timeout`
    /// passes. Returns whether nothing is left outstanding.
    ///
    /// Must not be called from a thread of the runtime the loads run on.
    pub fn wait_for_completion(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.process_async_messages();
        while self.sync.outstanding().is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.msg_rx.recv_timeout(remaining) {
                Ok(msg) => {
                    self.handle_msg(msg);
                }
                Err(_) => return false,
            }
        }
        true
    }

    fn handle_msg(&mut self, msg: Msg) -> bool {
        match msg {
            Msg::Resource(ResourceMsg::BatchLoaded {
                token,
                issued_for,
                report,
            }) => {
                if self.sync.complete(token) == Completion::Stale {
                    return false;
                }
                for (key, message) in &report.failed {
                    tracing::debug!("Batch {} could not load {}: {}", token, key, message);
                }
                let changed = !report.loaded.is_empty();
                if changed {
                    tracing::debug!(
                        "Batch {} (issued for version {}) loaded, recomputing version {}",
                        token,
                        issued_for,
                        self.doc.version()
                    );
                    self.detector.mark_dirty();
                    self.recompute(RecomputeReason::Forced);
                    self.notify();
                }
                // Failed keys wait for the next transaction past their backoff
                let failed: Vec<ResourceKey> =
                    report.failed.into_iter().map(|(key, _)| key).collect();
                self.issue_sync_skipping(&failed);
                changed
            }
        }
    }

    /// Set the language of the code block at `pos` and apply the change
    pub fn set_language(&mut self, pos: usize, language: Option<&str>) -> Result<&DecorationSet, TransformError> {
        let tx = commands::set_language(Arc::clone(&self.doc), self.selection, pos, language)?;
        Ok(self.apply(&tx))
    }

    /// Set the theme of the code block at `pos` and apply the change
    pub fn set_theme(&mut self, pos: usize, theme: Option<&str>) -> Result<&DecorationSet, TransformError> {
        let tx = commands::set_theme(Arc::clone(&self.doc), self.selection, pos, theme)?;
        Ok(self.apply(&tx))
    }

    /// Read-only snapshot, valid until the next transaction
    pub fn current_decorations(&self) -> DecorationSet {
        self.decorations.clone()
    }

    /// Called with the new set after every transaction and every honoured
    /// background recompute
    pub fn set_decorations_hook(&mut self, hook: impl FnMut(&DecorationSet) + Send + 'static) {
        self.hook = Some(Box::new(hook));
    }

    pub fn clear_decorations_hook(&mut self) {
        self.hook = None;
    }

    /// `<code>` class for a region, e.g. `language-rust`
    pub fn language_class(&self, region: &CodeRegion<'_>) -> String {
        language_class(&self.language_class_prefix, region.language)
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.doc
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    pub fn options(&self) -> &ComputeOptions {
        &self.options
    }

    pub fn detector_state(&self) -> DetectorState {
        self.detector.state()
    }

    pub fn has_pending_loads(&self) -> bool {
        self.sync.outstanding().is_some()
    }

    /// Stop reacting to load completions and drop the hook
    pub fn shutdown(&mut self) {
        tracing::debug!("Shutting down highlight engine");
        self.sync.teardown();
        self.hook = None;
    }
}

impl Drop for HighlightEngine {
    fn drop(&mut self) {
        self.sync.teardown();
    }
}

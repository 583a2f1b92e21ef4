//! Shared test helpers for integration tests
//!
//! Note: Functions may appear unused because each test file compiles separately.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use codeblock_highlight::config::HighlightConfig;
use codeblock_highlight::engine::HighlightEngine;
use codeblock_highlight::model::{Document, Node, Selection, Transaction};
use codeblock_highlight::resources::{BuiltinLoader, Resource, ResourceCache, ResourceKey, ResourceLoader};

/// Builtin loader with counting, injected failures, and an optional gate
/// that holds every load until opened
#[derive(Default)]
pub struct TestLoader {
    inner: BuiltinLoader,
    calls: Mutex<Vec<ResourceKey>>,
    count: AtomicUsize,
    failing: Mutex<HashSet<ResourceKey>>,
    gate_closed: Mutex<bool>,
    gate: Condvar,
}

impl TestLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A loader whose loads block until `open` is called
    pub fn gated() -> Arc<Self> {
        let loader = Self::default();
        *loader.gate_closed.lock() = true;
        Arc::new(loader)
    }

    /// Hold loads started from now on
    pub fn close(&self) {
        *self.gate_closed.lock() = true;
    }

    pub fn open(&self) {
        *self.gate_closed.lock() = false;
        self.gate.notify_all();
    }

    pub fn fail(&self, key: ResourceKey) {
        self.failing.lock().insert(key);
    }

    pub fn heal(&self, key: &ResourceKey) {
        self.failing.lock().remove(key);
    }

    /// Number of `load` calls so far
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Every key passed to `load`, in call order
    pub fn calls(&self) -> Vec<ResourceKey> {
        self.calls.lock().clone()
    }

    pub fn count_for(&self, key: &ResourceKey) -> usize {
        self.calls.lock().iter().filter(|k| *k == key).count()
    }
}

impl ResourceLoader for TestLoader {
    fn knows(&self, key: &ResourceKey) -> bool {
        self.inner.knows(key)
    }

    fn load(&self, key: &ResourceKey) -> anyhow::Result<Resource> {
        self.count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(key.clone());
        {
            let mut closed = self.gate_closed.lock();
            while *closed {
                self.gate.wait(&mut closed);
            }
        }
        if self.failing.lock().contains(key) {
            anyhow::bail!("injected failure for {}", key);
        }
        self.inner.load(key)
    }
}

/// Cache over `loader`
pub fn cache_with(loader: &Arc<TestLoader>) -> Arc<ResourceCache> {
    Arc::new(ResourceCache::new(Arc::clone(loader) as Arc<dyn ResourceLoader>))
}

/// Multi-threaded runtime for background loads; the test thread itself
/// stays outside it so it can block on completions
pub fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("test runtime")
}

/// Engine over `cache` with default config
pub fn engine(cache: Arc<ResourceCache>, rt: &tokio::runtime::Runtime) -> HighlightEngine {
    HighlightEngine::new(cache, rt.handle().clone(), &HighlightConfig::default())
}

/// Load `keys` into `cache` and wait
pub fn preload(rt: &tokio::runtime::Runtime, cache: &Arc<ResourceCache>, keys: Vec<ResourceKey>) {
    let report = rt.block_on(cache.ensure_loaded(keys));
    assert!(report.is_complete(), "preload failed: {:?}", report.failed);
}

pub const WAIT: Duration = Duration::from_secs(10);

/// paragraph "intro" 0..7, code "let x = 1;" 7..19 (text 8..18),
/// paragraph "outro" 19..26
pub fn js_doc() -> Arc<Document> {
    Arc::new(Document::new(vec![
        Node::paragraph("intro"),
        Node::code_block(Some("js"), "let x = 1;"),
        Node::paragraph("outro"),
    ]))
}

/// Two code blocks and surrounding prose:
/// paragraph "intro" 0..7, rust "fn main() {}" 7..21, paragraph "middle" 21..29,
/// python "def f(): pass" 29..44
pub fn two_block_doc() -> Arc<Document> {
    Arc::new(Document::new(vec![
        Node::paragraph("intro"),
        Node::code_block(Some("rust"), "fn main() {}"),
        Node::paragraph("middle"),
        Node::code_block(Some("python"), "def f(): pass"),
    ]))
}

pub fn insert_text(doc: &Arc<Document>, cursor: usize, pos: usize, text: &str) -> Transaction {
    Transaction::builder(Arc::clone(doc), Selection::cursor(cursor))
        .insert_text(pos, text)
        .expect("insert_text")
        .build()
}

//! Engine tests
//!
//! Background loads, stale completions, malformed transactions, and the
//! host-facing commands.

mod common;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use codeblock_highlight::config::HighlightConfig;
use codeblock_highlight::decoration::{compute, DecorationSet};
use codeblock_highlight::engine::{DetectorState, HighlightEngine};
use codeblock_highlight::model::{
    CodeBlockAttrs, Document, Mapping, Node, Selection, Step, StepMap, Transaction,
};
use codeblock_highlight::resources::{self, BuiltinLoader, ResourceKey, ResourceKind};
use codeblock_highlight::syntax::LanguageId;

use common::{cache_with, engine, insert_text, js_doc, preload, runtime, TestLoader, WAIT};

fn node_class(set: &DecorationSet) -> Option<String> {
    set.nodes().next().and_then(|d| d.attrs().class.clone())
}

fn counting_hook(engine: &mut HighlightEngine) -> Arc<Mutex<Vec<u64>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    engine.set_decorations_hook(move |set| sink.lock().push(set.version()));
    seen
}

#[test]
fn test_init_loads_missing_resources_in_background() {
    let rt = runtime();
    let loader = TestLoader::new();
    let cache = cache_with(&loader);
    let mut engine = engine(Arc::clone(&cache), &rt);

    let doc = js_doc();
    let first = engine.init(Arc::clone(&doc)).clone();
    assert_eq!(node_class(&first).as_deref(), Some("code-block plain"));
    assert!(engine.has_pending_loads());

    assert!(engine.wait_for_completion(WAIT));
    assert!(!engine.has_pending_loads());
    let loaded = engine.current_decorations();
    assert_eq!(loaded.version(), doc.version());
    assert_eq!(node_class(&loaded).as_deref(), Some("code-block vitesse-light"));
    assert!(loaded.inline().count() > 1);
    assert!(cache.is_loaded(ResourceKind::Grammar, "javascript"));
}

#[test]
fn test_superseded_batch_completion_is_ignored() {
    let rt = runtime();
    let loader = TestLoader::gated();
    let cache = cache_with(&loader);
    let mut engine = engine(Arc::clone(&cache), &rt);

    let doc = Arc::new(Document::new(vec![Node::code_block(Some("rust"), "fn main() {}")]));
    engine.init(Arc::clone(&doc));
    assert!(engine.has_pending_loads());

    // A python block appears before the first batch resolves
    let tx = Transaction::builder(Arc::clone(&doc), Selection::cursor(5))
        .insert_node(14, Node::code_block(Some("python"), "pass"))
        .unwrap()
        .build();
    engine.apply(&tx);
    let seen = counting_hook(&mut engine);

    loader.open();
    assert!(engine.wait_for_completion(WAIT));

    // Only the newest batch produced a recompute, for the newest version
    assert_eq!(*seen.lock(), vec![tx.after().version()]);
    let set = engine.current_decorations();
    assert_eq!(set.version(), tx.after().version());
    assert!(set.same_decorations(&compute(tx.after(), &cache, engine.options())));
    // The rust load was shared by both batches
    assert_eq!(loader.count_for(&ResourceKey::grammar(LanguageId::Rust)), 1);
}

#[test]
fn test_theme_load_spanning_two_edits_loads_once_and_applies_to_latest() {
    let rt = runtime();
    let loader = TestLoader::new();
    let cache = cache_with(&loader);
    preload(
        &rt,
        &cache,
        vec![
            ResourceKey::grammar(LanguageId::JavaScript),
            ResourceKey::theme("vitesse-light"),
        ],
    );
    loader.close();

    let doc = Arc::new(Document::new(vec![
        Node::paragraph("intro"),
        Node::CodeBlock {
            attrs: CodeBlockAttrs {
                language: Some("js".to_string()),
                theme: Some("midnight".to_string()),
            },
            text: "let x = 1;".to_string(),
        },
    ]));
    let mut engine = engine(Arc::clone(&cache), &rt);
    let initial = engine.init(Arc::clone(&doc)).clone();
    assert_eq!(node_class(&initial).as_deref(), Some("code-block vitesse-light"));

    // One edit outside the block, one inside it
    let tx1 = insert_text(&doc, 3, 3, "!");
    engine.apply(&tx1);
    let tx2 = insert_text(tx1.after(), 11, 11, "y");
    engine.apply(&tx2);
    assert!(engine.has_pending_loads());

    loader.open();
    assert!(engine.wait_for_completion(WAIT));

    let midnight = ResourceKey::theme("midnight");
    assert_eq!(loader.count_for(&midnight), 1);
    let set = engine.current_decorations();
    assert_eq!(set.version(), tx2.after().version());
    assert_eq!(node_class(&set).as_deref(), Some("code-block midnight"));
    assert!(set.same_decorations(&compute(tx2.after(), &cache, engine.options())));
}

#[test]
fn test_transaction_from_unknown_version_recomputes() {
    let rt = runtime();
    let cache = cache_with(&TestLoader::new());
    let mut engine = engine(cache, &rt);
    engine.init(js_doc());

    // Built against a different snapshot with the same content
    let other = js_doc();
    let tx = insert_text(&other, 3, 3, "x");
    let set = engine.apply(&tx).clone();
    assert_eq!(set.version(), tx.after().version());
    assert_eq!(engine.document().version(), tx.after().version());
    assert_eq!(engine.detector_state(), DetectorState::Idle);
}

#[test]
fn test_out_of_range_mapping_recomputes() {
    let rt = runtime();
    let cache = cache_with(&TestLoader::new());
    let mut engine = engine(Arc::clone(&cache), &rt);
    let doc = js_doc();
    engine.init(Arc::clone(&doc));

    // Claims a 100-character insertion, delivers one
    let after = Transaction::builder(Arc::clone(&doc), Selection::cursor(3))
        .insert_text(2, "x")
        .unwrap()
        .build()
        .after()
        .clone();
    let tx = Transaction::from_parts(
        Arc::clone(&doc),
        Arc::clone(&after),
        vec![Step::Replace {
            from: 2,
            to: 2,
            text: "x".to_string(),
        }],
        Mapping::from_maps(vec![StepMap::single(2, 0, 100)]),
        Selection::cursor(3),
        Selection::cursor(4),
    );
    let set = engine.apply(&tx).clone();
    assert_eq!(set.version(), after.version());
    assert!(set.same_decorations(&compute(&after, &cache, engine.options())));
}

#[test]
fn test_oversized_map_range_recomputes_without_panicking() {
    let rt = runtime();
    let cache = cache_with(&TestLoader::new());
    let mut engine = engine(Arc::clone(&cache), &rt);
    let doc = js_doc();
    engine.init(Arc::clone(&doc));

    let after = insert_text(&doc, 3, 3, "x").after().clone();
    let tx = Transaction::from_parts(
        Arc::clone(&doc),
        Arc::clone(&after),
        vec![Step::Replace {
            from: 3,
            to: 3,
            text: "x".to_string(),
        }],
        Mapping::from_maps(vec![StepMap::single(3, usize::MAX, usize::MAX)]),
        Selection::cursor(3),
        Selection::cursor(4),
    );
    let set = engine.apply(&tx).clone();
    assert_eq!(set.version(), after.version());
    assert!(set.same_decorations(&compute(&after, &cache, engine.options())));
}

#[test]
fn test_set_language_recomputes_and_requests_grammar() {
    let rt = runtime();
    let loader = TestLoader::new();
    let cache = cache_with(&loader);
    let mut engine = engine(Arc::clone(&cache), &rt);
    engine.init(js_doc());
    assert!(engine.wait_for_completion(WAIT));

    let set = engine.set_language(7, Some("Python")).unwrap().clone();
    let node = set.nodes().next().unwrap();
    assert_eq!(node.attrs().data_language.as_deref(), Some("python"));
    assert!(engine.has_pending_loads());

    assert!(engine.wait_for_completion(WAIT));
    assert!(cache.is_loaded(ResourceKind::Grammar, "python"));
    let regions = engine.document().code_regions();
    assert_eq!(engine.language_class(&regions[0]), "language-python");

    let err = engine.set_language(0, Some("rust")).unwrap_err();
    assert_eq!(err.to_string(), "node at 0 is not a code block");
}

#[test]
fn test_failed_load_backs_off() {
    let rt = runtime();
    let loader = TestLoader::new();
    let midnight = ResourceKey::theme("midnight");
    loader.fail(midnight.clone());
    let cache = cache_with(&loader);
    let config = HighlightConfig {
        default_theme: "midnight".to_string(),
        ..HighlightConfig::default()
    };
    let mut engine = HighlightEngine::new(Arc::clone(&cache), rt.handle().clone(), &config);

    let doc = js_doc();
    engine.init(Arc::clone(&doc));
    assert!(engine.wait_for_completion(WAIT));
    assert!(cache.failure(&midnight).is_some());

    // Further edits do not retry within the backoff window
    engine.apply(&insert_text(&doc, 3, 3, "x"));
    assert!(!engine.has_pending_loads());
    assert_eq!(loader.count_for(&midnight), 1);
    let set = engine.current_decorations();
    assert_eq!(node_class(&set).as_deref(), Some("code-block plain"));
}

#[test]
fn test_zero_backoff_does_not_reload_in_a_loop() {
    let rt = runtime();
    let loader = TestLoader::new();
    let midnight = ResourceKey::theme("midnight");
    loader.fail(midnight.clone());
    let cache = cache_with(&loader);
    let config = HighlightConfig {
        default_theme: "midnight".to_string(),
        retry_after_ms: 0,
        ..HighlightConfig::default()
    };
    let mut engine = HighlightEngine::new(Arc::clone(&cache), rt.handle().clone(), &config);

    engine.init(js_doc());
    assert!(engine.wait_for_completion(WAIT));
    assert!(!engine.has_pending_loads());
    assert_eq!(loader.count_for(&midnight), 1);
}

#[test]
fn test_failed_theme_is_applied_after_backoff_and_heal() {
    let rt = runtime();
    let loader = TestLoader::new();
    let midnight = ResourceKey::theme("midnight");
    loader.fail(midnight.clone());
    let cache = cache_with(&loader);
    let config = HighlightConfig {
        default_theme: "midnight".to_string(),
        retry_after_ms: 100,
        ..HighlightConfig::default()
    };
    let mut engine = HighlightEngine::new(Arc::clone(&cache), rt.handle().clone(), &config);

    let doc = js_doc();
    engine.init(Arc::clone(&doc));
    assert!(engine.wait_for_completion(WAIT));
    assert_eq!(node_class(&engine.current_decorations()).as_deref(), Some("code-block plain"));

    loader.heal(&midnight);
    std::thread::sleep(Duration::from_millis(150));

    // The next transaction past the backoff retries the theme
    let tx = insert_text(&doc, 3, 3, "x");
    engine.apply(&tx);
    assert!(engine.has_pending_loads());
    assert!(engine.wait_for_completion(WAIT));

    assert_eq!(loader.count_for(&midnight), 2);
    assert!(cache.failure(&midnight).is_none());
    let set = engine.current_decorations();
    assert_eq!(set.version(), tx.after().version());
    assert_eq!(node_class(&set).as_deref(), Some("code-block midnight"));
}

#[test]
fn test_shutdown_ignores_completions() {
    let rt = runtime();
    let loader = TestLoader::gated();
    let mut engine = engine(cache_with(&loader), &rt);
    engine.init(js_doc());
    let seen = counting_hook(&mut engine);

    engine.shutdown();
    loader.open();
    assert!(engine.wait_for_completion(WAIT));
    assert!(!engine.process_async_messages());
    assert!(seen.lock().is_empty());
}

#[test]
fn test_global_cache_is_shared() {
    let rt = runtime();
    let cache = resources::init(Arc::new(BuiltinLoader));
    assert!(Arc::ptr_eq(&cache, &resources::global()));

    let engine = HighlightEngine::with_global_cache(rt.handle().clone(), &HighlightConfig::default());
    assert!(Arc::ptr_eq(engine.cache(), &cache));
}

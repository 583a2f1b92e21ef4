//! Resource cache tests
//!
//! Load deduplication across concurrent callers, partial failures, and
//! reset semantics.

mod common;

use std::sync::Arc;
use std::time::Duration;

use codeblock_highlight::resources::{LoadStatus, ResourceKey, ResourceKind};
use codeblock_highlight::syntax::LanguageId;

use common::{cache_with, TestLoader};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_load() {
    let loader = TestLoader::gated();
    let cache = cache_with(&loader);
    let key = ResourceKey::grammar(LanguageId::Rust);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let cache = Arc::clone(&cache);
        let key = key.clone();
        handles.push(tokio::spawn(async move { cache.ensure_loaded(vec![key]).await }));
    }

    // Let every caller register before the load may finish
    while cache.status(&key) != LoadStatus::Loading {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(cache.status(&key), LoadStatus::Loading);
    loader.open();

    for handle in handles {
        let report = handle.await.unwrap();
        assert_eq!(report.loaded, vec![key.clone()]);
        assert!(report.failed.is_empty());
    }
    assert_eq!(loader.count_for(&key), 1);
    assert_eq!(cache.load_count(), 1);
    assert_eq!(cache.status(&key), LoadStatus::Loaded);
    assert!(cache.entry(&key).loaded_at.is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_partial_failure_keeps_successful_keys() {
    let loader = TestLoader::new();
    let cache = cache_with(&loader);
    let good = ResourceKey::theme("github-dark");
    let bad = ResourceKey::grammar(LanguageId::Go);
    loader.fail(bad.clone());

    let report = cache.ensure_loaded(vec![good.clone(), bad.clone()]).await;
    assert_eq!(report.loaded, vec![good.clone()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, bad);
    assert!(report.failed[0].1.contains("injected failure"));
    assert!(!report.is_complete());

    assert!(cache.is_loaded(ResourceKind::Theme, "github-dark"));
    assert_eq!(cache.status(&bad), LoadStatus::Unloaded);
    assert!(cache.failure(&bad).is_some());

    // A later attempt succeeds and clears the failure
    loader.heal(&bad);
    let report = cache.ensure_loaded(vec![bad.clone()]).await;
    assert!(report.is_complete());
    assert!(cache.failure(&bad).is_none());
    assert_eq!(loader.count_for(&bad), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_loaded_keys_are_not_reloaded() {
    let loader = TestLoader::new();
    let cache = cache_with(&loader);
    let keys = vec![
        ResourceKey::grammar(LanguageId::Json),
        ResourceKey::theme("midnight"),
    ];
    cache.ensure_loaded(keys.clone()).await;
    let report = cache.ensure_loaded(keys.clone()).await;
    assert_eq!(report.loaded, keys);
    assert_eq!(loader.count(), 2);
    assert_eq!(
        cache.loaded_identifiers(ResourceKind::Grammar),
        vec!["json".to_string()]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reset_discards_in_flight_loads() {
    let loader = TestLoader::gated();
    let cache = cache_with(&loader);
    let key = ResourceKey::theme("vitesse-dark");

    let pending = {
        let cache = Arc::clone(&cache);
        let key = key.clone();
        tokio::spawn(async move { cache.ensure_loaded(vec![key]).await })
    };
    while cache.status(&key) != LoadStatus::Loading {
        tokio::task::yield_now().await;
    }

    cache.reset();
    assert_eq!(cache.status(&key), LoadStatus::Unloaded);
    loader.open();

    let report = pending.await.unwrap();
    assert_eq!(report.failed.len(), 1);
    assert!(!cache.is_loaded(ResourceKind::Theme, "vitesse-dark"));

    // Loading again after the reset works normally
    let report = cache.ensure_loaded(vec![key.clone()]).await;
    assert!(report.is_complete());
    assert!(cache.is_loaded(ResourceKind::Theme, "vitesse-dark"));
}

#[test]
fn test_unknown_keys_are_not_known() {
    let cache = cache_with(&TestLoader::new());
    assert!(!cache.knows(&ResourceKey::theme("no-such-theme")));
    assert!(!cache.knows(&ResourceKey::new(ResourceKind::Grammar, "cobol")));
    assert!(!cache.knows(&ResourceKey::grammar(LanguageId::PlainText)));
    assert!(cache.knows(&ResourceKey::grammar(LanguageId::Php)));
}

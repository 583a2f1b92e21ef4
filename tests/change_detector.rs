//! Change detector tests
//!
//! Remap vs recompute decisions for realistic transactions, and what the
//! engine does with them.

mod common;

use std::sync::Arc;

use codeblock_highlight::engine::{ChangeDetector, Decision, DetectorState, RecomputeReason};
use codeblock_highlight::model::{Document, Node, Selection, Transaction};
use codeblock_highlight::resources::ResourceKey;
use codeblock_highlight::syntax::LanguageId;

use common::{cache_with, engine, insert_text, js_doc, preload, runtime, two_block_doc, TestLoader};

#[test]
fn test_typing_inside_region_marks_dirty() {
    let doc = js_doc();
    let mut detector = ChangeDetector::new();
    let tx = insert_text(&doc, 12, 12, "2");
    assert_eq!(
        detector.observe(&tx),
        Decision::Recompute(RecomputeReason::InRegionEdit)
    );
    assert_eq!(detector.state(), DetectorState::Dirty);
}

#[test]
fn test_typing_outside_regions_remaps() {
    let doc = js_doc();
    let mut detector = ChangeDetector::new();
    let tx = insert_text(&doc, 22, 22, "more ");
    assert_eq!(detector.observe(&tx), Decision::Remap);
    assert_eq!(detector.state(), DetectorState::Idle);
}

#[test]
fn test_cursor_leaving_region_recomputes_without_text_change() {
    let doc = js_doc();
    let mut detector = ChangeDetector::new();
    let tx = Transaction::select(Arc::clone(&doc), Selection::cursor(12), Selection::cursor(22));
    assert!(!tx.doc_changed());
    assert_eq!(
        detector.observe(&tx),
        Decision::Recompute(RecomputeReason::SelectionCrossed)
    );
}

#[test]
fn test_cursor_moving_between_regions_recomputes() {
    let doc = two_block_doc();
    let tx = Transaction::select(doc, Selection::cursor(10), Selection::cursor(33));
    assert_eq!(
        ChangeDetector::new().observe(&tx),
        Decision::Recompute(RecomputeReason::SelectionCrossed)
    );
}

#[test]
fn test_deleting_a_code_block_is_structural() {
    let doc = two_block_doc();
    let tx = Transaction::builder(doc, Selection::cursor(3))
        .delete_node(29)
        .unwrap()
        .build();
    assert_eq!(
        ChangeDetector::new().observe(&tx),
        Decision::Recompute(RecomputeReason::StructureChanged)
    );
}

#[test]
fn test_engine_retokenizes_edited_region_only() {
    let rt = runtime();
    let cache = cache_with(&TestLoader::new());
    preload(
        &rt,
        &cache,
        vec![
            ResourceKey::grammar(LanguageId::JavaScript),
            ResourceKey::grammar(LanguageId::Python),
            ResourceKey::theme("vitesse-light"),
        ],
    );
    let doc = Arc::new(Document::new(vec![
        Node::code_block(Some("js"), "let x = 1;"),
        Node::paragraph("between"),
        Node::code_block(Some("python"), "x = 2"),
    ]));
    // js block 0..12 (text 1..11), paragraph 12..21, python 21..28 (text 22..27)
    let mut engine = engine(cache, &rt);
    let before = engine.init(Arc::clone(&doc)).clone();

    // `let x = "a" + 1;`
    let tx = insert_text(&doc, 9, 9, "\"a\" + ");
    let after = engine.apply(&tx).clone();
    assert_eq!(engine.detector_state(), DetectorState::Idle);
    assert_eq!(after.version(), tx.after().version());

    let string_span = after
        .inline()
        .find(|d| d.from() == 9)
        .and_then(|d| d.attrs().style.clone());
    let number_span = before
        .inline()
        .find(|d| d.from() == 9)
        .and_then(|d| d.attrs().style.clone());
    assert_eq!(string_span.as_deref(), Some("color:#B56959"));
    assert_eq!(number_span.as_deref(), Some("color:#2F798A"));

    // Python block shifted by six, same styles
    let python_before: Vec<_> = before
        .inline()
        .filter(|d| d.from() >= 22)
        .map(|d| (d.from() + 6, d.to() + 6, d.attrs().clone()))
        .collect();
    let python_after: Vec<_> = after
        .inline()
        .filter(|d| d.from() >= 28)
        .map(|d| (d.from(), d.to(), d.attrs().clone()))
        .collect();
    assert_eq!(python_before, python_after);
}

#[test]
fn test_engine_recomputes_on_selection_crossing() {
    let rt = runtime();
    let cache = cache_with(&TestLoader::new());
    let mut engine = engine(cache, &rt);
    let doc = js_doc();
    engine.init(Arc::clone(&doc));

    let calls = Arc::new(parking_lot::Mutex::new(0usize));
    let counter = Arc::clone(&calls);
    engine.set_decorations_hook(move |_| *counter.lock() += 1);

    let enter = Transaction::select(Arc::clone(&doc), Selection::cursor(3), Selection::cursor(10));
    let set = engine.apply(&enter).clone();
    assert_eq!(set.version(), doc.version());
    assert_eq!(*calls.lock(), 1);
    assert_eq!(engine.selection(), Selection::cursor(10));
}

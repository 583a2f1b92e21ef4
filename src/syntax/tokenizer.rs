//! Text → styled spans
//!
//! Parses the text with the grammar, runs the highlight query, and
//! flattens the (possibly nested) captures into contiguous spans covering
//! the whole text. Offsets are in characters.

use streaming_iterator::StreamingIterator;
use tree_sitter::{Parser, QueryCursor};

use super::grammar::Grammar;
use super::highlights::{HighlightId, StyledSpan};
use crate::theme::Theme;

/// A capture before flattening, in bytes
struct Capture {
    start: usize,
    end: usize,
    pattern: usize,
    highlight: HighlightId,
}

/// Tokenize `text` into spans that tile it exactly.
///
/// `None` grammar means plain text: one neutral span. Empty text yields
/// no spans.
pub fn tokenize(text: &str, grammar: Option<&Grammar>, theme: &Theme) -> Vec<StyledSpan> {
    if text.is_empty() {
        return Vec::new();
    }

    let painted = match grammar {
        Some(grammar) => paint(text, grammar),
        None => vec![None; text.len()],
    };

    let mut spans: Vec<StyledSpan> = Vec::new();
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        let style = theme.style_for(painted[byte_idx]);
        match spans.last_mut() {
            Some(last) if last.style == style => last.end = char_idx + 1,
            _ => spans.push(StyledSpan {
                start: char_idx,
                end: char_idx + 1,
                style,
            }),
        }
    }
    spans
}

/// Highlight category per byte.
///
/// Wider captures are painted first so narrower ones overwrite them; for
/// identical ranges the earliest query pattern is painted last and wins.
fn paint(text: &str, grammar: &Grammar) -> Vec<Option<HighlightId>> {
    let mut painted = vec![None; text.len()];

    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(grammar.ts_language()) {
        tracing::error!("Failed to set language for {:?}: {}", grammar.language(), e);
        return painted;
    }
    let Some(tree) = parser.parse(text, None) else {
        tracing::warn!("Parse failed for {:?}", grammar.language());
        return painted;
    };

    let mut captures_found = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut captures = cursor.captures(grammar.query(), tree.root_node(), text.as_bytes());
    while let Some((query_match, capture_idx)) = captures.next() {
        let capture = &query_match.captures[*capture_idx];
        let Some(highlight) = grammar.capture_highlight(capture.index) else {
            continue;
        };
        let range = capture.node.byte_range();
        if range.start >= range.end {
            continue;
        }
        captures_found.push(Capture {
            start: range.start,
            end: range.end.min(text.len()),
            pattern: query_match.pattern_index,
            highlight,
        });
    }

    captures_found.sort_by(|a, b| {
        (b.end - b.start)
            .cmp(&(a.end - a.start))
            .then(b.pattern.cmp(&a.pattern))
    });
    for capture in &captures_found {
        for slot in &mut painted[capture.start..capture.end] {
            *slot = Some(capture.highlight);
        }
    }

    tracing::trace!(
        "Painted {} captures for {:?} ({} bytes)",
        captures_found.len(),
        grammar.language(),
        text.len()
    );
    painted
}

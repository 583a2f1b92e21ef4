//! Terminal and JSON output for decoration sets
//!
//! ANSI output walks each code region's text and wraps every inline
//! decoration in 24-bit SGR sequences. JSON output is the decoration list
//! as a renderer would receive it.

use std::fmt::Write as _;

use crate::decoration::{Decoration, DecorationSet};
use crate::model::{CodeRegion, Document};
use crate::syntax::{language_tag, SpanStyle};

const RESET: &str = "\x1b[0m";

/// SGR prefix for a span, or `None` when it carries nothing visual
fn sgr(style: &SpanStyle) -> Option<String> {
    let mut codes: Vec<String> = Vec::new();
    if style.font_style.bold {
        codes.push("1".into());
    }
    if style.font_style.italic {
        codes.push("3".into());
    }
    if style.font_style.underline {
        codes.push("4".into());
    }
    if let Some(c) = style.color {
        codes.push(format!("38;2;{};{};{}", c.r, c.g, c.b));
    }
    if codes.is_empty() {
        None
    } else {
        Some(format!("\x1b[{}m", codes.join(";")))
    }
}

/// Byte offset of every char boundary in `text`, plus its length
fn char_boundaries(text: &str) -> Vec<usize> {
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect()
}

fn render_region(out: &mut String, region: &CodeRegion<'_>, decorations: &DecorationSet) {
    let node_language = decorations
        .nodes()
        .find(|d| d.from() == region.start)
        .and_then(|d| d.attrs().data_language.clone());
    let tag = node_language.unwrap_or_else(|| language_tag(region.language).to_string());
    let _ = writeln!(out, "── {} ──", tag);

    let bounds = char_boundaries(region.text);
    let base = region.content_start();
    let len = bounds.len() - 1;
    let mut cursor = 0;

    for decoration in decorations.find(region.content_start(), region.content_end()) {
        let Decoration::Inline { from, to, span, .. } = decoration else {
            continue;
        };
        let start = from.saturating_sub(base).min(len).max(cursor);
        let end = to.saturating_sub(base).min(len);
        if start >= end {
            continue;
        }
        out.push_str(&region.text[bounds[cursor]..bounds[start]]);
        let piece = &region.text[bounds[start]..bounds[end]];
        match sgr(span) {
            Some(prefix) => {
                out.push_str(&prefix);
                out.push_str(piece);
                out.push_str(RESET);
            }
            None => out.push_str(piece),
        }
        cursor = end;
    }
    out.push_str(&region.text[bounds[cursor]..]);
    if !region.text.ends_with('\n') {
        out.push('\n');
    }
}

/// Every code block of `doc`, highlighted for a true-color terminal
pub fn render_ansi(doc: &Document, decorations: &DecorationSet) -> String {
    let mut out = String::new();
    for (i, region) in doc.code_regions().iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        render_region(&mut out, region, decorations);
    }
    out
}

/// The decoration set as pretty JSON: `{ "version", "decorations": [...] }`
pub fn render_json(decorations: &DecorationSet) -> Result<String, serde_json::Error> {
    let value = serde_json::json!({
        "version": decorations.version(),
        "decorations": decorations.decorations(),
    });
    serde_json::to_string_pretty(&value)
}

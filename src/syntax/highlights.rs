//! Highlight categories and styled spans
//!
//! Capture names from tree-sitter queries map onto a fixed list of
//! categories; themes assign styles to categories, and the tokenizer emits
//! spans carrying the resolved style.

use crate::theme::Color;

/// Standard tree-sitter capture names mapped to theme colors.
/// Index into this array is the HighlightId.
pub const HIGHLIGHT_NAMES: &[&str] = &[
    "attribute",             // @attribute
    "boolean",               // @boolean (true, false)
    "comment",               // @comment
    "constant",              // @constant
    "constant.builtin",      // @constant.builtin (null, nil)
    "constructor",           // @constructor (new Foo)
    "escape",                // @escape (string escapes)
    "function",              // @function
    "function.builtin",      // @function.builtin (echo, print)
    "function.macro",        // @function.macro (println!)
    "function.method",       // @function.method
    "keyword",               // @keyword
    "keyword.return",        // @keyword.return
    "keyword.function",      // @keyword.function (function, fn)
    "keyword.operator",      // @keyword.operator (and, or)
    "label",                 // @label (loop labels, goto targets)
    "module",                // @module (namespaces, crates)
    "number",                // @number
    "operator",              // @operator
    "property",              // @property
    "punctuation",           // @punctuation (general)
    "punctuation.bracket",   // @punctuation.bracket
    "punctuation.delimiter", // @punctuation.delimiter
    "punctuation.special",   // @punctuation.special
    "string",                // @string
    "string.special",        // @string.special (regex, heredoc)
    "tag",                   // @tag (XML/HTML tags)
    "tag.attribute",         // @tag.attribute
    "text",                  // @text (embedded plain text)
    "text.uri",              // @text.uri (URLs)
    "type",                  // @type
    "type.builtin",          // @type.builtin (int, string, bool)
    "variable",              // @variable
    "variable.builtin",      // @variable.builtin ($this, self)
    "variable.parameter",    // @variable.parameter
];

/// Index into HIGHLIGHT_NAMES
pub type HighlightId = u16;

/// Font style flags a theme can attach to a category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FontStyle {
    pub italic: bool,
    pub bold: bool,
    pub underline: bool,
}

impl FontStyle {
    /// Parse a space-separated list such as `"italic bold"`
    pub fn parse(s: &str) -> Result<Self, String> {
        let mut style = FontStyle::default();
        for word in s.split_whitespace() {
            match word {
                "italic" => style.italic = true,
                "bold" => style.bold = true,
                "underline" => style.underline = true,
                "normal" | "none" => {}
                other => return Err(format!("Unknown font style: {}", other)),
            }
        }
        Ok(style)
    }

    pub fn is_plain(&self) -> bool {
        !self.italic && !self.bold && !self.underline
    }
}

/// Visual attributes of one span
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SpanStyle {
    /// Category the span was captured as; `None` for uncaptured text
    pub highlight: Option<HighlightId>,
    pub color: Option<Color>,
    pub font_style: FontStyle,
}

impl SpanStyle {
    /// Style with no attributes at all
    pub const fn empty() -> Self {
        Self {
            highlight: None,
            color: None,
            font_style: FontStyle {
                italic: false,
                bold: false,
                underline: false,
            },
        }
    }

    /// Inline CSS for this style, or `None` when it carries nothing visual
    pub fn css(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(color) = self.color {
            parts.push(format!("color:{}", color.to_hex()));
        }
        if self.font_style.italic {
            parts.push("font-style:italic".to_string());
        }
        if self.font_style.bold {
            parts.push("font-weight:bold".to_string());
        }
        if self.font_style.underline {
            parts.push("text-decoration:underline".to_string());
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(";"))
        }
    }

    /// Category name, e.g. `"keyword"`
    pub fn highlight_name(&self) -> Option<&'static str> {
        self.highlight
            .and_then(|id| HIGHLIGHT_NAMES.get(id as usize).copied())
    }
}

/// A styled range of a code block's text, in character offsets
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StyledSpan {
    /// Start offset (inclusive)
    pub start: usize,
    /// End offset (exclusive), always greater than `start`
    pub end: usize,
    pub style: SpanStyle,
}

impl StyledSpan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Look up highlight ID by capture name
pub fn highlight_id_for_name(name: &str) -> Option<HighlightId> {
    // Handle hierarchical names: try exact match first, then progressively shorter
    // parents (e.g. "keyword.control.import" -> "keyword.control" -> "keyword").
    let mut current = name;
    loop {
        if let Some(pos) = HIGHLIGHT_NAMES.iter().position(|&n| n == current) {
            return Some(pos as HighlightId);
        }

        let Some(dot_pos) = current.rfind('.') else {
            break;
        };
        current = &current[..dot_pos];
    }

    None
}

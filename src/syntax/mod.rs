//! Syntax highlighting module
//!
//! Provides tree-sitter based highlighting for code block text:
//! - Language identification from attributes, aliases, and extensions
//! - Compiled grammars (language + highlight query)
//! - A pure tokenizer producing contiguous styled spans
//!
//! ## Architecture
//!
//! ```text
//! language attr → LanguageId::resolve → Grammar (cached)
//!              → tokenize(text, grammar, theme) → Vec<StyledSpan>
//! ```

mod grammar;
mod highlights;
mod languages;
mod tokenizer;

pub use grammar::Grammar;
pub use highlights::{
    highlight_id_for_name, FontStyle, HighlightId, SpanStyle, StyledSpan, HIGHLIGHT_NAMES,
};
pub use languages::{
    language_class, language_options, language_tag, LanguageId, LanguageInfo, LanguageOption,
    LANGUAGES,
};
pub use tokenizer::tokenize;

//! Compiled tree-sitter grammars
//!
//! A `Grammar` bundles a tree-sitter language with its compiled highlight
//! query. Building one compiles the query, which is the expensive part of
//! loading a language, so grammars are built once and shared through the
//! resource cache.

use tree_sitter::{Language, Query};

use super::highlights::{highlight_id_for_name, HighlightId};
use super::languages::LanguageId;

// Highlight queries shipped with the grammar crates
const RUST_HIGHLIGHTS: &str = tree_sitter_rust::HIGHLIGHTS_QUERY;
const JAVASCRIPT_HIGHLIGHTS: &str = tree_sitter_javascript::HIGHLIGHT_QUERY;
const TYPESCRIPT_HIGHLIGHTS: &str = tree_sitter_typescript::HIGHLIGHTS_QUERY;
const JSON_HIGHLIGHTS: &str = tree_sitter_json::HIGHLIGHTS_QUERY;
const PYTHON_HIGHLIGHTS: &str = tree_sitter_python::HIGHLIGHTS_QUERY;
const GO_HIGHLIGHTS: &str = tree_sitter_go::HIGHLIGHTS_QUERY;
const PHP_HIGHLIGHTS: &str = tree_sitter_php::HIGHLIGHTS_QUERY;
// Some crates use HIGHLIGHT_QUERY (singular)
const C_HIGHLIGHTS: &str = tree_sitter_c::HIGHLIGHT_QUERY;
const CPP_HIGHLIGHTS: &str = tree_sitter_cpp::HIGHLIGHT_QUERY;
const JAVA_HIGHLIGHTS: &str = tree_sitter_java::HIGHLIGHTS_QUERY;
const BASH_HIGHLIGHTS: &str = tree_sitter_bash::HIGHLIGHT_QUERY;
const SCHEME_HIGHLIGHTS: &str = tree_sitter_racket::HIGHLIGHTS_QUERY;
const INI_HIGHLIGHTS: &str = tree_sitter_ini::HIGHLIGHTS_QUERY;
const XML_HIGHLIGHTS: &str = tree_sitter_xml::XML_HIGHLIGHT_QUERY;

/// A language ready for tokenizing
pub struct Grammar {
    language: LanguageId,
    ts_language: Language,
    query: Query,
    /// Highlight category per query capture index
    capture_highlights: Vec<Option<HighlightId>>,
}

impl std::fmt::Debug for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("language", &self.language)
            .field("patterns", &self.query.pattern_count())
            .finish()
    }
}

impl Grammar {
    /// Build the grammar for a language. Plain text has no grammar.
    pub fn for_language(language: LanguageId) -> Result<Self, String> {
        let (ts_language, highlights): (Language, String) = match language {
            LanguageId::Rust => (tree_sitter_rust::LANGUAGE.into(), RUST_HIGHLIGHTS.into()),
            LanguageId::JavaScript => (
                tree_sitter_javascript::LANGUAGE.into(),
                JAVASCRIPT_HIGHLIGHTS.into(),
            ),
            // TypeScript extends the JavaScript query
            LanguageId::TypeScript => (
                tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
                format!("{}\n{}", TYPESCRIPT_HIGHLIGHTS, JAVASCRIPT_HIGHLIGHTS),
            ),
            LanguageId::Json => (tree_sitter_json::LANGUAGE.into(), JSON_HIGHLIGHTS.into()),
            LanguageId::Python => (tree_sitter_python::LANGUAGE.into(), PYTHON_HIGHLIGHTS.into()),
            LanguageId::Go => (tree_sitter_go::LANGUAGE.into(), GO_HIGHLIGHTS.into()),
            LanguageId::Php => (tree_sitter_php::LANGUAGE_PHP.into(), PHP_HIGHLIGHTS.into()),
            LanguageId::C => (tree_sitter_c::LANGUAGE.into(), C_HIGHLIGHTS.into()),
            LanguageId::Cpp => (tree_sitter_cpp::LANGUAGE.into(), CPP_HIGHLIGHTS.into()),
            LanguageId::Java => (tree_sitter_java::LANGUAGE.into(), JAVA_HIGHLIGHTS.into()),
            LanguageId::Bash => (tree_sitter_bash::LANGUAGE.into(), BASH_HIGHLIGHTS.into()),
            LanguageId::Scheme => (tree_sitter_racket::LANGUAGE.into(), SCHEME_HIGHLIGHTS.into()),
            LanguageId::Ini => (tree_sitter_ini::LANGUAGE.into(), INI_HIGHLIGHTS.into()),
            LanguageId::Xml => (tree_sitter_xml::LANGUAGE_XML.into(), XML_HIGHLIGHTS.into()),
            LanguageId::PlainText => {
                return Err("Plain text has no grammar".to_string());
            }
        };

        let query = Query::new(&ts_language, &highlights)
            .map_err(|e| format!("Failed to compile query for {:?}: {:?}", language, e))?;
        let capture_highlights = query
            .capture_names()
            .iter()
            .map(|name| highlight_id_for_name(name))
            .collect();

        Ok(Self {
            language,
            ts_language,
            query,
            capture_highlights,
        })
    }

    /// Build a grammar by cache identifier (canonical id or alias)
    pub fn by_id(id: &str) -> Result<Self, String> {
        let language = LanguageId::resolve(id).ok_or_else(|| format!("Unknown language: {}", id))?;
        Self::for_language(language)
    }

    pub fn language(&self) -> LanguageId {
        self.language
    }

    /// Canonical identifier, also the cache key
    pub fn id(&self) -> &'static str {
        self.language.id()
    }

    pub(crate) fn ts_language(&self) -> &Language {
        &self.ts_language
    }

    pub(crate) fn query(&self) -> &Query {
        &self.query
    }

    /// Highlight category for a capture, `None` for captures themes ignore
    pub(crate) fn capture_highlight(&self, capture_index: u32) -> Option<HighlightId> {
        self.capture_highlights
            .get(capture_index as usize)
            .copied()
            .flatten()
    }
}

//! Full decoration computation
//!
//! Walks every code block, picks the grammar and theme to use from what
//! the cache already holds (never waiting for a load), tokenizes, and
//! emits decorations in absolute positions.

use std::sync::Arc;

use super::{Decoration, DecorationAttrs, DecorationSet};
use crate::config::HighlightConfig;
use crate::model::{CodeRegion, Document};
use crate::resources::{ResourceCache, ResourceKind};
use crate::syntax::{language_tag, tokenize, Grammar, LanguageId};
use crate::theme::Theme;

/// The part of the configuration the computer needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeOptions {
    pub default_theme: String,
    pub default_language: String,
    /// Class put on every code block container
    pub node_class: String,
}

impl Default for ComputeOptions {
    fn default() -> Self {
        Self::from(&HighlightConfig::default())
    }
}

impl From<&HighlightConfig> for ComputeOptions {
    fn from(config: &HighlightConfig) -> Self {
        Self {
            default_theme: config.default_theme.clone(),
            default_language: config.default_language.clone(),
            node_class: config.node_class.clone(),
        }
    }
}

/// Decorations for every code block of `doc`
pub fn compute(doc: &Document, cache: &ResourceCache, options: &ComputeOptions) -> DecorationSet {
    let mut decorations = Vec::new();
    for region in doc.code_regions() {
        let grammar = resolve_grammar(region.language, cache, options);
        let theme = resolve_theme(region.theme, cache, options);
        tracing::trace!(
            "Region {} at {}: grammar={:?} theme={}",
            region.index,
            region.start,
            grammar.as_ref().map(|g| g.id()),
            theme.id
        );
        decorations.extend(region_decorations(&region, grammar.as_deref(), &theme, options));
    }
    DecorationSet::new(doc.version(), decorations)
}

/// Grammar to tokenize with, `None` meaning plain text.
///
/// Blocks without a language use the default language once it is loaded.
/// A block naming a language that is unknown or not loaded yet renders as
/// plain text rather than borrowing another language's grammar.
pub fn resolve_grammar(
    attr: Option<&str>,
    cache: &ResourceCache,
    options: &ComputeOptions,
) -> Option<Arc<Grammar>> {
    let loaded = |name: &str| {
        LanguageId::resolve(name)
            .filter(LanguageId::has_highlighting)
            .and_then(|lang| cache.grammar(lang.id()))
    };
    match attr.map(str::trim).filter(|a| !a.is_empty()) {
        Some(name) => loaded(name),
        None => loaded(&options.default_language),
    }
}

/// Theme to color with: the block's theme if loaded, else the default
/// theme if loaded, else the first loaded theme, else the plain theme
pub fn resolve_theme(attr: Option<&str>, cache: &ResourceCache, options: &ComputeOptions) -> Arc<Theme> {
    attr.map(str::trim)
        .filter(|id| !id.is_empty())
        .and_then(|id| cache.theme(id))
        .or_else(|| cache.theme(&options.default_theme))
        .or_else(|| {
            cache
                .loaded_identifiers(ResourceKind::Theme)
                .first()
                .and_then(|id| cache.theme(id))
        })
        .unwrap_or_else(|| Arc::new(Theme::plain()))
}

/// One node decoration plus one inline decoration per span
pub fn region_decorations(
    region: &CodeRegion<'_>,
    grammar: Option<&Grammar>,
    theme: &Theme,
    options: &ComputeOptions,
) -> Vec<Decoration> {
    let data_language = language_tag(region.language).to_string();

    let mut decorations = vec![Decoration::Node {
        from: region.start,
        to: region.end,
        attrs: DecorationAttrs {
            class: Some(format!("{} {}", options.node_class, theme.id)),
            style: theme.container_css(),
            data_language: Some(data_language),
        },
    }];

    let offset = region.content_start();
    decorations.extend(tokenize(region.text, grammar, theme).into_iter().map(|span| {
        Decoration::Inline {
            from: offset + span.start,
            to: offset + span.end,
            attrs: DecorationAttrs {
                class: None,
                style: span.style.css(),
                data_language: None,
            },
            span: span.style,
        }
    }));
    decorations
}

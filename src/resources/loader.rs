//! Resource loading hook

use std::sync::Arc;

use anyhow::{anyhow, bail, Context};

use super::{ResourceKey, ResourceKind};
use crate::syntax::{Grammar, LanguageId};
use crate::theme::{self, Theme};

/// A loaded grammar or theme
#[derive(Debug, Clone)]
pub enum Resource {
    Grammar(Arc<Grammar>),
    Theme(Arc<Theme>),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Grammar(_) => ResourceKind::Grammar,
            Resource::Theme(_) => ResourceKind::Theme,
        }
    }
}

/// Produces resource payloads for the cache.
///
/// `load` runs on a blocking worker thread and may take arbitrarily long.
pub trait ResourceLoader: Send + Sync + 'static {
    /// Whether `key` names something this loader can produce.
    /// Keys it does not know are never requested.
    fn knows(&self, key: &ResourceKey) -> bool;

    fn load(&self, key: &ResourceKey) -> anyhow::Result<Resource>;
}

/// Compiles the bundled tree-sitter grammars and reads themes from the
/// user themes directory, then the embedded builtins
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLoader;

impl ResourceLoader for BuiltinLoader {
    fn knows(&self, key: &ResourceKey) -> bool {
        match key.kind {
            ResourceKind::Grammar => {
                LanguageId::resolve(&key.id).is_some_and(|lang| lang.has_highlighting())
            }
            ResourceKind::Theme => theme::theme_exists(&key.id),
        }
    }

    fn load(&self, key: &ResourceKey) -> anyhow::Result<Resource> {
        match key.kind {
            ResourceKind::Grammar => {
                let language = LanguageId::resolve(&key.id)
                    .ok_or_else(|| anyhow!("Unknown language: {}", key.id))?;
                if !language.has_highlighting() {
                    bail!("{} has no grammar", key.id);
                }
                let grammar = Grammar::for_language(language)
                    .map_err(anyhow::Error::msg)
                    .with_context(|| format!("loading grammar {}", key.id))?;
                Ok(Resource::Grammar(Arc::new(grammar)))
            }
            ResourceKind::Theme => {
                let theme = theme::load_theme(&key.id)
                    .map_err(anyhow::Error::msg)
                    .with_context(|| format!("loading theme {}", key.id))?;
                Ok(Resource::Theme(Arc::new(theme)))
            }
        }
    }
}

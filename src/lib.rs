//! Code block highlighting for rich-text documents
//!
//! This crate keeps syntax-highlight decorations for the code blocks of a
//! block-structured document up to date across edits, remapping them
//! through cheap edits and recomputing them when token structure may have
//! changed, while grammars and themes load in the background.

pub mod cli;
pub mod commands;
pub mod config;
pub mod config_paths;
pub mod decoration;
pub mod engine;
pub mod messages;
pub mod model;
pub mod render;
pub mod resources;
pub mod syntax;
pub mod theme;
pub mod tracing;

// Re-export commonly used types
pub use config::HighlightConfig;
pub use decoration::{Decoration, DecorationAttrs, DecorationSet};
pub use engine::HighlightEngine;
pub use messages::Msg;
pub use model::{Document, Node, Selection, Transaction};
pub use resources::{ResourceCache, ResourceKey, ResourceLoader};
pub use theme::Theme;

//! Commands for the code block attribute UI
//!
//! Each command builds a transaction for the host to apply. Attribute
//! changes always carry the force flag, so the engine recomputes instead
//! of remapping.

use std::sync::Arc;

use crate::model::{Document, Node, NodeAttr, Selection, Transaction, TransformError};

/// Normalize an attribute value: trimmed, empty means unset
fn attr_value(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Set (or clear) the language of the code block starting at `pos`
pub fn set_language(
    doc: Arc<Document>,
    selection: Selection,
    pos: usize,
    language: Option<&str>,
) -> Result<Transaction, TransformError> {
    Ok(Transaction::builder(doc, selection)
        .set_node_attribute(pos, NodeAttr::Language, attr_value(language))?
        .build())
}

/// Set (or clear) the theme of the code block starting at `pos`
pub fn set_theme(
    doc: Arc<Document>,
    selection: Selection,
    pos: usize,
    theme: Option<&str>,
) -> Result<Transaction, TransformError> {
    Ok(Transaction::builder(doc, selection)
        .set_node_attribute(pos, NodeAttr::Theme, attr_value(theme))?
        .build())
}

/// Insert a new code block at the block boundary `pos` and put the cursor
/// inside it
pub fn insert_code_block(
    doc: Arc<Document>,
    selection: Selection,
    pos: usize,
    language: Option<&str>,
    text: &str,
) -> Result<Transaction, TransformError> {
    let node = Node::code_block(attr_value(language).as_deref(), text);
    let builder = Transaction::builder(doc, selection).insert_node(pos, node)?;
    Ok(builder.set_selection(Selection::cursor(pos + 1)).build())
}

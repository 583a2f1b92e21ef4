//! Document snapshots
//!
//! A `Document` is immutable once built. Every new snapshot gets a fresh,
//! process-wide increasing version so decoration sets can be tied to the
//! exact snapshot they were computed against.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::node::{CodeBlockAttrs, Node, NodeAttr, NodeKind};
use super::transaction::TransformError;

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

fn next_version() -> u64 {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// A code block discovered in a document, in absolute positions.
/// Borrows attributes and text from the snapshot it was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeRegion<'a> {
    /// Document-order index among code blocks
    pub index: usize,
    /// Position of the node's opening token
    pub start: usize,
    /// Position just past the node's closing token
    pub end: usize,
    pub language: Option<&'a str>,
    pub theme: Option<&'a str>,
    pub text: &'a str,
}

impl CodeRegion<'_> {
    /// First position inside the node (where its text begins)
    pub fn content_start(&self) -> usize {
        self.start + 1
    }

    /// Position right after the last character of the text
    pub fn content_end(&self) -> usize {
        self.end - 1
    }

    /// Whether `pos` is a cursor position inside this block's text
    pub fn contains_cursor(&self, pos: usize) -> bool {
        pos >= self.content_start() && pos <= self.content_end()
    }

    /// Whether the range `from..to` touches this block's text
    pub fn touches(&self, from: usize, to: usize) -> bool {
        from <= self.content_end() && to >= self.content_start()
    }

    pub fn char_len(&self) -> usize {
        self.content_end() - self.content_start()
    }
}

/// Cursor/selection, as positions in a specific document snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// Collapsed selection at `pos`
    pub fn cursor(pos: usize) -> Self {
        Self {
            anchor: pos,
            head: pos,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.anchor == self.head
    }
}

/// Immutable document snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    content: Vec<Node>,
    #[serde(skip, default = "next_version")]
    version: u64,
}

impl PartialEq for Document {
    /// Content equality; versions are not compared
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Document {
    /// Create a new snapshot with a fresh version
    pub fn new(content: Vec<Node>) -> Self {
        Self {
            content,
            version: next_version(),
        }
    }

    /// Parse a document from `{"content": [...]}` JSON
    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Invalid document JSON: {}", e))
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("Failed to serialize: {}", e))
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn content(&self) -> &[Node] {
        &self.content
    }

    /// Number of positions inside the document (`0..=content_size` are valid)
    pub fn content_size(&self) -> usize {
        self.content.iter().map(Node::size).sum()
    }

    /// Visit every node in document order with its absolute start position.
    /// Returning `false` from the callback skips that node's children.
    pub fn descendants<'a, F>(&'a self, mut f: F)
    where
        F: FnMut(&'a Node, usize) -> bool,
    {
        fn walk<'a, F: FnMut(&'a Node, usize) -> bool>(nodes: &'a [Node], base: usize, f: &mut F) {
            let mut pos = base;
            for node in nodes {
                if f(node, pos) && node.is_container() {
                    walk(node.children(), pos + 1, f);
                }
                pos += node.size();
            }
        }
        walk(&self.content, 0, &mut f);
    }

    /// Find nodes matching a predicate, with their positions
    pub fn find_nodes<P>(&self, predicate: P) -> Vec<(usize, &Node)>
    where
        P: Fn(&Node) -> bool,
    {
        let mut found = Vec::new();
        fn walk<'a, P: Fn(&Node) -> bool>(
            nodes: &'a [Node],
            base: usize,
            predicate: &P,
            found: &mut Vec<(usize, &'a Node)>,
        ) {
            let mut pos = base;
            for node in nodes {
                if predicate(node) {
                    found.push((pos, node));
                }
                if node.is_container() {
                    walk(node.children(), pos + 1, predicate, found);
                }
                pos += node.size();
            }
        }
        walk(&self.content, 0, &predicate, &mut found);
        found
    }

    /// All code blocks in document order
    pub fn code_regions(&self) -> Vec<CodeRegion<'_>> {
        self.find_nodes(|node| node.kind() == NodeKind::CodeBlock)
            .into_iter()
            .enumerate()
            .filter_map(|(index, (start, node))| {
                let attrs = node.code_attrs()?;
                Some(CodeRegion {
                    index,
                    start,
                    end: start + node.size(),
                    language: attrs.language.as_deref(),
                    theme: attrs.theme.as_deref(),
                    text: node.text().unwrap_or_default(),
                })
            })
            .collect()
    }

    pub fn code_region_count(&self) -> usize {
        self.find_nodes(|node| node.kind() == NodeKind::CodeBlock).len()
    }

    /// Index of the code block whose text contains the cursor position
    pub fn code_region_at(&self, pos: usize) -> Option<usize> {
        let mut index = 0;
        let mut found = None;
        self.descendants(|node, start| {
            if found.is_some() || start > pos {
                return false;
            }
            if node.kind() == NodeKind::CodeBlock {
                if pos > start && pos < start + node.size() {
                    found = Some(index);
                }
                index += 1;
                return false;
            }
            true
        });
        found
    }

    /// The node starting exactly at `pos`
    pub fn node_at(&self, pos: usize) -> Option<&Node> {
        let mut found = None;
        self.descendants(|node, start| {
            if found.is_some() {
                return false;
            }
            if start == pos {
                found = Some(node);
                return false;
            }
            start < pos && pos < start + node.size()
        });
        found
    }

    // ------------------------------------------------------------------
    // Step application (used by `TransactionBuilder`)
    // ------------------------------------------------------------------

    pub(crate) fn replace_text(&self, from: usize, to: usize, text: &str) -> Result<Self, TransformError> {
        if from > to || to > self.content_size() {
            return Err(TransformError::OutOfRange { pos: to, size: self.content_size() });
        }
        let mut content = self.content.clone();
        replace_in(&mut content, 0, from, to, text)?;
        Ok(Self::new(content))
    }

    pub(crate) fn insert_node(&self, pos: usize, node: Node) -> Result<Self, TransformError> {
        let mut content = self.content.clone();
        insert_in(&mut content, 0, pos, node)?;
        Ok(Self::new(content))
    }

    /// Returns the new document and the size of the removed node
    pub(crate) fn delete_node(&self, pos: usize) -> Result<(Self, usize), TransformError> {
        let mut content = self.content.clone();
        let removed = delete_in(&mut content, 0, pos)?;
        Ok((Self::new(content), removed.size()))
    }

    pub(crate) fn set_node_attribute(
        &self,
        pos: usize,
        attr: NodeAttr,
        value: Option<String>,
    ) -> Result<Self, TransformError> {
        let mut content = self.content.clone();
        let node = node_at_mut(&mut content, 0, pos).ok_or(TransformError::NoNodeAt(pos))?;
        let attrs: &mut CodeBlockAttrs = node
            .code_attrs_mut()
            .ok_or(TransformError::NotACodeBlock(pos))?;
        match attr {
            NodeAttr::Language => attrs.language = value,
            NodeAttr::Theme => attrs.theme = value,
        }
        Ok(Self::new(content))
    }
}

fn replace_in(
    nodes: &mut [Node],
    base: usize,
    from: usize,
    to: usize,
    text: &str,
) -> Result<(), TransformError> {
    let mut pos = base;
    for node in nodes.iter_mut() {
        let size = node.size();
        let (start, end) = (pos, pos + size);
        if from > start && to < end {
            if let Some(existing) = node.text_mut() {
                let local_from = from - start - 1;
                let local_to = to - start - 1;
                let byte_from = char_to_byte(existing, local_from);
                let byte_to = char_to_byte(existing, local_to);
                existing.replace_range(byte_from..byte_to, text);
                return Ok(());
            }
            if let Some(children) = node.children_mut() {
                return replace_in(children, start + 1, from, to, text);
            }
        }
        pos = end;
    }
    Err(TransformError::NotInTextblock { from, to })
}

fn insert_in(nodes: &mut Vec<Node>, base: usize, at: usize, node: Node) -> Result<(), TransformError> {
    let mut pos = base;
    for index in 0..=nodes.len() {
        if pos == at {
            nodes.insert(index, node);
            return Ok(());
        }
        let Some(child) = nodes.get_mut(index) else {
            break;
        };
        let size = child.size();
        if at > pos && at < pos + size {
            if let Some(children) = child.children_mut() {
                return insert_in(children, pos + 1, at, node);
            }
            return Err(TransformError::NotABlockBoundary(at));
        }
        pos += size;
    }
    Err(TransformError::NotABlockBoundary(at))
}

fn delete_in(nodes: &mut Vec<Node>, base: usize, at: usize) -> Result<Node, TransformError> {
    let mut pos = base;
    for index in 0..nodes.len() {
        if pos == at {
            return Ok(nodes.remove(index));
        }
        let size = nodes[index].size();
        if at > pos && at < pos + size {
            if let Some(children) = nodes[index].children_mut() {
                return delete_in(children, pos + 1, at);
            }
            break;
        }
        pos += size;
    }
    Err(TransformError::NoNodeAt(at))
}

fn node_at_mut(nodes: &mut [Node], base: usize, at: usize) -> Option<&mut Node> {
    let mut pos = base;
    for node in nodes.iter_mut() {
        let size = node.size();
        if pos == at {
            return Some(node);
        }
        if at > pos && at < pos + size {
            return node
                .children_mut()
                .and_then(|children| node_at_mut(children, pos + 1, at));
        }
        pos += size;
    }
    None
}

/// Byte offset of the `char_idx`-th character (clamped to the string end)
pub(crate) fn char_to_byte(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

//! Document nodes
//!
//! A small tagged-variant tree with ProseMirror-style sizes:
//! - textblocks (paragraph, heading, code block) occupy `chars + 2`
//! - containers (blockquote) occupy `content + 2`
//! - atoms (horizontal rule) occupy `1`

use serde::{Deserialize, Serialize};

/// Attributes carried by a code block node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlockAttrs {
    /// Language identifier as written by the user (may be an alias or unknown)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Theme identifier override for this block
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

/// Attribute names that can be written through `Step::SetNodeAttribute`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeAttr {
    Language,
    Theme,
}

/// Node kind, used by visitors that only care about capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Paragraph,
    Heading,
    CodeBlock,
    Blockquote,
    HorizontalRule,
}

/// A block-level document node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Paragraph {
        #[serde(default)]
        text: String,
    },
    Heading {
        #[serde(default = "default_heading_level")]
        level: u8,
        #[serde(default)]
        text: String,
    },
    CodeBlock {
        #[serde(default)]
        attrs: CodeBlockAttrs,
        #[serde(default)]
        text: String,
    },
    Blockquote {
        #[serde(default)]
        content: Vec<Node>,
    },
    HorizontalRule,
}

fn default_heading_level() -> u8 {
    1
}

impl Node {
    pub fn paragraph(text: &str) -> Self {
        Node::Paragraph {
            text: text.to_string(),
        }
    }

    pub fn heading(level: u8, text: &str) -> Self {
        Node::Heading {
            level,
            text: text.to_string(),
        }
    }

    /// Create a code block with an optional language attribute
    pub fn code_block(language: Option<&str>, text: &str) -> Self {
        Node::CodeBlock {
            attrs: CodeBlockAttrs {
                language: language.map(str::to_string),
                theme: None,
            },
            text: text.to_string(),
        }
    }

    pub fn blockquote(content: Vec<Node>) -> Self {
        Node::Blockquote { content }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Paragraph { .. } => NodeKind::Paragraph,
            Node::Heading { .. } => NodeKind::Heading,
            Node::CodeBlock { .. } => NodeKind::CodeBlock,
            Node::Blockquote { .. } => NodeKind::Blockquote,
            Node::HorizontalRule => NodeKind::HorizontalRule,
        }
    }

    /// Number of positions this node occupies in its parent
    pub fn size(&self) -> usize {
        match self {
            Node::Paragraph { text } | Node::Heading { text, .. } | Node::CodeBlock { text, .. } => {
                text.chars().count() + 2
            }
            Node::Blockquote { content } => content.iter().map(Node::size).sum::<usize>() + 2,
            Node::HorizontalRule => 1,
        }
    }

    /// Text content for textblocks, `None` for containers and atoms
    pub fn text(&self) -> Option<&str> {
        match self {
            Node::Paragraph { text } | Node::Heading { text, .. } | Node::CodeBlock { text, .. } => {
                Some(text)
            }
            Node::Blockquote { .. } | Node::HorizontalRule => None,
        }
    }

    pub(crate) fn text_mut(&mut self) -> Option<&mut String> {
        match self {
            Node::Paragraph { text } | Node::Heading { text, .. } | Node::CodeBlock { text, .. } => {
                Some(text)
            }
            Node::Blockquote { .. } | Node::HorizontalRule => None,
        }
    }

    /// Child nodes for containers
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Blockquote { content } => content,
            _ => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Blockquote { content } => Some(content),
            _ => None,
        }
    }

    pub fn code_attrs(&self) -> Option<&CodeBlockAttrs> {
        match self {
            Node::CodeBlock { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    pub(crate) fn code_attrs_mut(&mut self) -> Option<&mut CodeBlockAttrs> {
        match self {
            Node::CodeBlock { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    pub fn is_textblock(&self) -> bool {
        self.text().is_some()
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Node::Blockquote { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_sizes() {
        assert_eq!(Node::paragraph("").size(), 2);
        assert_eq!(Node::paragraph("abc").size(), 5);
        assert_eq!(Node::code_block(Some("rust"), "fn").size(), 4);
        assert_eq!(Node::HorizontalRule.size(), 1);
        let quote = Node::blockquote(vec![Node::paragraph("ab"), Node::HorizontalRule]);
        assert_eq!(quote.size(), 4 + 1 + 2);
    }

    #[test]
    fn test_size_counts_chars_not_bytes() {
        assert_eq!(Node::code_block(None, "héllo").size(), 7);
    }

    #[test]
    fn test_node_json_shape() {
        let json = r#"{"type":"code_block","attrs":{"language":"js"},"text":"let x=1"}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node, Node::code_block(Some("js"), "let x=1"));
        assert_eq!(node.kind(), NodeKind::CodeBlock);
    }
}

//! Decorations: styled spans in absolute document positions
//!
//! A `DecorationSet` is an immutable snapshot tied to the document version
//! it was computed (or remapped) for. Cloning is cheap.

mod compute;

use std::sync::Arc;

use serde::Serialize;

pub use compute::{compute, region_decorations, resolve_grammar, resolve_theme, ComputeOptions};

use crate::model::{Assoc, Document, Mapping};
use crate::syntax::SpanStyle;

/// Renderer-facing attributes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecorationAttrs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(rename = "data-language", skip_serializing_if = "Option::is_none")]
    pub data_language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decoration {
    /// Styles the characters `from..to`
    Inline {
        from: usize,
        to: usize,
        attrs: DecorationAttrs,
        #[serde(skip)]
        span: SpanStyle,
    },
    /// Whole-region presentation for the node spanning `from..to`
    Node {
        from: usize,
        to: usize,
        attrs: DecorationAttrs,
    },
}

impl Decoration {
    pub fn from(&self) -> usize {
        match self {
            Decoration::Inline { from, .. } | Decoration::Node { from, .. } => *from,
        }
    }

    pub fn to(&self) -> usize {
        match self {
            Decoration::Inline { to, .. } | Decoration::Node { to, .. } => *to,
        }
    }

    pub fn attrs(&self) -> &DecorationAttrs {
        match self {
            Decoration::Inline { attrs, .. } | Decoration::Node { attrs, .. } => attrs,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Decoration::Inline { .. })
    }

    /// Carry this decoration through `mapping`. `Ok(None)` means it was
    /// collapsed or deleted by the edit.
    fn map(&self, mapping: &Mapping, size: usize) -> Result<Option<Decoration>, RemapError> {
        let check = |pos: usize| {
            if pos > size {
                Err(RemapError::OutOfRange { pos, size })
            } else {
                Ok(pos)
            }
        };
        match self {
            Decoration::Inline {
                from,
                to,
                attrs,
                span,
            } => {
                // Text inserted at either edge stays outside the span
                let from = check(mapping.map(*from, Assoc::After))?;
                let to = check(mapping.map(*to, Assoc::Before))?;
                if from >= to {
                    return Ok(None);
                }
                Ok(Some(Decoration::Inline {
                    from,
                    to,
                    attrs: attrs.clone(),
                    span: *span,
                }))
            }
            Decoration::Node { from, to, attrs } => {
                let start = mapping.map_result(*from, Assoc::After);
                let end = mapping.map_result(*to, Assoc::Before);
                let from = check(start.pos)?;
                let to = check(end.pos)?;
                if (start.deleted && end.deleted) || from >= to {
                    return Ok(None);
                }
                Ok(Some(Decoration::Node {
                    from,
                    to,
                    attrs: attrs.clone(),
                }))
            }
        }
    }
}

/// A remap produced positions the target document cannot hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemapError {
    OutOfRange { pos: usize, size: usize },
}

impl std::fmt::Display for RemapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { pos, size } if *pos == usize::MAX => {
                write!(f, "mapped position underflowed (document size {})", size)
            }
            Self::OutOfRange { pos, size } => {
                write!(f, "mapped position {} outside document of size {}", pos, size)
            }
        }
    }
}

impl std::error::Error for RemapError {}

/// Sorted decorations for one document version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationSet {
    version: u64,
    decorations: Arc<[Decoration]>,
}

impl Default for DecorationSet {
    fn default() -> Self {
        Self::empty(0)
    }
}

impl DecorationSet {
    /// Build a set, sorting by start position (stable, so a region's node
    /// decoration stays ahead of its inline ones)
    pub fn new(version: u64, mut decorations: Vec<Decoration>) -> Self {
        decorations.sort_by_key(Decoration::from);
        Self {
            version,
            decorations: decorations.into(),
        }
    }

    pub fn empty(version: u64) -> Self {
        Self {
            version,
            decorations: Arc::from(Vec::new()),
        }
    }

    /// Version of the document these positions are valid in
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Decoration> {
        self.decorations.iter()
    }

    pub fn inline(&self) -> impl Iterator<Item = &Decoration> {
        self.decorations.iter().filter(|d| d.is_inline())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Decoration> {
        self.decorations.iter().filter(|d| !d.is_inline())
    }

    /// Decorations overlapping `from..to`
    pub fn find(&self, from: usize, to: usize) -> impl Iterator<Item = &Decoration> {
        self.decorations
            .iter()
            .filter(move |d| d.from() < to && d.to() > from)
    }

    /// Whether both sets hold the same decorations, whatever their versions
    pub fn same_decorations(&self, other: &DecorationSet) -> bool {
        self.decorations == other.decorations
    }

    /// Translate every decoration through `mapping` into `new_doc`.
    ///
    /// Fails when any mapped position falls outside `new_doc`; callers
    /// recompute instead of rendering such a set.
    pub fn remap(&self, mapping: &Mapping, new_doc: &Document) -> Result<DecorationSet, RemapError> {
        let size = new_doc.content_size();
        let mut decorations = Vec::with_capacity(self.decorations.len());
        for decoration in self.decorations.iter() {
            if let Some(mapped) = decoration.map(mapping, size)? {
                decorations.push(mapped);
            }
        }
        Ok(DecorationSet::new(new_doc.version(), decorations))
    }
}

impl<'a> IntoIterator for &'a DecorationSet {
    type Item = &'a Decoration;
    type IntoIter = std::slice::Iter<'a, Decoration>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

//! Transactions: ordered steps plus the position map they induce
//!
//! Steps are expressed in the coordinates of the document they apply to
//! (the result of the previous step), the same way ProseMirror does it.

use std::ops::Range;
use std::sync::Arc;

use super::document::{Document, Selection};
use super::node::{Node, NodeAttr};
use super::transform::{Assoc, Mapping, StepMap};

/// Errors raised when a step cannot be applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// Position beyond the document content
    OutOfRange { pos: usize, size: usize },
    /// Text replacement that does not stay inside one textblock
    NotInTextblock { from: usize, to: usize },
    /// Node insertion at a position that is not between blocks
    NotABlockBoundary(usize),
    /// No node starts at the given position
    NoNodeAt(usize),
    /// Attribute change on a node that is not a code block
    NotACodeBlock(usize),
}

impl std::fmt::Display for TransformError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange { pos, size } => {
                write!(f, "position {} outside document of size {}", pos, size)
            }
            Self::NotInTextblock { from, to } => {
                write!(f, "range {}..{} does not lie inside a single textblock", from, to)
            }
            Self::NotABlockBoundary(pos) => write!(f, "position {} is not a block boundary", pos),
            Self::NoNodeAt(pos) => write!(f, "no node starts at position {}", pos),
            Self::NotACodeBlock(pos) => write!(f, "node at {} is not a code block", pos),
        }
    }
}

impl std::error::Error for TransformError {}

/// An elementary document change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Replace `from..to` inside a single textblock with `text`
    Replace { from: usize, to: usize, text: String },
    /// Insert a block node at a block boundary
    InsertNode { pos: usize, node: Node },
    /// Remove the node starting at `pos`
    DeleteNode { pos: usize },
    /// Write a code block attribute
    SetNodeAttribute {
        pos: usize,
        attr: NodeAttr,
        value: Option<String>,
    },
}

impl Step {
    /// Whether this step adds or removes nodes
    pub fn is_structural(&self) -> bool {
        matches!(self, Step::InsertNode { .. } | Step::DeleteNode { .. })
    }
}

/// A document change from one snapshot to the next
#[derive(Debug, Clone)]
pub struct Transaction {
    before: Arc<Document>,
    after: Arc<Document>,
    steps: Vec<Step>,
    mapping: Mapping,
    selection_before: Selection,
    selection_after: Selection,
    force_recompute: bool,
}

impl Transaction {
    /// Start building a transaction against `doc`
    pub fn builder(doc: Arc<Document>, selection: Selection) -> TransactionBuilder {
        TransactionBuilder::new(doc, selection)
    }

    /// Selection-only change: the document is untouched
    pub fn select(doc: Arc<Document>, before: Selection, after: Selection) -> Self {
        Self {
            after: Arc::clone(&doc),
            before: doc,
            steps: Vec::new(),
            mapping: Mapping::new(),
            selection_before: before,
            selection_after: after,
            force_recompute: false,
        }
    }

    /// Assemble a transaction from host-provided parts.
    ///
    /// `mapping` must hold one step map per step; nothing here validates that
    /// the map actually describes `before → after`.
    pub fn from_parts(
        before: Arc<Document>,
        after: Arc<Document>,
        steps: Vec<Step>,
        mapping: Mapping,
        selection_before: Selection,
        selection_after: Selection,
    ) -> Self {
        Self {
            before,
            after,
            steps,
            mapping,
            selection_before,
            selection_after,
            force_recompute: false,
        }
    }

    pub fn before(&self) -> &Arc<Document> {
        &self.before
    }

    pub fn after(&self) -> &Arc<Document> {
        &self.after
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn selection_before(&self) -> Selection {
        self.selection_before
    }

    pub fn selection_after(&self) -> Selection {
        self.selection_after
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    /// Whether any step inserted or removed nodes
    pub fn structure_changed(&self) -> bool {
        self.steps.iter().any(Step::is_structural)
    }

    pub fn is_forced(&self) -> bool {
        self.force_recompute
    }

    /// Ask consumers to recompute everything derived from this transaction
    pub fn force_recompute(mut self) -> Self {
        self.force_recompute = true;
        self
    }

    /// Whether a step wrote the given attribute
    pub fn sets_attribute(&self, attr: NodeAttr) -> bool {
        self.steps
            .iter()
            .any(|step| matches!(step, Step::SetNodeAttribute { attr: a, .. } if *a == attr))
    }

    /// Ranges touched by each step, in the coordinates of `before()`
    pub fn changed_ranges(&self) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        for (index, map) in self.mapping.maps().iter().enumerate() {
            for range in map.ranges() {
                let from = self.mapping.map_back_from(index, range.start, Assoc::Before);
                let to = self
                    .mapping
                    .map_back_from(index, range.old_end(), Assoc::After);
                ranges.push(from..to.max(from));
            }
        }
        for step in &self.steps {
            if let Step::SetNodeAttribute { pos, .. } = step {
                ranges.push(*pos..*pos);
            }
        }
        ranges
    }
}

/// Applies steps one by one, tracking the mapping and the selection
pub struct TransactionBuilder {
    before: Arc<Document>,
    current: Arc<Document>,
    steps: Vec<Step>,
    mapping: Mapping,
    selection_before: Selection,
    selection: Selection,
    force_recompute: bool,
}

impl TransactionBuilder {
    pub fn new(doc: Arc<Document>, selection: Selection) -> Self {
        Self {
            current: Arc::clone(&doc),
            before: doc,
            steps: Vec::new(),
            mapping: Mapping::new(),
            selection_before: selection,
            selection,
            force_recompute: false,
        }
    }

    /// The document as it stands after the steps applied so far
    pub fn doc(&self) -> &Document {
        &self.current
    }

    pub fn step(mut self, step: Step) -> Result<Self, TransformError> {
        let (next, map) = match &step {
            Step::Replace { from, to, text } => {
                let next = self.current.replace_text(*from, *to, text)?;
                (next, StepMap::single(*from, to - from, text.chars().count()))
            }
            Step::InsertNode { pos, node } => {
                let next = self.current.insert_node(*pos, node.clone())?;
                (next, StepMap::single(*pos, 0, node.size()))
            }
            Step::DeleteNode { pos } => {
                let (next, removed) = self.current.delete_node(*pos)?;
                (next, StepMap::single(*pos, removed, 0))
            }
            Step::SetNodeAttribute { pos, attr, value } => {
                let next = self.current.set_node_attribute(*pos, *attr, value.clone())?;
                // Attribute writes always invalidate derived presentation
                self.force_recompute = true;
                (next, StepMap::empty())
            }
        };
        self.selection = Selection::new(
            map.map(self.selection.anchor, Assoc::After),
            map.map(self.selection.head, Assoc::After),
        );
        self.current = Arc::new(next);
        self.mapping.push(map);
        self.steps.push(step);
        Ok(self)
    }

    pub fn insert_text(self, pos: usize, text: &str) -> Result<Self, TransformError> {
        self.step(Step::Replace {
            from: pos,
            to: pos,
            text: text.to_string(),
        })
    }

    pub fn delete(self, from: usize, to: usize) -> Result<Self, TransformError> {
        self.step(Step::Replace {
            from,
            to,
            text: String::new(),
        })
    }

    pub fn insert_node(self, pos: usize, node: Node) -> Result<Self, TransformError> {
        self.step(Step::InsertNode { pos, node })
    }

    pub fn delete_node(self, pos: usize) -> Result<Self, TransformError> {
        self.step(Step::DeleteNode { pos })
    }

    pub fn set_node_attribute(
        self,
        pos: usize,
        attr: NodeAttr,
        value: Option<String>,
    ) -> Result<Self, TransformError> {
        self.step(Step::SetNodeAttribute { pos, attr, value })
    }

    /// Override the resulting selection (in the coordinates of the new document)
    pub fn set_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn force_recompute(mut self) -> Self {
        self.force_recompute = true;
        self
    }

    pub fn build(self) -> Transaction {
        Transaction {
            before: self.before,
            after: self.current,
            steps: self.steps,
            mapping: self.mapping,
            selection_before: self.selection_before,
            selection_after: self.selection,
            force_recompute: self.force_recompute,
        }
    }
}

//! Host document model
//!
//! The minimal document/transaction model the highlighting engine reads:
//! a block tree with integer positions, code block discovery, and
//! transactions that carry a position map from one snapshot to the next.

pub mod document;
pub mod node;
pub mod transaction;
pub mod transform;

pub use document::{CodeRegion, Document, Selection};
pub use node::{CodeBlockAttrs, Node, NodeAttr, NodeKind};
pub use transaction::{Step, Transaction, TransactionBuilder, TransformError};
pub use transform::{Assoc, MapRange, MapResult, Mapping, StepMap};

//! Remap-or-recompute decisions
//!
//! Recomputing costs time proportional to all code text; remapping costs
//! time proportional to the number of decorations. The detector only asks
//! for a recompute when token structure could have changed.

use crate::model::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Decorations are current
    Idle,
    /// A recompute is pending
    Dirty,
}

/// Why a recompute was requested, in checking order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecomputeReason {
    /// The transaction carries the force flag
    Forced,
    /// Code blocks were added or removed
    StructureChanged,
    /// The cursor entered, left, or moved between code blocks
    SelectionCrossed,
    /// Text inside a code block changed
    InRegionEdit,
    /// An earlier recompute was never marked clean
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Recompute(RecomputeReason),
    /// Carry the previous decorations through the transaction's mapping
    Remap,
}

#[derive(Debug, Clone)]
pub struct ChangeDetector {
    state: DetectorState,
}

impl Default for ChangeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self {
            state: DetectorState::Idle,
        }
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == DetectorState::Dirty
    }

    /// Classify `tx`, moving to `Dirty` when it needs a recompute
    pub fn observe(&mut self, tx: &Transaction) -> Decision {
        let decision = match classify(tx) {
            Decision::Remap if self.is_dirty() => Decision::Recompute(RecomputeReason::Pending),
            decision => decision,
        };
        if let Decision::Recompute(reason) = decision {
            tracing::debug!("Recompute needed: {:?}", reason);
            self.state = DetectorState::Dirty;
        }
        decision
    }

    /// Request a recompute without a transaction (initial load)
    pub fn mark_dirty(&mut self) {
        self.state = DetectorState::Dirty;
    }

    /// Called once the recompute has run
    pub fn mark_clean(&mut self) {
        self.state = DetectorState::Idle;
    }
}

/// Stateless part of the decision
pub fn classify(tx: &Transaction) -> Decision {
    if tx.is_forced() {
        return Decision::Recompute(RecomputeReason::Forced);
    }

    let before = tx.before();
    let after = tx.after();

    if tx.structure_changed() && before.code_region_count() != after.code_region_count() {
        return Decision::Recompute(RecomputeReason::StructureChanged);
    }

    let head_before = before.code_region_at(tx.selection_before().head);
    let head_after = after.code_region_at(tx.selection_after().head);
    if head_before != head_after {
        return Decision::Recompute(RecomputeReason::SelectionCrossed);
    }

    if tx.doc_changed() {
        let regions = before.code_regions();
        let in_region = tx.changed_ranges().iter().any(|range| {
            regions
                .iter()
                .any(|region| region.touches(range.start, range.end))
        });
        if in_region {
            return Decision::Recompute(RecomputeReason::InRegionEdit);
        }
    }

    Decision::Remap
}

//! Position maps
//!
//! Each step produces a `StepMap` describing which ranges were replaced.
//! A `Mapping` chains step maps so positions can be carried from the
//! document before a transaction to the document after it.

/// Which side a position sticks to when content is inserted exactly at it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
    /// Stay before inserted content
    Before,
    /// Move after inserted content
    After,
}

/// Result of mapping a single position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    pub pos: usize,
    /// True when the position was inside a deleted range
    pub deleted: bool,
}

/// A replaced range: `old_size` positions at `start` became `new_size` positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapRange {
    pub start: usize,
    pub old_size: usize,
    pub new_size: usize,
}

impl MapRange {
    /// First old position after the replaced range, saturating on bogus sizes
    pub fn old_end(&self) -> usize {
        self.start.saturating_add(self.old_size)
    }

    fn size_delta(&self) -> isize {
        let new = isize::try_from(self.new_size).unwrap_or(isize::MAX);
        let old = isize::try_from(self.old_size).unwrap_or(isize::MAX);
        new.saturating_sub(old)
    }
}

/// Position map for a single step. Ranges are sorted and in old coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
    ranges: Vec<MapRange>,
}

impl StepMap {
    /// Identity map (attribute changes, no-op steps)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(start: usize, old_size: usize, new_size: usize) -> Self {
        if old_size == 0 && new_size == 0 {
            return Self::empty();
        }
        Self {
            ranges: vec![MapRange {
                start,
                old_size,
                new_size,
            }],
        }
    }

    /// Build from explicit ranges. Ranges must be sorted by `start`.
    pub fn from_ranges(ranges: Vec<MapRange>) -> Self {
        Self { ranges }
    }

    pub fn ranges(&self) -> &[MapRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }

    /// Map a position, reporting whether it fell inside a replaced range.
    ///
    /// Arithmetic that would underflow yields `usize::MAX`, which callers
    /// treat as out of range.
    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let mut diff: isize = 0;
        for range in &self.ranges {
            if range.start > pos {
                break;
            }
            let end = range.old_end();
            if pos <= end {
                let side = if range.old_size == 0 {
                    assoc
                } else if pos == range.start {
                    Assoc::Before
                } else if pos == end {
                    Assoc::After
                } else {
                    assoc
                };
                let base = range.start.checked_add_signed(diff).unwrap_or(usize::MAX);
                let mapped = match side {
                    Assoc::Before => base,
                    Assoc::After => base.saturating_add(range.new_size),
                };
                return MapResult {
                    pos: mapped,
                    deleted: range.old_size > 0 && pos > range.start && pos < end,
                };
            }
            diff = diff.saturating_add(range.size_delta());
        }
        MapResult {
            pos: pos.checked_add_signed(diff).unwrap_or(usize::MAX),
            deleted: false,
        }
    }

    /// Map from new coordinates back to old ones
    pub fn invert(&self) -> StepMap {
        let mut diff: isize = 0;
        let ranges = self
            .ranges
            .iter()
            .map(|range| {
                let start = range.start.checked_add_signed(diff).unwrap_or(usize::MAX);
                diff = diff.saturating_add(range.size_delta());
                MapRange {
                    start,
                    old_size: range.new_size,
                    new_size: range.old_size,
                }
            })
            .collect();
        StepMap { ranges }
    }
}

/// A chain of step maps, one per step of a transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_maps(maps: Vec<StepMap>) -> Self {
        Self { maps }
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn is_identity(&self) -> bool {
        self.maps.iter().all(StepMap::is_empty)
    }

    pub fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }

    pub fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let mut deleted = false;
        let mut pos = pos;
        for map in &self.maps {
            let result = map.map_result(pos, assoc);
            deleted |= result.deleted;
            pos = result.pos;
        }
        MapResult { pos, deleted }
    }

    /// Carry a position in the coordinates *after* map `index` back to the
    /// coordinates before the whole mapping.
    pub(crate) fn map_back_from(&self, index: usize, pos: usize, assoc: Assoc) -> usize {
        self.maps[..index]
            .iter()
            .rev()
            .fold(pos, |pos, map| map.invert().map(pos, assoc))
    }
}

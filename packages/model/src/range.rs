use serde::{Deserialize, Serialize};
use std::fmt;

/// Span of linear data offsets. `from` may be greater than `to` for a backwards selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Range {
    pub from: usize,
    pub to: usize,
}

impl Range {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    pub fn collapsed(offset: usize) -> Self {
        Self::new(offset, offset)
    }

    pub fn start(&self) -> usize {
        self.from.min(self.to)
    }

    pub fn end(&self) -> usize {
        self.from.max(self.to)
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_collapsed(&self) -> bool {
        self.from == self.to
    }

    pub fn is_backwards(&self) -> bool {
        self.from > self.to
    }

    /// Same span with `from <= to`
    pub fn normalized(&self) -> Self {
        Self::new(self.start(), self.end())
    }

    pub fn flipped(&self) -> Self {
        Self::new(self.to, self.from)
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start() && offset < self.end()
    }

    /// Whether `other` lies inside this range, edges included
    pub fn encloses(&self, other: &Range) -> bool {
        self.start() <= other.start() && other.end() <= self.end()
    }

    /// Whether the two ranges share at least one item
    pub fn overlaps(&self, other: &Range) -> bool {
        self.start() < other.end() && other.start() < self.end()
    }

    /// Whether the two ranges overlap or share an edge
    pub fn touches(&self, other: &Range) -> bool {
        self.start() <= other.end() && other.start() <= self.end()
    }

    pub fn union(&self, other: &Range) -> Self {
        Self::new(self.start().min(other.start()), self.end().max(other.end()))
    }

    /// Overlapping part of two ranges, collapsed at the nearer edge when they are disjoint
    pub fn intersection(&self, other: &Range) -> Self {
        let start = self.start().max(other.start());
        let end = self.end().min(other.end());
        if start <= end {
            Self::new(start, end)
        } else {
            Self::collapsed(start.min(self.end()))
        }
    }

    pub fn shifted(&self, delta: isize) -> Self {
        Self::new(
            self.from.saturating_add_signed(delta),
            self.to.saturating_add_signed(delta),
        )
    }

    /// Smallest range covering every range in the slice
    pub fn covering(ranges: &[Range]) -> Option<Range> {
        let first = ranges.first()?;
        Some(ranges.iter().fold(first.normalized(), |acc, r| acc.union(r)))
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.from, self.to)
    }
}

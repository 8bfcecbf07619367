//! Greedy first-fit packing of intervals into non-overlapping levels.
//!
//! Horizontal placement is fixed by the coordinates; the order in which
//! intervals are presented decides which one claims a lower level first.
//! Sorting by [`Interval::packing_key`](crate::Interval::packing_key) puts long,
//! left-most intervals at the bottom of the stack.

use std::collections::BTreeMap;

use log::trace;

use crate::gene::{Exon, Gene};
use crate::interval::Interval;

/// Anything with a half-open `[start, end)` extent.
pub trait Span {
    fn bounds(&self) -> (u64, u64);
}

impl Span for Interval {
    fn bounds(&self) -> (u64, u64) {
        (self.start(), self.end())
    }
}

impl Span for Gene {
    fn bounds(&self) -> (u64, u64) {
        (self.start(), self.end())
    }
}

impl Span for Exon {
    fn bounds(&self) -> (u64, u64) {
        (self.start(), self.end())
    }
}

impl Span for (u64, u64) {
    fn bounds(&self) -> (u64, u64) {
        *self
    }
}

impl<T: Span + ?Sized> Span for &T {
    fn bounds(&self) -> (u64, u64) {
        (**self).bounds()
    }
}

/// How the end coordinate of an interval is treated when testing overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Boundary {
    /// `[start, end)` occupies `start..=end`: intervals that merely touch
    /// at a shared coordinate land on different levels.
    #[default]
    Inclusive,
    /// `[start, end)` occupies `start..end`: touching intervals may share
    /// a level.
    Exclusive,
}

impl Boundary {
    /// Returns the closed range of points occupied by `[start, end)`.
    #[inline]
    fn occupied(&self, start: u64, end: u64) -> (u64, u64) {
        match self {
            Boundary::Inclusive => (start, end),
            Boundary::Exclusive => (start, end.saturating_sub(1).max(start)),
        }
    }
}

/// Closed ranges already placed on one level, keyed by first point.
/// Ranges never overlap, so both keys and values increase together.
#[derive(Debug, Default)]
struct Level {
    occupied: BTreeMap<u64, u64>,
}

impl Level {
    fn intersects(&self, first: u64, last: u64) -> bool {
        self.occupied
            .range(..=last)
            .next_back()
            .is_some_and(|(_, &end)| end >= first)
    }

    fn claim(&mut self, first: u64, last: u64) {
        self.occupied.insert(first, last);
    }
}

/// Lazy iterator of packing levels, one per input interval, in input order.
///
/// Created by [`disjoint_bins`] and [`disjoint_bins_with`].
#[derive(Debug)]
pub struct DisjointBins<I> {
    intervals: I,
    levels: Vec<Level>,
    boundary: Boundary,
}

impl<I> DisjointBins<I> {
    /// Number of levels opened so far.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

impl<I> Iterator for DisjointBins<I>
where
    I: Iterator,
    I::Item: Span,
{
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let (start, end) = self.intervals.next()?.bounds();
        let (first, last) = self.boundary.occupied(start, end);

        let level = match self
            .levels
            .iter()
            .position(|level| !level.intersects(first, last))
        {
            Some(level) => level,
            None => {
                self.levels.push(Level::default());
                trace!("opened level {} for [{start}, {end})", self.levels.len() - 1);
                self.levels.len() - 1
            }
        };

        self.levels[level].claim(first, last);
        Some(level)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.intervals.size_hint()
    }
}

/// Assigns each interval the lowest level on which it overlaps nothing
/// placed before it, using [`Boundary::Inclusive`].
///
/// # Example
///
/// ```
/// use genome_browser::packer::disjoint_bins;
///
/// let levels: Vec<_> = disjoint_bins([(10u64, 20u64), (15, 25), (30, 40)]).collect();
/// assert_eq!(levels, vec![0, 1, 0]);
/// ```
pub fn disjoint_bins<I>(intervals: I) -> DisjointBins<I::IntoIter>
where
    I: IntoIterator,
    I::Item: Span,
{
    disjoint_bins_with(intervals, Boundary::default())
}

/// Same as [`disjoint_bins`] with an explicit boundary rule.
pub fn disjoint_bins_with<I>(intervals: I, boundary: Boundary) -> DisjointBins<I::IntoIter>
where
    I: IntoIterator,
    I::Item: Span,
{
    DisjointBins {
        intervals: intervals.into_iter(),
        levels: Vec::new(),
        boundary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_intervals_depend_on_boundary() {
        let spans: [(u64, u64); 2] = [(0, 10), (10, 20)];
        let inclusive: Vec<_> = disjoint_bins_with(spans, Boundary::Inclusive).collect();
        let exclusive: Vec<_> = disjoint_bins_with(spans, Boundary::Exclusive).collect();
        assert_eq!(inclusive, vec![0, 1]);
        assert_eq!(exclusive, vec![0, 0]);
    }

    #[test]
    fn unit_length_interval_occupies_one_point_when_exclusive() {
        let spans: [(u64, u64); 3] = [(5, 6), (6, 7), (5, 6)];
        let levels: Vec<_> = disjoint_bins_with(spans, Boundary::Exclusive).collect();
        assert_eq!(levels, vec![0, 0, 1]);
    }

    #[test]
    fn first_fit_reuses_gaps_in_lower_levels() {
        // (0,100) takes level 0, (10,20) level 1, (50,60) fits beside it on 1,
        // (120,130) drops back to level 0.
        let spans: [(u64, u64); 4] = [(0, 100), (10, 20), (50, 60), (120, 130)];
        let levels: Vec<_> = disjoint_bins(spans).collect();
        assert_eq!(levels, vec![0, 1, 1, 0]);
    }

    #[test]
    fn unsorted_input_still_finds_gaps() {
        // Later intervals placed left of existing ranges on a level.
        let spans: [(u64, u64); 4] = [(100, 200), (0, 50), (40, 150), (60, 90)];
        let levels: Vec<_> = disjoint_bins(spans).collect();
        assert_eq!(levels, vec![0, 0, 1, 0]);
    }

    #[test]
    fn level_count_tracks_opened_levels() {
        let mut bins = disjoint_bins([(0u64, 10u64), (1, 9), (2, 8)]);
        assert_eq!(bins.by_ref().count(), 3);
        assert_eq!(bins.level_count(), 3);
    }
}

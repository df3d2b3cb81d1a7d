//! Flanks: single color transitions at a position within the cycle.
//!
//! The conflict resolver flattens every signal group that drives one light
//! into flanks, sorts them, and replays them to find the light's merged
//! schedule.
//!
//! # Ordering
//!
//! Flanks are ordered by offset, where offsets closer than a margin count as
//! equal.  Among equal offsets a GREEN flank comes first, so a group that
//! turns green at the instant another turns red is seen as continuing green.
//!
//! A tolerance comparison is not transitive (`a ≈ b`, `b ≈ c`, `a < c`), so
//! [`sort_flanks`] does not hand it to `sort_by`.  It sorts by exact offset,
//! then reorders each run of offsets chained within the margin to put GREEN
//! first.  For well-separated offsets this matches [`Flank::cmp_with_margin`]
//! exactly.

use std::cmp::Ordering;
use std::ops::Range;

use sig_core::{Duration, LightColor};

/// Offsets closer than this are considered simultaneous.
///
/// Must exceed accumulated float round-off in offset sums and stay below the
/// spacing of any two real transitions.
pub const FLANK_COMPARE_MARGIN: Duration = Duration(0.01);

/// A transition to `color` at `offset` within the cycle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Flank {
    pub offset: Duration,
    pub color:  LightColor,
}

impl Flank {
    pub fn new(offset: Duration, color: LightColor) -> Self {
        Self { offset, color }
    }

    /// Pairwise ordering with tolerance `margin` and the green-first rule.
    pub fn cmp_with_margin(&self, other: &Flank, margin: Duration) -> Ordering {
        let delta = self.offset.0 - other.offset.0;
        if delta.abs() >= margin.0 {
            return delta.total_cmp(&0.0);
        }
        let self_green = self.color == LightColor::Green;
        let other_green = other.color == LightColor::Green;
        other_green.cmp(&self_green)
    }
}

/// Sort `flanks` by offset with the tolerance and green-first rule.
///
/// Flanks at identical offsets keep their input order unless the green-first
/// rule moves them.
pub fn sort_flanks(flanks: &mut [Flank], margin: Duration) {
    sort_flanks_by(flanks, margin, |f| *f);
}

/// [`sort_flanks`] for items that carry a flank, such as flanks tagged with
/// the group they came from.
pub(crate) fn sort_flanks_by<T>(items: &mut [T], margin: Duration, flank: impl Fn(&T) -> Flank) {
    items.sort_by(|a, b| flank(a).offset.0.total_cmp(&flank(b).offset.0));
    for run in coincident_runs(items, margin, &flank) {
        if run.len() > 1 {
            items[run].sort_by_key(|item| flank(item).color != LightColor::Green);
        }
    }
}

/// Split offset-sorted `items` into runs whose consecutive offsets lie
/// within `margin` of each other.
pub(crate) fn coincident_runs<T>(
    items:  &[T],
    margin: Duration,
    flank:  impl Fn(&T) -> Flank,
) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    while start < items.len() {
        let mut end = start + 1;
        while end < items.len()
            && flank(&items[end]).offset.0 - flank(&items[end - 1]).offset.0 < margin.0
        {
            end += 1;
        }
        runs.push(start..end);
        start = end;
    }
    runs
}

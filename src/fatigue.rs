//! Fatigue cost model.
//!
//! For one entity (group or professor) on one day, let `first` and `last`
//! be the first and last occupied periods. The contribution is
//!
//! ```text
//! (DAILY_OVERHEAD + (last - first) + 1)²
//! ```
//!
//! and `0` on days without classes. Total fatigue sums the contributions
//! of every group-day and professor-day.

use std::collections::HashMap;

use crate::models::{Cell, EntityId, EntityKind};

/// Fixed per-day cost of showing up at all.
pub const DAILY_OVERHEAD: u32 = 2;

/// First and last occupied period of an entity on a day.
pub type DaySpan = (u32, u32);

/// Contribution of a day whose occupied run spans `first..=last`.
#[inline]
pub fn span_fatigue(first: u32, last: u32) -> u32 {
    debug_assert!(first <= last);
    let width = DAILY_OVERHEAD + (last - first) + 1;
    width * width
}

/// Contribution of a day, `0` when the entity is free all day.
#[inline]
pub fn day_fatigue(span: Option<DaySpan>) -> u32 {
    span.map_or(0, |(first, last)| span_fatigue(first, last))
}

/// First/last period among `periods`, `None` if empty.
pub fn day_span<I: IntoIterator<Item = u32>>(periods: I) -> Option<DaySpan> {
    periods.into_iter().fold(None, |acc, p| match acc {
        None => Some((p, p)),
        Some((lo, hi)) => Some((lo.min(p), hi.max(p))),
    })
}

/// Per-entity-day spans of a set of occupied cells.
pub fn spans<I: IntoIterator<Item = Cell>>(
    cells: I,
) -> HashMap<(EntityKind, EntityId, u32), DaySpan> {
    let mut spans: HashMap<(EntityKind, EntityId, u32), DaySpan> = HashMap::new();
    for cell in cells {
        let day = cell.slot.day;
        let period = cell.slot.period;
        for key in [
            (EntityKind::Group, cell.group, day),
            (EntityKind::Professor, cell.prof, day),
        ] {
            spans
                .entry(key)
                .and_modify(|(lo, hi)| {
                    *lo = (*lo).min(period);
                    *hi = (*hi).max(period);
                })
                .or_insert((period, period));
        }
    }
    spans
}

/// Total fatigue recomputed from scratch over all occupied cells.
pub fn total_fatigue<I: IntoIterator<Item = Cell>>(cells: I) -> u32 {
    spans(cells)
        .values()
        .map(|&(first, last)| span_fatigue(first, last))
        .sum()
}

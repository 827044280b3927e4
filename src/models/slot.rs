//! Weekly grid coordinates and the cells/moves that live on it.
//!
//! The week is a fixed grid of [`DAYS_PER_WEEK`] × [`CLASSES_PER_DAY`]
//! slots. Days and periods are 1-based; entity id `0` means "empty".

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Teaching days per week.
pub const DAYS_PER_WEEK: u32 = 6;
/// Periods per teaching day.
pub const CLASSES_PER_DAY: u32 = 7;
/// Number of (day, period) slots in a week.
pub const SLOTS_PER_WEEK: u32 = DAYS_PER_WEEK * CLASSES_PER_DAY;

/// Identifier of a group or professor (1-based, `0` = none).
pub type EntityId = u32;

/// A (day, period) cell of the weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    /// Day of week, `1..=DAYS_PER_WEEK`.
    pub day: u32,
    /// Period within the day, `1..=CLASSES_PER_DAY`.
    pub period: u32,
}

impl Slot {
    /// Creates a slot.
    #[inline]
    pub fn new(day: u32, period: u32) -> Self {
        debug_assert!((1..=DAYS_PER_WEEK).contains(&day), "day {day} out of range");
        debug_assert!(
            (1..=CLASSES_PER_DAY).contains(&period),
            "period {period} out of range"
        );
        Self { day, period }
    }

    /// All slots of the week in (day, period) order.
    pub fn all() -> impl Iterator<Item = Slot> {
        (1..=DAYS_PER_WEEK)
            .flat_map(|day| (1..=CLASSES_PER_DAY).map(move |period| Slot { day, period }))
    }

    /// Draws a uniformly random slot.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            day: rng.random_range(1..=DAYS_PER_WEEK),
            period: rng.random_range(1..=CLASSES_PER_DAY),
        }
    }

    /// Dense 0-based index, day-major.
    #[inline]
    pub fn index(&self) -> usize {
        ((self.day - 1) * CLASSES_PER_DAY + (self.period - 1)) as usize
    }

    /// The slot `offset` periods away on the same day, if it exists.
    #[inline]
    pub fn shifted(&self, offset: i32) -> Option<Slot> {
        let period = self.period as i64 + offset as i64;
        if period >= 1 && period <= CLASSES_PER_DAY as i64 {
            Some(Slot {
                day: self.day,
                period: period as u32,
            })
        } else {
            None
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(day={}, class={})", self.day, self.period)
    }
}

/// An occupied (group, professor, slot) assignment.
///
/// Also the unit stored in the candidate edge set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub group: EntityId,
    pub prof: EntityId,
    pub slot: Slot,
}

impl Cell {
    #[inline]
    pub fn new(group: EntityId, prof: EntityId, slot: Slot) -> Self {
        Self { group, prof, slot }
    }
}

/// Relocation of one class from `from` to `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub group: EntityId,
    pub prof: EntityId,
    pub from: Slot,
    pub to: Slot,
}

impl Move {
    /// Moves the class held by `cell` to `to`.
    #[inline]
    pub fn relocate(cell: Cell, to: Slot) -> Self {
        Self {
            group: cell.group,
            prof: cell.prof,
            from: cell.slot,
            to,
        }
    }

    /// The move that undoes this one.
    #[inline]
    pub fn inverse(&self) -> Self {
        Self {
            group: self.group,
            prof: self.prof,
            from: self.to,
            to: self.from,
        }
    }

    /// The cell vacated by this move.
    #[inline]
    pub fn source(&self) -> Cell {
        Cell::new(self.group, self.prof, self.from)
    }

    /// The cell occupied after this move.
    #[inline]
    pub fn target(&self) -> Cell {
        Cell::new(self.group, self.prof, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_all_slots_day_major() {
        let slots: Vec<Slot> = Slot::all().collect();
        assert_eq!(slots.len(), SLOTS_PER_WEEK as usize);
        assert_eq!(slots[0], Slot::new(1, 1));
        assert_eq!(slots[1], Slot::new(1, 2));
        assert_eq!(slots[7], Slot::new(2, 1));
        for (i, s) in slots.iter().enumerate() {
            assert_eq!(s.index(), i);
        }
    }

    #[test]
    fn test_shifted_stays_in_day() {
        let s = Slot::new(3, 1);
        assert_eq!(s.shifted(-1), None);
        assert_eq!(s.shifted(1), Some(Slot::new(3, 2)));
        let last = Slot::new(3, CLASSES_PER_DAY);
        assert_eq!(last.shifted(1), None);
        assert_eq!(last.shifted(0), Some(last));
    }

    #[test]
    fn test_random_slot_in_range() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..500 {
            let s = Slot::random(&mut rng);
            assert!((1..=DAYS_PER_WEEK).contains(&s.day));
            assert!((1..=CLASSES_PER_DAY).contains(&s.period));
        }
    }

    #[test]
    fn test_move_inverse() {
        let cell = Cell::new(2, 5, Slot::new(1, 3));
        let mv = Move::relocate(cell, Slot::new(4, 6));
        assert_eq!(mv.source(), cell);
        assert_eq!(mv.target(), Cell::new(2, 5, Slot::new(4, 6)));
        assert_eq!(mv.inverse().inverse(), mv);
        assert_eq!(mv.inverse().target(), cell);
    }
}

//! Timetable (solution) model.
//!
//! A solution is the group-side view of a schedule: for each group and
//! slot, the professor teaching it (or `0`). The professor-side view is
//! derived, so group exclusivity holds by construction.
//!
//! # Text format
//!
//! ```text
//! <fatigue>
//!
//! <group 1: CLASSES_PER_DAY lines of DAYS_PER_WEEK professor ids>
//!
//! <group 2: ...>
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::problem::{Problem, Tokens};
use super::slot::{Cell, EntityId, Slot, CLASSES_PER_DAY, DAYS_PER_WEEK, SLOTS_PER_WEEK};
use crate::error::Result;
use crate::fatigue;

/// A complete weekly timetable with its declared fatigue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    /// Declared total fatigue.
    pub fatigue: u32,
    num_groups: u32,
    /// `[group - 1][slot index]` → professor id (0 = free).
    grid: Vec<EntityId>,
}

impl Solution {
    /// Creates an empty timetable for `num_groups` groups.
    pub fn new(num_groups: u32) -> Self {
        Self {
            fatigue: 0,
            num_groups,
            grid: vec![0; (num_groups * SLOTS_PER_WEEK) as usize],
        }
    }

    #[inline]
    pub fn num_groups(&self) -> u32 {
        self.num_groups
    }

    #[inline]
    fn index(&self, group: EntityId, slot: Slot) -> usize {
        debug_assert!((1..=self.num_groups).contains(&group));
        (group - 1) as usize * SLOTS_PER_WEEK as usize + slot.index()
    }

    /// Professor teaching `group` at `slot`, `0` if free.
    #[inline]
    pub fn prof_at(&self, group: EntityId, slot: Slot) -> EntityId {
        self.grid[self.index(group, slot)]
    }

    /// Assigns (or clears, with `prof = 0`) a class.
    pub fn set(&mut self, group: EntityId, slot: Slot, prof: EntityId) {
        let idx = self.index(group, slot);
        self.grid[idx] = prof;
    }

    /// All occupied cells, ordered by group then slot.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (1..=self.num_groups).flat_map(move |g| {
            Slot::all().filter_map(move |s| {
                let p = self.prof_at(g, s);
                (p != 0).then(|| Cell::new(g, p, s))
            })
        })
    }

    /// Number of scheduled classes.
    pub fn assignment_count(&self) -> usize {
        self.grid.iter().filter(|&&p| p != 0).count()
    }

    /// Occupied cells of one group.
    pub fn cells_for_group(&self, group: EntityId) -> Vec<Cell> {
        self.cells().filter(|c| c.group == group).collect()
    }

    /// Occupied cells of one professor.
    pub fn cells_for_prof(&self, prof: EntityId) -> Vec<Cell> {
        self.cells().filter(|c| c.prof == prof).collect()
    }

    /// Fatigue recomputed from the grid, ignoring the declared value.
    pub fn recompute_fatigue(&self) -> u32 {
        fatigue::total_fatigue(self.cells())
    }

    /// Parses the solution text format for `problem`.
    pub fn parse(problem: &Problem, input: &str) -> Result<Self> {
        let mut tokens = Tokens::new(input);
        let mut solution = Self::new(problem.num_groups());
        solution.fatigue = tokens.next_u32("fatigue")?;
        for g in problem.groups() {
            for period in 1..=CLASSES_PER_DAY {
                for day in 1..=DAYS_PER_WEEK {
                    let prof = tokens.next_u32(&format!(
                        "professor for group {g} on (day={day}, class={period})"
                    ))?;
                    solution.set(g, Slot::new(day, period), prof);
                }
            }
        }
        Ok(solution)
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.fatigue)?;
        for g in 1..=self.num_groups {
            writeln!(f)?;
            for period in 1..=CLASSES_PER_DAY {
                let row: Vec<String> = (1..=DAYS_PER_WEEK)
                    .map(|day| self.prof_at(g, Slot::new(day, period)).to_string())
                    .collect();
                writeln!(f, "{}", row.join(" "))?;
            }
        }
        Ok(())
    }
}

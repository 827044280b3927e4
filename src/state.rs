//! Incremental schedule state.
//!
//! Holds the two inverse occupancy relations, the per-slot room usage, the
//! cached per-entity-per-day fatigue contributions and their running
//! total. Every container is a [`PersistentMap`], so [`Clone`] is O(1)
//! and a clone is an independent snapshot.
//!
//! # Invariants
//!
//! - `group_of(prof, slot) == g` ⇔ `prof_of(g, slot) == prof`
//! - `free_rooms(slot) == num_rooms - occupied cells in slot`
//! - cached contribution of `(entity, day)` equals
//!   [`day_fatigue`](crate::fatigue::day_fatigue) of its current span
//! - `fatigue()` equals the sum of all cached contributions, which equals
//!   [`recompute_fatigue`](ScheduleState::recompute_fatigue)
//!
//! [`apply_move`](ScheduleState::apply_move) touches at most four
//! contributions and never rescans the schedule;
//! [`rollback`](ScheduleState::rollback) restores the exact prior state.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;

use crate::fatigue::{self, DaySpan};
use crate::models::{
    Cell, EntityId, EntityKind, Move, Problem, Slot, Solution, DAYS_PER_WEEK,
};
use crate::persistent::{Key2, Key3, PersistentMap};

#[inline]
fn cell_key(id: EntityId, slot: Slot) -> Key3 {
    Key3(id, slot.day, slot.period)
}

#[inline]
fn slot_key(slot: Slot) -> Key2 {
    Key2(slot.day, slot.period)
}

/// The mutable optimization state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleState {
    problem: Arc<Problem>,
    /// `(group, day, period)` → professor.
    group_occ: PersistentMap<Key3>,
    /// `(prof, day, period)` → group.
    prof_occ: PersistentMap<Key3>,
    /// `(day, period)` → occupied cells.
    rooms_used: PersistentMap<Key2>,
    /// `(group, day)` → fatigue contribution.
    group_cost: PersistentMap<Key2>,
    /// `(prof, day)` → fatigue contribution.
    prof_cost: PersistentMap<Key2>,
    fatigue: u32,
}

/// Everything [`ScheduleState::rollback`] needs to undo one move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveUndo {
    mv: Move,
    fatigue_before: u32,
    group_from: u32,
    prof_from: u32,
    group_to: u32,
    prof_to: u32,
    delta: i64,
}

impl MoveUndo {
    /// The applied move.
    #[inline]
    pub fn mv(&self) -> Move {
        self.mv
    }

    /// Signed fatigue change caused by the move.
    #[inline]
    pub fn delta(&self) -> i64 {
        self.delta
    }
}

impl ScheduleState {
    /// A state with nothing scheduled.
    pub fn empty(problem: Arc<Problem>) -> Self {
        Self {
            problem,
            group_occ: PersistentMap::new(),
            prof_occ: PersistentMap::new(),
            rooms_used: PersistentMap::new(),
            group_cost: PersistentMap::new(),
            prof_cost: PersistentMap::new(),
            fatigue: 0,
        }
    }

    #[inline]
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// Shared handle to the problem.
    #[inline]
    pub fn problem_arc(&self) -> &Arc<Problem> {
        &self.problem
    }

    /// Running total fatigue.
    #[inline]
    pub fn fatigue(&self) -> u32 {
        self.fatigue
    }

    /// Professor teaching `group` at `slot`, `0` if free.
    #[inline]
    pub fn prof_of(&self, group: EntityId, slot: Slot) -> EntityId {
        self.group_occ.get(cell_key(group, slot))
    }

    /// Group taught by `prof` at `slot`, `0` if free.
    #[inline]
    pub fn group_of(&self, prof: EntityId, slot: Slot) -> EntityId {
        self.prof_occ.get(cell_key(prof, slot))
    }

    #[inline]
    pub fn rooms_used(&self, slot: Slot) -> u32 {
        self.rooms_used.get(slot_key(slot))
    }

    #[inline]
    pub fn free_rooms(&self, slot: Slot) -> u32 {
        self.problem.num_rooms().saturating_sub(self.rooms_used(slot))
    }

    /// Number of scheduled classes.
    #[inline]
    pub fn occupied_count(&self) -> usize {
        self.group_occ.len()
    }

    #[inline]
    pub fn is_occupied(&self, cell: &Cell) -> bool {
        cell.prof != 0 && self.prof_of(cell.group, cell.slot) == cell.prof
    }

    /// First/last occupied period of a group on `day`.
    pub fn group_span(&self, group: EntityId, day: u32) -> Option<DaySpan> {
        self.group_occ.bounds((group, day))
    }

    /// First/last occupied period of a professor on `day`.
    pub fn prof_span(&self, prof: EntityId, day: u32) -> Option<DaySpan> {
        self.prof_occ.bounds((prof, day))
    }

    /// Cached fatigue contribution of a group-day.
    pub fn group_day_fatigue(&self, group: EntityId, day: u32) -> u32 {
        self.group_cost.get(Key2(group, day))
    }

    /// Cached fatigue contribution of a professor-day.
    pub fn prof_day_fatigue(&self, prof: EntityId, day: u32) -> u32 {
        self.prof_cost.get(Key2(prof, day))
    }

    /// Whether a `(group, prof)` class fits at `slot`.
    pub fn can_place(&self, group: EntityId, prof: EntityId, slot: Slot) -> bool {
        self.free_rooms(slot) > 0
            && self.prof_of(group, slot) == 0
            && self.group_of(prof, slot) == 0
    }

    /// Schedules a class; the caller guarantees [`can_place`](Self::can_place).
    pub fn place(&mut self, group: EntityId, prof: EntityId, slot: Slot) {
        debug_assert!(self.can_place(group, prof, slot));
        self.group_occ = self.group_occ.set(cell_key(group, slot), prof);
        self.prof_occ = self.prof_occ.set(cell_key(prof, slot), group);
        self.rooms_used = self.rooms_used.adjust(slot_key(slot), 1);
        self.refresh_day(EntityKind::Group, group, slot.day);
        self.refresh_day(EntityKind::Professor, prof, slot.day);
    }

    /// Whether `mv` moves an existing class to a different, conflict-free slot.
    pub fn is_feasible_move(&self, mv: &Move) -> bool {
        mv.from != mv.to
            && self.is_occupied(&mv.source())
            && self.can_place(mv.group, mv.prof, mv.to)
    }

    /// Applies `mv` and updates fatigue incrementally.
    ///
    /// Only the contributions of `(group, from.day)` and `(prof, from.day)`,
    /// plus `(group, to.day)` and `(prof, to.day)` when the day changes, are
    /// recomputed. The returned undo record carries the fatigue delta.
    pub fn apply_move(&mut self, mv: Move) -> MoveUndo {
        debug_assert!(self.is_feasible_move(&mv), "infeasible move {mv:?}");
        let Move {
            group,
            prof,
            from,
            to,
        } = mv;
        let before = MoveUndo {
            mv,
            fatigue_before: self.fatigue,
            group_from: self.group_day_fatigue(group, from.day),
            prof_from: self.prof_day_fatigue(prof, from.day),
            group_to: self.group_day_fatigue(group, to.day),
            prof_to: self.prof_day_fatigue(prof, to.day),
            delta: 0,
        };

        self.write_cells(group, prof, from, to);
        self.refresh_day(EntityKind::Group, group, from.day);
        self.refresh_day(EntityKind::Professor, prof, from.day);
        if to.day != from.day {
            self.refresh_day(EntityKind::Group, group, to.day);
            self.refresh_day(EntityKind::Professor, prof, to.day);
        }

        MoveUndo {
            delta: self.fatigue as i64 - before.fatigue_before as i64,
            ..before
        }
    }

    /// Reverts the move recorded in `undo`.
    ///
    /// Must be called before any other mutation of this state.
    pub fn rollback(&mut self, undo: MoveUndo) {
        let Move {
            group,
            prof,
            from,
            to,
        } = undo.mv;
        self.write_cells(group, prof, to, from);
        self.group_cost = self.group_cost.set(Key2(group, from.day), undo.group_from);
        self.prof_cost = self.prof_cost.set(Key2(prof, from.day), undo.prof_from);
        if to.day != from.day {
            self.group_cost = self.group_cost.set(Key2(group, to.day), undo.group_to);
            self.prof_cost = self.prof_cost.set(Key2(prof, to.day), undo.prof_to);
        }
        self.fatigue = undo.fatigue_before;
    }

    fn write_cells(&mut self, group: EntityId, prof: EntityId, from: Slot, to: Slot) {
        self.group_occ = self
            .group_occ
            .remove(cell_key(group, from))
            .set(cell_key(group, to), prof);
        self.prof_occ = self
            .prof_occ
            .remove(cell_key(prof, from))
            .set(cell_key(prof, to), group);
        self.rooms_used = self
            .rooms_used
            .adjust(slot_key(from), -1)
            .adjust(slot_key(to), 1);
    }

    /// Recomputes one entity-day contribution and patches the total.
    fn refresh_day(&mut self, kind: EntityKind, id: EntityId, day: u32) {
        let (occ, cost) = match kind {
            EntityKind::Group => (&self.group_occ, &mut self.group_cost),
            EntityKind::Professor => (&self.prof_occ, &mut self.prof_cost),
        };
        let new = fatigue::day_fatigue(occ.bounds((id, day)));
        let old = cost.get(Key2(id, day));
        *cost = cost.set(Key2(id, day), new);
        self.fatigue = self.fatigue - old + new;
    }

    /// Whether `cell` is occupied and borders a free period on both its
    /// group's and its professor's day.
    ///
    /// Periods outside the day count as free.
    pub fn is_edge(&self, cell: &Cell) -> bool {
        self.is_occupied(cell)
            && Self::at_boundary(&self.group_occ, cell.group, cell.slot)
            && Self::at_boundary(&self.prof_occ, cell.prof, cell.slot)
    }

    fn at_boundary(occ: &PersistentMap<Key3>, id: EntityId, slot: Slot) -> bool {
        [-1, 1].into_iter().any(|offset| match slot.shifted(offset) {
            Some(next) => !occ.contains_key(cell_key(id, next)),
            None => true,
        })
    }

    /// Occupied cells whose edge status may have changed because of `mv`.
    ///
    /// Covers the group's and professor's cells at and next to both the
    /// vacated and the newly occupied slot.
    pub fn edge_neighborhood(&self, mv: &Move) -> Vec<Cell> {
        let mut cells = Vec::with_capacity(12);
        for slot in [mv.from, mv.to] {
            for offset in -1..=1 {
                let Some(s) = slot.shifted(offset) else {
                    continue;
                };
                let p = self.prof_of(mv.group, s);
                if p != 0 {
                    cells.push(Cell::new(mv.group, p, s));
                }
                let g = self.group_of(mv.prof, s);
                if g != 0 {
                    cells.push(Cell::new(g, mv.prof, s));
                }
            }
        }
        cells
    }

    /// All occupied cells, ordered by group, day, period.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.group_occ
            .iter()
            .map(|(Key3(g, d, c), p)| Cell::new(g, p, Slot::new(d, c)))
    }

    /// All cells currently qualifying as candidate edges.
    pub fn edges(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells().filter(move |c| self.is_edge(c))
    }

    /// Uniformly random occupied cell.
    pub fn random_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        self.prof_occ
            .sample(rng)
            .map(|(Key3(p, d, c), g)| Cell::new(g, p, Slot::new(d, c)))
    }

    /// Total fatigue recomputed from scratch.
    pub fn recompute_fatigue(&self) -> u32 {
        fatigue::total_fatigue(self.cells())
    }

    /// Group-side timetable carrying the current fatigue.
    pub fn to_solution(&self) -> Solution {
        let mut solution = Solution::new(self.problem.num_groups());
        for cell in self.cells() {
            solution.set(cell.group, cell.slot, cell.prof);
        }
        solution.fatigue = self.fatigue;
        solution
    }

    /// Verifies every state invariant plus requirement conservation.
    ///
    /// Returns all detected inconsistencies.
    pub fn check_invariants(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let problem = &self.problem;

        for (Key3(g, d, c), p) in self.group_occ.iter() {
            if self.prof_occ.get(Key3(p, d, c)) != g {
                errors.push(format!(
                    "group {g} has prof {p} on (day={d}, class={c}) but not vice versa"
                ));
            }
            if !problem.groups().contains(&g) || !problem.profs().contains(&p) {
                errors.push(format!("unknown entity in cell ({g}, {p}, {d}, {c})"));
            }
        }
        for (Key3(p, d, c), g) in self.prof_occ.iter() {
            if self.group_occ.get(Key3(g, d, c)) != p {
                errors.push(format!(
                    "prof {p} has group {g} on (day={d}, class={c}) but not vice versa"
                ));
            }
        }

        let mut used: HashMap<Slot, u32> = HashMap::new();
        for cell in self.cells() {
            *used.entry(cell.slot).or_default() += 1;
        }
        for slot in Slot::all() {
            let counted = used.get(&slot).copied().unwrap_or(0);
            if counted != self.rooms_used(slot) {
                errors.push(format!(
                    "room counter on {slot} is {} but {counted} cells are occupied",
                    self.rooms_used(slot)
                ));
            }
            if counted > problem.num_rooms() {
                errors.push(format!("{counted} classes on {slot} exceed {} rooms", problem.num_rooms()));
            }
        }
        if self.rooms_used.len() != used.len() {
            errors.push("room counters exist for unoccupied slots".to_string());
        }

        let mut cached_total: u64 = 0;
        for day in 1..=DAYS_PER_WEEK {
            for g in problem.groups() {
                let expected = fatigue::day_fatigue(self.group_span(g, day));
                let cached = self.group_day_fatigue(g, day);
                if expected != cached {
                    errors.push(format!(
                        "group {g} day {day}: cached fatigue {cached}, expected {expected}"
                    ));
                }
                cached_total += cached as u64;
            }
            for p in problem.profs() {
                let expected = fatigue::day_fatigue(self.prof_span(p, day));
                let cached = self.prof_day_fatigue(p, day);
                if expected != cached {
                    errors.push(format!(
                        "prof {p} day {day}: cached fatigue {cached}, expected {expected}"
                    ));
                }
                cached_total += cached as u64;
            }
        }
        let stored_total: u64 = self
            .group_cost
            .iter()
            .chain(self.prof_cost.iter())
            .map(|(_, v)| v as u64)
            .sum();
        if stored_total != cached_total {
            errors.push("fatigue cache holds entries outside the problem".to_string());
        }
        if cached_total != self.fatigue as u64 {
            errors.push(format!(
                "running fatigue {} differs from cached sum {cached_total}",
                self.fatigue
            ));
        }
        let scratch = self.recompute_fatigue();
        if scratch != self.fatigue {
            errors.push(format!(
                "running fatigue {} differs from recomputed {scratch}",
                self.fatigue
            ));
        }

        let mut scheduled: HashMap<(EntityId, EntityId), u32> = HashMap::new();
        for cell in self.cells() {
            *scheduled.entry((cell.group, cell.prof)).or_default() += 1;
        }
        for g in problem.groups() {
            for p in problem.profs() {
                let want = problem.required(g, p);
                let got = scheduled.get(&(g, p)).copied().unwrap_or(0);
                if want != got {
                    errors.push(format!(
                        "(group={g}, prof={p}) has {got} classes, requires {want}"
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    /// Builds a state holding exactly `cells`, with a problem requiring them.
    fn state_with(num_rooms: u32, groups: u32, profs: u32, cells: &[Cell]) -> ScheduleState {
        let mut problem = Problem::new(groups, profs, num_rooms);
        for c in cells {
            let n = problem.required(c.group, c.prof);
            problem.set_required(c.group, c.prof, n + 1);
        }
        let mut state = ScheduleState::empty(Arc::new(problem));
        for c in cells {
            state.place(c.group, c.prof, c.slot);
        }
        state
    }

    fn cell(g: u32, p: u32, d: u32, c: u32) -> Cell {
        Cell::new(g, p, Slot::new(d, c))
    }

    #[test]
    fn test_empty_state() {
        let state = ScheduleState::empty(Arc::new(Problem::new(2, 2, 1)));
        assert_eq!(state.fatigue(), 0);
        assert_eq!(state.occupied_count(), 0);
        assert_eq!(state.free_rooms(Slot::new(1, 1)), 1);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_place_updates_all_views() {
        let state = state_with(2, 2, 2, &[cell(1, 2, 1, 1), cell(2, 1, 1, 1), cell(1, 2, 1, 3)]);
        assert_eq!(state.prof_of(1, Slot::new(1, 1)), 2);
        assert_eq!(state.group_of(2, Slot::new(1, 1)), 1);
        assert_eq!(state.free_rooms(Slot::new(1, 1)), 0);
        assert_eq!(state.group_span(1, 1), Some((1, 3)));
        // group 1 & prof 2: span 1..=3 → 25 each; group 2 & prof 1 → 9 each
        assert_eq!(state.fatigue(), 25 + 25 + 9 + 9);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_move_feasibility() {
        let state = state_with(2, 2, 2, &[cell(1, 1, 1, 1), cell(2, 2, 1, 2)]);
        let mv = |g, p, from: Slot, to: Slot| Move {
            group: g,
            prof: p,
            from,
            to,
        };
        // free target
        assert!(state.is_feasible_move(&mv(1, 1, Slot::new(1, 1), Slot::new(2, 1))));
        // same slot
        assert!(!state.is_feasible_move(&mv(1, 1, Slot::new(1, 1), Slot::new(1, 1))));
        // source not holding that class
        assert!(!state.is_feasible_move(&mv(1, 2, Slot::new(1, 1), Slot::new(2, 1))));
        // group 1 and prof 1 free at (1,2) but room count allows it → feasible
        assert!(state.is_feasible_move(&mv(1, 1, Slot::new(1, 1), Slot::new(1, 2))));

        let crowded = state_with(1, 2, 2, &[cell(1, 1, 1, 1), cell(2, 2, 1, 2)]);
        // only room is taken at (1,2)
        assert!(!crowded.is_feasible_move(&mv(1, 1, Slot::new(1, 1), Slot::new(1, 2))));

        let busy = state_with(3, 2, 2, &[cell(1, 1, 1, 1), cell(1, 2, 1, 2), cell(2, 1, 1, 3)]);
        // group 1 busy at (1,2)
        assert!(!busy.is_feasible_move(&mv(1, 1, Slot::new(1, 1), Slot::new(1, 2))));
        // prof 1 busy at (1,3)
        assert!(!busy.is_feasible_move(&mv(1, 1, Slot::new(1, 1), Slot::new(1, 3))));
    }

    #[test]
    fn test_apply_move_delta_matches_recompute() {
        let mut state = state_with(1, 1, 1, &[cell(1, 1, 1, 1), cell(1, 1, 1, 5)]);
        let before = state.fatigue();
        assert_eq!(before, 2 * 49);
        let undo = state.apply_move(Move::relocate(cell(1, 1, 1, 5), Slot::new(1, 2)));
        assert_eq!(state.fatigue(), 2 * 16);
        assert_eq!(undo.delta(), 2 * 16 - 2 * 49);
        assert_eq!(state.recompute_fatigue(), state.fatigue());
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_cross_day_move() {
        let mut state = state_with(1, 1, 1, &[cell(1, 1, 1, 1), cell(1, 1, 1, 2)]);
        let undo = state.apply_move(Move::relocate(cell(1, 1, 1, 2), Slot::new(4, 7)));
        // day 1: 9 + 9, day 4: 9 + 9
        assert_eq!(state.fatigue(), 36);
        assert_eq!(undo.delta(), 36 - 32);
        assert_eq!(state.group_span(1, 4), Some((7, 7)));
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_rollback_restores_exact_state() {
        let cells = [cell(1, 1, 1, 1), cell(1, 2, 1, 4), cell(2, 1, 3, 2), cell(2, 2, 3, 3)];
        let mut state = state_with(2, 2, 2, &cells);
        let snapshot = state.clone();
        for (src, to) in [
            (cells[1], Slot::new(1, 2)),
            (cells[2], Slot::new(5, 6)),
            (cells[3], Slot::new(3, 1)),
        ] {
            let undo = state.apply_move(Move::relocate(src, to));
            assert_ne!(state, snapshot);
            state.rollback(undo);
            assert_eq!(state, snapshot);
            assert!(state.check_invariants().is_ok());
        }
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut state = state_with(1, 1, 1, &[cell(1, 1, 2, 2)]);
        let snapshot = state.clone();
        state.apply_move(Move::relocate(cell(1, 1, 2, 2), Slot::new(6, 6)));
        assert_eq!(snapshot.prof_of(1, Slot::new(2, 2)), 1);
        assert_eq!(snapshot.prof_of(1, Slot::new(6, 6)), 0);
        assert!(snapshot.check_invariants().is_ok());
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_random_walk_keeps_invariants() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut cells = Vec::new();
        // 3 groups, 3 profs, a diagonal pattern over the week
        for d in 1..=6 {
            for c in 1..=3 {
                let g = 1 + (d + c) % 3;
                let p = 1 + (d + 2 * c) % 3;
                cells.push(cell(g, p, d, c));
            }
        }
        let mut state = state_with(2, 3, 3, &cells);
        assert!(state.check_invariants().is_ok());

        let mut applied = 0;
        for _ in 0..2000 {
            let src = state.random_cell(&mut rng).unwrap();
            let mv = Move::relocate(src, Slot::random(&mut rng));
            if !state.is_feasible_move(&mv) {
                continue;
            }
            let before = state.clone();
            let undo = state.apply_move(mv);
            assert_eq!(
                state.fatigue() as i64 - before.fatigue() as i64,
                undo.delta()
            );
            if rng.random_bool(0.5) {
                state.rollback(undo);
                assert_eq!(state, before);
            } else {
                applied += 1;
            }
            assert!(state.check_invariants().is_ok(), "{:?}", state.check_invariants());
        }
        assert!(applied > 0);
    }

    #[test]
    fn test_is_edge() {
        // group 1 with prof 1 at periods 1,2,3 on day 1
        let state = state_with(1, 1, 1, &[cell(1, 1, 1, 1), cell(1, 1, 1, 2), cell(1, 1, 1, 3)]);
        assert!(state.is_edge(&cell(1, 1, 1, 1))); // period 0 is outside the day
        assert!(!state.is_edge(&cell(1, 1, 1, 2)));
        assert!(state.is_edge(&cell(1, 1, 1, 3)));
        assert!(!state.is_edge(&cell(1, 1, 1, 4))); // not occupied
    }

    #[test]
    fn test_edge_requires_both_sides() {
        // group 1 day 1: periods 2 (prof 1), 3 (prof 2), 4 (prof 1)
        // prof 2 day 1: periods 2 (group 2), 3 (group 1), 4 (group 2)
        let state = state_with(
            2,
            2,
            2,
            &[
                cell(1, 1, 1, 2),
                cell(1, 2, 1, 3),
                cell(1, 1, 1, 4),
                cell(2, 2, 1, 2),
                cell(2, 2, 1, 4),
            ],
        );
        // interior for both sides
        assert!(!state.is_edge(&cell(1, 2, 1, 3)));
        // group 1 boundary (period 1 free) and prof 1 boundary (period 1 free)
        assert!(state.is_edge(&cell(1, 1, 1, 2)));
        // group 2 and prof 2 both have period 1 free
        assert!(state.is_edge(&cell(2, 2, 1, 2)));
    }

    #[test]
    fn test_edge_neighborhood_covers_changes() {
        let mut rng = SmallRng::seed_from_u64(7);
        let cells = [cell(1, 1, 2, 2), cell(1, 2, 2, 3), cell(2, 1, 2, 3), cell(1, 1, 4, 4)];
        let mut state = state_with(3, 2, 2, &cells);
        for _ in 0..300 {
            let src = state.random_cell(&mut rng).unwrap();
            let mv = Move::relocate(src, Slot::random(&mut rng));
            if !state.is_feasible_move(&mv) {
                continue;
            }
            let before: std::collections::HashSet<Cell> = state.edges().collect();
            state.apply_move(mv);
            let after: std::collections::HashSet<Cell> = state.edges().collect();
            let touched: std::collections::HashSet<Cell> =
                state.edge_neighborhood(&mv).into_iter().collect();
            for changed in before.symmetric_difference(&after) {
                assert!(
                    touched.contains(changed) || *changed == mv.source(),
                    "edge change at {changed:?} not covered by {mv:?}"
                );
            }
        }
    }

    #[test]
    fn test_to_solution() {
        let state = state_with(1, 2, 1, &[cell(1, 1, 1, 1), cell(2, 1, 2, 1)]);
        let solution = state.to_solution();
        assert_eq!(solution.fatigue, state.fatigue());
        assert_eq!(solution.prof_at(2, Slot::new(2, 1)), 1);
        assert_eq!(solution.recompute_fatigue(), state.fatigue());
    }

    #[test]
    fn test_check_invariants_detects_unmet_requirement() {
        let problem = Problem::new(1, 1, 1).with_required(1, 1, 2);
        let mut state = ScheduleState::empty(Arc::new(problem));
        state.place(1, 1, Slot::new(1, 1));
        let errors = state.check_invariants().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("requires 2")));
    }
}

//! Greedy constructive seeder.
//!
//! # Algorithm
//!
//! 1. Reject structurally infeasible problems: total demand above the
//!    weekly room capacity, or a single group/professor needing more
//!    classes than the week has slots.
//! 2. Walk the slots in (day, period) order.
//! 3. In each slot, scan the pending (group, prof) pairs, most loaded
//!    entity first, and place every pair whose group and professor are
//!    both still free in that slot, until the rooms run out.
//! 4. Drop exhausted pairs and continue with the next slot.
//! 5. If classes are left over, discard the pass and build the seed from a
//!    balanced edge coloring instead, which always succeeds once step 1
//!    passes.
//!
//! The result is feasible but makes no attempt at low fatigue; the local
//! search takes it from there.
//!
//! # Complexity
//! O(S · P log P) for the greedy pass, where S = 42 slots and P = number
//! of demanded pairs. See [`coloring`](super::coloring) for the fallback.

use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::{Result, TimetableError};
use super::coloring;
use crate::models::{EntityId, EntityKind, Problem, Slot, SLOTS_PER_WEEK};
use crate::state::ScheduleState;

/// A (group, prof) pair with classes still to place.
#[derive(Debug, Clone, Copy)]
struct Pending {
    group: EntityId,
    prof: EntityId,
    remaining: u32,
}

/// Slot-major greedy seeder.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use u_timetable::models::Problem;
/// use u_timetable::scheduler::GreedySeeder;
///
/// let problem = Arc::new(Problem::from_matrix(1, vec![vec![2]]));
/// let state = GreedySeeder::new().seed(problem).unwrap();
/// assert_eq!(state.occupied_count(), 2);
/// assert_eq!(state.fatigue(), 32);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GreedySeeder;

impl GreedySeeder {
    /// Creates a new seeder.
    pub fn new() -> Self {
        Self
    }

    /// Seeds with pairs visited in (group, prof) order.
    pub fn seed(&self, problem: Arc<Problem>) -> Result<ScheduleState> {
        Self::check_capacity(&problem)?;
        let pending = Self::pending(&problem);
        Self::build(problem, &pending)
    }

    /// Seeds with pairs visited in a random order drawn from `rng`.
    ///
    /// Distinct random sources give distinct starting points, which is what
    /// independent restarts want.
    pub fn seed_with<R: Rng + ?Sized>(
        &self,
        problem: Arc<Problem>,
        rng: &mut R,
    ) -> Result<ScheduleState> {
        Self::check_capacity(&problem)?;
        let mut pending = Self::pending(&problem);
        pending.shuffle(rng);
        Self::build(problem, &pending)
    }

    /// Checks the capacity conditions.
    ///
    /// They are also sufficient: every problem that passes can be seeded.
    pub fn check_capacity(problem: &Problem) -> Result<()> {
        let required = problem.total_required();
        let capacity = problem.capacity();
        if required > capacity {
            return Err(TimetableError::CapacityExceeded { required, capacity });
        }
        for g in problem.groups() {
            let load = problem.group_load(g);
            if load > SLOTS_PER_WEEK {
                return Err(TimetableError::EntityOverloaded {
                    kind: EntityKind::Group,
                    id: g,
                    required: load,
                    capacity: SLOTS_PER_WEEK,
                });
            }
        }
        for p in problem.profs() {
            let load = problem.prof_load(p);
            if load > SLOTS_PER_WEEK {
                return Err(TimetableError::EntityOverloaded {
                    kind: EntityKind::Professor,
                    id: p,
                    required: load,
                    capacity: SLOTS_PER_WEEK,
                });
            }
        }
        Ok(())
    }

    fn pending(problem: &Problem) -> Vec<Pending> {
        problem
            .demands()
            .map(|(group, prof, remaining)| Pending {
                group,
                prof,
                remaining,
            })
            .collect()
    }

    fn build(problem: Arc<Problem>, pending: &[Pending]) -> Result<ScheduleState> {
        let (state, unscheduled) = Self::fill(Arc::clone(&problem), pending.to_vec());
        if unscheduled == 0 {
            debug!(
                classes = state.occupied_count(),
                fatigue = state.fatigue(),
                "greedy seed complete"
            );
            return Ok(state);
        }
        debug!(unscheduled, "greedy pass incomplete, seeding from a balanced coloring");
        Self::from_coloring(problem, pending)
    }

    /// Slot-major greedy pass; returns the state and the count left over.
    fn fill(problem: Arc<Problem>, mut pending: Vec<Pending>) -> (ScheduleState, u64) {
        let mut group_busy = vec![false; problem.num_groups() as usize + 1];
        let mut prof_busy = vec![false; problem.num_profs() as usize + 1];
        let mut group_left: Vec<u32> = (0..=problem.num_groups())
            .map(|g| if g == 0 { 0 } else { problem.group_load(g) })
            .collect();
        let mut prof_left: Vec<u32> = (0..=problem.num_profs())
            .map(|p| if p == 0 { 0 } else { problem.prof_load(p) })
            .collect();
        let mut state = ScheduleState::empty(problem);

        for slot in Slot::all() {
            if pending.is_empty() {
                break;
            }
            // stable: ties keep the caller's order
            pending.sort_by_key(|e| {
                std::cmp::Reverse(group_left[e.group as usize].max(prof_left[e.prof as usize]))
            });
            group_busy.fill(false);
            prof_busy.fill(false);
            for entry in pending.iter_mut() {
                if state.free_rooms(slot) == 0 {
                    break;
                }
                let (g, p) = (entry.group as usize, entry.prof as usize);
                if group_busy[g] || prof_busy[p] {
                    continue;
                }
                state.place(entry.group, entry.prof, slot);
                group_busy[g] = true;
                prof_busy[p] = true;
                group_left[g] -= 1;
                prof_left[p] -= 1;
                entry.remaining -= 1;
            }
            pending.retain(|e| e.remaining > 0);
        }

        let unscheduled = pending.iter().map(|e| e.remaining as u64).sum();
        (state, unscheduled)
    }

    fn from_coloring(problem: Arc<Problem>, pending: &[Pending]) -> Result<ScheduleState> {
        let meetings = pending
            .iter()
            .flat_map(|e| std::iter::repeat((e.group, e.prof)).take(e.remaining as usize));
        let classes = coloring::color_classes(
            problem.num_groups(),
            problem.num_profs(),
            problem.num_rooms(),
            meetings,
        )
        .ok_or_else(|| TimetableError::SeedIncomplete {
            unscheduled: problem.total_required(),
        })?;

        let mut state = ScheduleState::empty(problem);
        for (slot, class) in Slot::all().zip(classes) {
            for (group, prof) in class {
                state.place(group, prof, slot);
            }
        }
        debug!(
            classes = state.occupied_count(),
            fatigue = state.fatigue(),
            "coloring seed complete"
        );
        Ok(state)
    }
}

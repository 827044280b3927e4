//! Local search over timetables.
//!
//! # Submodules
//!
//! - [`acceptance`]: pluggable move acceptance (strict descent, Metropolis)
//! - [`budget`]: termination controls (adaptive wall clock, fixed steps)
//! - [`engine`]: the edge-driven local search and parallel restarts
//!
//! The free functions below are the minimal entry points: seed, search
//! under a caller predicate, read the cost.

pub mod acceptance;
pub mod budget;
pub mod engine;

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

pub use acceptance::{AcceptanceKind, AcceptancePolicy, Metropolis, StrictDescent};
pub use budget::{FnControl, SearchControl, StepBudget, TimeBudget};
pub use engine::{
    solve_parallel, LocalSearch, Phase, SearchConfig, SearchOutcome, SearchStats, TracePoint,
};

use crate::error::Result;
use crate::models::Problem;
use crate::scheduler::GreedySeeder;
use crate::state::ScheduleState;

/// Feasible seed for `problem`.
///
/// Fails with a structural infeasibility error when the demand cannot fit.
pub fn initialize(problem: Arc<Problem>) -> Result<ScheduleState> {
    GreedySeeder::new().seed(problem)
}

/// Runs strict-descent local search until `should_continue` returns false.
///
/// All randomness is drawn from `rng`, so a seeded source gives a
/// reproducible run. Returns the best state observed, never worse than
/// `state`.
pub fn search<R, F>(state: ScheduleState, rng: &mut R, should_continue: F) -> ScheduleState
where
    R: RngCore,
    F: FnMut() -> bool,
{
    LocalSearch::with_defaults(SmallRng::from_rng(rng))
        .search(state, &mut FnControl(should_continue))
        .best
}

/// Total fatigue of `state`.
#[inline]
pub fn fatigue(state: &ScheduleState) -> u32 {
    state.fatigue()
}

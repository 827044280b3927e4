//! Edge-driven local search.
//!
//! # Algorithm
//!
//! ```text
//! Seeding:   greedy seed, collect every edge cell
//! Searching: while control.should_continue():
//!              repeat up to max_attempts:
//!                pop an edge (or sample a random occupied cell)
//!                pick a random target slot
//!                infeasible      → push the edge back, retry
//!                apply the move  → policy accepts?
//!                  yes: refresh edges around both slots
//!                  no:  roll back, push the edge back
//!                stop retrying
//!              snapshot the state if it beats the best
//! Done:      return the best snapshot
//! ```
//!
//! Snapshots are O(1) because the state is built on persistent maps.
//!
//! # Complexity
//! One attempt costs O(log n) for the edge pop, the feasibility test and
//! the four contribution updates, plus O(log n) per neighbor refreshed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use super::acceptance::{AcceptanceKind, AcceptancePolicy, StrictDescent};
use super::budget::SearchControl;
use crate::edges::EdgeSet;
use crate::error::{Result, TimetableError};
use crate::models::{Move, Problem, Slot};
use crate::scheduler::GreedySeeder;
use crate::state::ScheduleState;

/// Local search parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Candidate moves tried per iteration before giving up on it.
    pub max_attempts: u32,
    /// Random seed; `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Move acceptance policy.
    pub acceptance: AcceptanceKind,
    /// Record a [`TracePoint`] every this many iterations (0 = never).
    pub trace_interval: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            seed: None,
            acceptance: AcceptanceKind::StrictDescent,
            trace_interval: 0,
        }
    }
}

impl SearchConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_acceptance(mut self, acceptance: AcceptanceKind) -> Self {
        self.acceptance = acceptance;
        self
    }

    pub fn with_trace_interval(mut self, trace_interval: u64) -> Self {
        self.trace_interval = trace_interval;
        self
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(TimetableError::InvalidConfig(
                "max_attempts must be at least 1".into(),
            ));
        }
        self.acceptance.build().map(|_| ())
    }
}

/// Engine lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Seeding,
    Searching,
    Done,
}

/// Fatigue sample taken during the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracePoint {
    pub iteration: u64,
    pub fatigue: u32,
    pub best: u32,
}

/// Counters for one search run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStats {
    /// Outer iterations granted by the control.
    pub iterations: u64,
    /// Candidate moves drawn.
    pub attempts: u64,
    /// Candidates rejected for a room, group or professor conflict.
    pub infeasible: u64,
    pub accepted: u64,
    pub rejected: u64,
    /// Times a new best state was recorded.
    pub improvements: u64,
    /// Candidates drawn by random sampling because no edge was available.
    pub fallback_samples: u64,
    pub initial_fatigue: u32,
    pub best_fatigue: u32,
    pub elapsed: Duration,
    pub trace: Vec<TracePoint>,
}

impl SearchStats {
    /// Mean wall time per iteration.
    pub fn time_per_iteration(&self) -> Duration {
        if self.iterations == 0 {
            Duration::ZERO
        } else {
            self.elapsed.div_f64(self.iterations as f64)
        }
    }
}

/// Result of a search run.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Best state observed.
    pub best: ScheduleState,
    pub stats: SearchStats,
}

/// Anytime local search over a [`ScheduleState`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use u_timetable::models::Problem;
/// use u_timetable::search::{LocalSearch, SearchConfig, StepBudget};
///
/// let problem = Arc::new(Problem::from_matrix(1, vec![vec![6]]));
/// let mut engine = LocalSearch::new(SearchConfig::default().with_seed(7)).unwrap();
/// let seed = engine.initialize(problem).unwrap();
/// let first = seed.fatigue();
/// let outcome = engine.search(seed, &mut StepBudget::new(2_000));
/// assert!(outcome.best.fatigue() < first);
/// assert!(outcome.best.check_invariants().is_ok());
/// ```
pub struct LocalSearch {
    config: SearchConfig,
    policy: Box<dyn AcceptancePolicy>,
    rng: SmallRng,
    edges: EdgeSet,
    phase: Phase,
}

impl LocalSearch {
    /// Creates an engine; the random source comes from `config.seed`.
    ///
    /// # Errors
    /// [`TimetableError::InvalidConfig`] if `config` fails
    /// [`SearchConfig::validate`].
    pub fn new(config: SearchConfig) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_os_rng(),
        };
        Self::with_rng(config, rng)
    }

    /// Creates an engine drawing from `rng`.
    pub fn with_rng(config: SearchConfig, rng: SmallRng) -> Result<Self> {
        config.validate()?;
        let policy = config.acceptance.build()?;
        Ok(Self {
            config,
            policy,
            rng,
            edges: EdgeSet::new(),
            phase: Phase::Seeding,
        })
    }

    /// Default configuration with strict descent, drawing from `rng`.
    pub fn with_defaults(rng: SmallRng) -> Self {
        Self {
            config: SearchConfig::default(),
            policy: Box::new(StrictDescent),
            rng,
            edges: EdgeSet::new(),
            phase: Phase::Seeding,
        }
    }

    #[inline]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Builds a feasible seed with a randomized greedy pass.
    pub fn initialize(&mut self, problem: Arc<Problem>) -> Result<ScheduleState> {
        self.phase = Phase::Seeding;
        trace!("phase: seeding");
        let state = GreedySeeder::new().seed_with(problem, &mut self.rng)?;
        info!(
            classes = state.occupied_count(),
            fatigue = state.fatigue(),
            "seeded"
        );
        Ok(state)
    }

    /// Improves `state` until `control` says stop; returns the best state seen.
    ///
    /// The result is never worse than the input. A state with nothing
    /// scheduled is returned at once without polling `control`.
    pub fn search<C>(&mut self, state: ScheduleState, control: &mut C) -> SearchOutcome
    where
        C: SearchControl + ?Sized,
    {
        let start = Instant::now();
        let mut stats = SearchStats {
            initial_fatigue: state.fatigue(),
            best_fatigue: state.fatigue(),
            ..SearchStats::default()
        };

        if state.occupied_count() == 0 {
            self.phase = Phase::Done;
            trace!("phase: done (nothing scheduled)");
            return SearchOutcome { best: state, stats };
        }

        self.phase = Phase::Searching;
        trace!(policy = self.policy.name(), "phase: searching");
        self.seed_edges(&state);

        let mut current = state;
        let mut best = current.clone();
        while control.should_continue() {
            stats.iterations += 1;
            self.step(&mut current, control.progress(), &mut stats);

            if current.fatigue() < best.fatigue() {
                best = current.clone();
                stats.improvements += 1;
                debug!(
                    iteration = stats.iterations,
                    fatigue = best.fatigue(),
                    "new best"
                );
            }
            if self.config.trace_interval > 0 && stats.iterations % self.config.trace_interval == 0
            {
                stats.trace.push(TracePoint {
                    iteration: stats.iterations,
                    fatigue: current.fatigue(),
                    best: best.fatigue(),
                });
            }
        }

        self.phase = Phase::Done;
        stats.best_fatigue = best.fatigue();
        stats.elapsed = start.elapsed();
        info!(
            steps = stats.iterations,
            time_per_step = ?stats.time_per_iteration(),
            accepted = stats.accepted,
            "fatigue: {} -> {}",
            stats.initial_fatigue,
            stats.best_fatigue
        );
        trace!("phase: done");
        SearchOutcome { best, stats }
    }

    /// Seeds and searches in one go.
    pub fn solve<C>(&mut self, problem: Arc<Problem>, control: &mut C) -> Result<SearchOutcome>
    where
        C: SearchControl + ?Sized,
    {
        let seed = self.initialize(problem)?;
        Ok(self.search(seed, control))
    }

    fn seed_edges(&mut self, state: &ScheduleState) {
        self.edges.clear();
        for cell in state.edges() {
            self.edges.push(cell, &mut self.rng);
        }
        trace!(edges = self.edges.len(), "edge set seeded");
    }

    /// One outer iteration: at most `max_attempts` candidates, stopping at
    /// the first feasible one.
    fn step(&mut self, state: &mut ScheduleState, progress: f64, stats: &mut SearchStats) {
        for _ in 0..self.config.max_attempts {
            stats.attempts += 1;
            let (source, popped) = match self.edges.pop() {
                Some(cell) => (cell, true),
                None => match state.random_cell(&mut self.rng) {
                    Some(cell) => {
                        stats.fallback_samples += 1;
                        (cell, false)
                    }
                    None => return,
                },
            };

            let mv = Move::relocate(source, Slot::random(&mut self.rng));
            if !state.is_feasible_move(&mv) {
                stats.infeasible += 1;
                if popped {
                    self.edges.push(source, &mut self.rng);
                }
                continue;
            }

            let undo = state.apply_move(mv);
            if self.policy.accept(undo.delta(), progress, &mut self.rng) {
                stats.accepted += 1;
                self.refresh_edges(state, &mv);
            } else {
                state.rollback(undo);
                stats.rejected += 1;
                if popped {
                    self.edges.push(source, &mut self.rng);
                }
            }
            return;
        }
    }

    /// Re-evaluates edge membership of every cell `mv` may have affected.
    fn refresh_edges(&mut self, state: &ScheduleState, mv: &Move) {
        self.edges.remove(&mv.source());
        for cell in state.edge_neighborhood(mv) {
            if state.is_edge(&cell) {
                self.edges.push(cell, &mut self.rng);
            } else {
                self.edges.remove(&cell);
            }
        }
    }
}

/// Runs `restarts` independent searches in parallel and keeps the best.
///
/// Run `i` is seeded with `config.seed + i` (or a random base seed) and
/// owns its own state, edge set and control from `make_control`. A run
/// that fails is logged and dropped; the call fails only if every run does.
pub fn solve_parallel<C, F>(
    problem: Arc<Problem>,
    config: &SearchConfig,
    restarts: usize,
    make_control: F,
) -> Result<SearchOutcome>
where
    C: SearchControl,
    F: Fn() -> C + Sync + Send,
{
    if restarts == 0 {
        return Err(TimetableError::InvalidConfig(
            "restarts must be at least 1".into(),
        ));
    }
    config.validate()?;
    GreedySeeder::check_capacity(&problem)?;
    let base_seed = config.seed.unwrap_or_else(rand::random);
    let results: Vec<Result<SearchOutcome>> = (0..restarts)
        .into_par_iter()
        .map(|run| {
            let run_config = config.clone().with_seed(base_seed.wrapping_add(run as u64));
            let mut engine = LocalSearch::new(run_config)?;
            let mut control = make_control();
            engine.solve(Arc::clone(&problem), &mut control)
        })
        .collect();

    let best = best_outcome(results)?;
    info!(runs = restarts, fatigue = best.best.fatigue(), "parallel restarts finished");
    Ok(best)
}

/// Lowest-fatigue successful outcome, or the first error if none succeeded.
fn best_outcome(results: Vec<Result<SearchOutcome>>) -> Result<SearchOutcome> {
    let mut best: Option<SearchOutcome> = None;
    let mut failure = None;
    for result in results {
        match result {
            Ok(outcome) => {
                if best
                    .as_ref()
                    .map_or(true, |b| outcome.best.fatigue() < b.best.fatigue())
                {
                    best = Some(outcome);
                }
            }
            Err(err) => {
                warn!(%err, "restart failed");
                failure.get_or_insert(err);
            }
        }
    }
    match (best, failure) {
        (Some(best), _) => Ok(best),
        (None, Some(err)) => Err(err),
        (None, None) => Err(TimetableError::InvalidConfig("no restarts were run".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::budget::{FnControl, StepBudget};
    use std::collections::HashSet;

    fn engine(seed: u64) -> LocalSearch {
        LocalSearch::new(SearchConfig::default().with_seed(seed)).unwrap()
    }

    fn mixed_problem() -> Arc<Problem> {
        Arc::new(Problem::from_matrix(
            3,
            vec![
                vec![4, 2, 0, 3, 1],
                vec![0, 3, 3, 2, 2],
                vec![2, 0, 4, 1, 3],
                vec![3, 3, 1, 0, 2],
            ],
        ))
    }

    #[test]
    fn test_single_pair_reaches_optimum() {
        let problem = Arc::new(Problem::from_matrix(1, vec![vec![2]]));
        let mut engine = engine(42);
        let outcome = engine.solve(problem, &mut StepBudget::new(500)).unwrap();
        assert_eq!(outcome.best.fatigue(), 32);
        assert_eq!(outcome.best.occupied_count(), 2);
        assert!(outcome.best.check_invariants().is_ok());
        assert_eq!(engine.phase(), Phase::Done);
    }

    #[test]
    fn test_zero_demand_terminates_immediately() {
        let problem = Arc::new(Problem::new(4, 4, 2));
        let mut polls = 0;
        let mut control = FnControl(|| {
            polls += 1;
            true
        });
        let outcome = engine(42).solve(problem, &mut control).unwrap();
        assert_eq!(outcome.best.fatigue(), 0);
        assert_eq!(outcome.stats.iterations, 0);
        assert!(outcome.best.check_invariants().is_ok());
        drop(control);
        assert_eq!(polls, 0);
    }

    #[test]
    fn test_full_capacity_has_no_feasible_move() {
        let problem = Arc::new(Problem::from_matrix(2, vec![vec![21, 21], vec![21, 21]]));
        let mut engine = engine(42);
        let seed = engine.initialize(problem).unwrap();
        let outcome = engine.search(seed.clone(), &mut StepBudget::new(100));
        assert_eq!(outcome.best, seed);
        assert_eq!(outcome.stats.accepted, 0);
        assert_eq!(outcome.stats.infeasible, outcome.stats.attempts);
        assert!(outcome.best.check_invariants().is_ok());
    }

    #[test]
    fn test_search_improves_packed_day() {
        // greedy stacks all six classes on day 1
        let problem = Arc::new(Problem::from_matrix(1, vec![vec![6]]));
        let mut engine = engine(42);
        let seed = engine.initialize(problem).unwrap();
        assert_eq!(seed.fatigue(), 128);
        let outcome = engine.search(seed, &mut StepBudget::new(5_000));
        assert!(outcome.best.fatigue() < 128);
        assert!(outcome.best.fatigue() >= 96);
        assert!(outcome.stats.improvements > 0);
        assert!(outcome.best.check_invariants().is_ok());
    }

    #[test]
    fn test_never_worse_than_input() {
        let problem = mixed_problem();
        for seed in 0..5 {
            let mut engine = engine(seed);
            let start = engine.initialize(problem.clone()).unwrap();
            let first = start.fatigue();
            let outcome = engine.search(start, &mut StepBudget::new(3_000));
            assert!(outcome.best.fatigue() <= first);
            assert_eq!(outcome.stats.initial_fatigue, first);
            assert_eq!(outcome.stats.best_fatigue, outcome.best.fatigue());
            assert!(outcome.best.check_invariants().is_ok());
        }
    }

    #[test]
    fn test_best_is_monotone() {
        let config = SearchConfig::default()
            .with_seed(42)
            .with_trace_interval(1);
        let outcome = LocalSearch::new(config)
            .unwrap()
            .solve(mixed_problem(), &mut StepBudget::new(2_000))
            .unwrap();
        let trace = &outcome.stats.trace;
        assert_eq!(trace.len(), 2_000);
        for pair in trace.windows(2) {
            assert!(pair[1].best <= pair[0].best);
            assert!(pair[1].iteration == pair[0].iteration + 1);
        }
        // strict descent never climbs
        for pair in trace.windows(2) {
            assert!(pair[1].fatigue <= pair[0].fatigue);
        }
    }

    #[test]
    fn test_steps_keep_invariants_and_edge_set() {
        let mut engine = engine(42);
        let mut state = engine.initialize(mixed_problem()).unwrap();
        engine.seed_edges(&state);
        let mut stats = SearchStats::default();
        for _ in 0..1_500 {
            let accepted_before = stats.accepted;
            engine.step(&mut state, 0.0, &mut stats);
            if stats.accepted > accepted_before {
                assert!(state.check_invariants().is_ok(), "{:?}", state.check_invariants());
            }
            let tracked: HashSet<_> = engine.edges.iter().copied().collect();
            let actual: HashSet<_> = state.edges().collect();
            assert_eq!(tracked, actual);
        }
        assert!(stats.accepted > 0);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_empty_edge_set_samples_occupied_cells() {
        let mut engine = engine(42);
        let mut state = engine.initialize(mixed_problem()).unwrap();
        let mut stats = SearchStats::default();
        for _ in 0..500 {
            engine.edges.clear();
            let accepted_before = stats.accepted;
            engine.step(&mut state, 0.0, &mut stats);
            if stats.accepted > accepted_before {
                assert!(state.check_invariants().is_ok());
            }
        }
        // within a step nothing refills the set until a move is accepted
        assert_eq!(stats.fallback_samples, stats.attempts);
        assert!(stats.accepted > 0);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn test_best_outcome_skips_failed_runs() {
        let mut engine = engine(3);
        let outcome = engine
            .solve(mixed_problem(), &mut StepBudget::new(100))
            .unwrap();
        let fatigue = outcome.best.fatigue();
        let results = vec![
            Err(TimetableError::SeedIncomplete { unscheduled: 1 }),
            Ok(outcome),
        ];
        assert_eq!(best_outcome(results).unwrap().best.fatigue(), fatigue);

        let err = best_outcome(vec![Err(TimetableError::SeedIncomplete { unscheduled: 1 })])
            .err()
            .unwrap();
        assert_eq!(err, TimetableError::SeedIncomplete { unscheduled: 1 });
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let config: SearchConfig = serde_json::from_str(
            r#"{"acceptance":{"kind":"metropolis","temperature":0.0,"window_start":0.5,"window_end":0.7}}"#,
        )
        .unwrap();
        assert!(matches!(
            LocalSearch::new(config.clone()),
            Err(TimetableError::InvalidConfig(_))
        ));
        assert!(solve_parallel(mixed_problem(), &config, 2, || StepBudget::new(10)).is_err());

        let config = SearchConfig::default().with_max_attempts(0);
        assert!(config.validate().is_err());
        assert!(matches!(
            solve_parallel(mixed_problem(), &SearchConfig::default(), 0, || StepBudget::new(10)),
            Err(TimetableError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_metropolis_run() {
        let config = SearchConfig::default()
            .with_seed(42)
            .with_acceptance(AcceptanceKind::metropolis())
            .with_trace_interval(1);
        let mut engine = LocalSearch::new(config).unwrap();
        let start = engine.initialize(mixed_problem()).unwrap();
        let first = start.fatigue();
        let outcome = engine.search(start, &mut StepBudget::new(4_000));
        assert!(outcome.best.fatigue() <= first);
        assert!(outcome.best.check_invariants().is_ok());
        for pair in outcome.stats.trace.windows(2) {
            assert!(pair[1].best <= pair[0].best);
        }
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let run = |seed| {
            engine(seed)
                .solve(mixed_problem(), &mut StepBudget::new(1_000))
                .unwrap()
                .best
                .to_solution()
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn test_solve_parallel() {
        let config = SearchConfig::default().with_seed(42);
        let outcome =
            solve_parallel(mixed_problem(), &config, 4, || StepBudget::new(1_000)).unwrap();
        assert!(outcome.best.check_invariants().is_ok());

        let single = engine(42)
            .solve(mixed_problem(), &mut StepBudget::new(1_000))
            .unwrap();
        assert!(outcome.best.fatigue() <= single.best.fatigue());
    }

    #[test]
    fn test_solve_parallel_reports_infeasibility() {
        let problem = Arc::new(Problem::from_matrix(1, vec![vec![43]]));
        let config = SearchConfig::default().with_seed(1);
        assert!(solve_parallel(problem, &config, 2, || StepBudget::new(10)).is_err());
    }

    #[test]
    fn test_config_serde_defaults() {
        let config: SearchConfig = serde_json::from_str(r#"{"seed": 5}"#).unwrap();
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.acceptance, AcceptanceKind::StrictDescent);
    }
}

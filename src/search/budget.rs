//! Search termination.
//!
//! The engine polls a [`SearchControl`] once per outer iteration, never
//! inside the retry loop. Polling must be cheap.
//!
//! [`TimeBudget`] is the wall-clock rule: it measures the mean time per
//! iteration so far and stops as soon as the time left no longer covers
//! one more iteration, so the last iteration does not overshoot the
//! deadline.

use std::time::{Duration, Instant};

/// Cooperative cancellation for the search loop.
pub trait SearchControl {
    /// Whether another iteration may start.
    fn should_continue(&mut self) -> bool;

    /// Elapsed fraction of the budget in `[0, 1]`.
    ///
    /// Budgets without a notion of progress report `0.0`.
    fn progress(&self) -> f64 {
        0.0
    }
}

/// Adaptive wall-clock budget.
#[derive(Debug, Clone)]
pub struct TimeBudget {
    start: Instant,
    limit: Duration,
    loop_start: Option<Instant>,
    steps: u64,
}

impl TimeBudget {
    /// A budget of `limit` starting now.
    pub fn new(limit: Duration) -> Self {
        Self::starting_at(Instant::now(), limit)
    }

    /// A budget of `limit` measured from `start`.
    ///
    /// Lets the caller count time spent before the search (reading input,
    /// seeding) against the same deadline.
    pub fn starting_at(start: Instant, limit: Duration) -> Self {
        Self {
            start,
            limit,
            loop_start: None,
            steps: 0,
        }
    }

    /// Iterations granted so far.
    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[inline]
    pub fn remaining(&self) -> Duration {
        self.limit.saturating_sub(self.elapsed())
    }

    /// Mean duration of one iteration, zero before the first one completes.
    pub fn time_per_step(&self) -> Duration {
        match self.loop_start {
            Some(loop_start) if self.steps > 0 => {
                loop_start.elapsed().div_f64(self.steps as f64)
            }
            _ => Duration::ZERO,
        }
    }
}

impl TimeBudget {
    /// The stopping rule evaluated at `now`.
    fn poll_at(&mut self, now: Instant) -> bool {
        let loop_start = *self.loop_start.get_or_insert(now);
        let elapsed = now.saturating_duration_since(self.start);
        if elapsed >= self.limit {
            return false;
        }
        if self.steps > 0 {
            let per_step = now
                .saturating_duration_since(loop_start)
                .div_f64(self.steps as f64);
            if self.limit - elapsed <= per_step {
                return false;
            }
        }
        self.steps += 1;
        true
    }
}

impl SearchControl for TimeBudget {
    #[inline]
    fn should_continue(&mut self) -> bool {
        self.poll_at(Instant::now())
    }

    fn progress(&self) -> f64 {
        if self.limit.is_zero() {
            return 1.0;
        }
        (self.elapsed().as_secs_f64() / self.limit.as_secs_f64()).min(1.0)
    }
}

/// A fixed number of iterations; deterministic, for tests and benchmarks.
#[derive(Debug, Clone, Copy)]
pub struct StepBudget {
    limit: u64,
    steps: u64,
}

impl StepBudget {
    pub fn new(limit: u64) -> Self {
        Self { limit, steps: 0 }
    }
}

impl SearchControl for StepBudget {
    #[inline]
    fn should_continue(&mut self) -> bool {
        if self.steps >= self.limit {
            return false;
        }
        self.steps += 1;
        true
    }

    fn progress(&self) -> f64 {
        if self.limit == 0 {
            1.0
        } else {
            self.steps as f64 / self.limit as f64
        }
    }
}

/// Adapts a plain `FnMut() -> bool` predicate.
pub struct FnControl<F>(pub F);

impl<F: FnMut() -> bool> SearchControl for FnControl<F> {
    #[inline]
    fn should_continue(&mut self) -> bool {
        (self.0)()
    }
}

//! Move acceptance policies.
//!
//! The engine applies a move, measures the fatigue delta and asks the
//! policy whether to keep it. Rejected moves are rolled back.
//!
//! - [`StrictDescent`]: keep iff `delta ≤ 0`. Ties are kept, which lets the
//!   search drift across plateaus.
//! - [`Metropolis`]: strict descent outside a progress window; inside it,
//!   uphill moves survive with probability `exp(−delta / T)`.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TimetableError};

/// Decides whether an applied move is kept.
pub trait AcceptancePolicy: Send {
    fn name(&self) -> &str;

    /// `progress` is the elapsed fraction of the search budget in `[0, 1]`.
    fn accept(&mut self, delta: i64, progress: f64, rng: &mut dyn RngCore) -> bool;
}

impl std::fmt::Display for dyn AcceptancePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Hill climbing with lateral moves.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictDescent;

impl AcceptancePolicy for StrictDescent {
    fn name(&self) -> &str {
        "StrictDescent"
    }

    #[inline]
    fn accept(&mut self, delta: i64, _progress: f64, _rng: &mut dyn RngCore) -> bool {
        delta <= 0
    }
}

/// Metropolis criterion at a fixed temperature, active only while
/// `window_start ≤ progress ≤ window_end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metropolis {
    temperature: f64,
    window_start: f64,
    window_end: f64,
}

impl Metropolis {
    pub const DEFAULT_TEMPERATURE: f64 = 0.5;
    pub const DEFAULT_WINDOW: (f64, f64) = (0.5, 0.7);

    /// # Errors
    /// [`TimetableError::InvalidConfig`] if `temperature` is not a positive
    /// finite number or the window is inverted.
    pub fn new(temperature: f64, window_start: f64, window_end: f64) -> Result<Self> {
        if !(temperature.is_finite() && temperature > 0.0) {
            return Err(TimetableError::InvalidConfig(format!(
                "temperature must be positive, got {temperature}"
            )));
        }
        if window_start.is_nan() || window_end.is_nan() || window_start > window_end {
            return Err(TimetableError::InvalidConfig(format!(
                "acceptance window [{window_start}, {window_end}] is inverted"
            )));
        }
        Ok(Self {
            temperature,
            window_start,
            window_end,
        })
    }

    #[inline]
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    #[inline]
    fn in_window(&self, progress: f64) -> bool {
        (self.window_start..=self.window_end).contains(&progress)
    }
}

impl Default for Metropolis {
    fn default() -> Self {
        let (window_start, window_end) = Self::DEFAULT_WINDOW;
        Self {
            temperature: Self::DEFAULT_TEMPERATURE,
            window_start,
            window_end,
        }
    }
}

impl AcceptancePolicy for Metropolis {
    fn name(&self) -> &str {
        "Metropolis"
    }

    fn accept(&mut self, delta: i64, progress: f64, rng: &mut dyn RngCore) -> bool {
        if delta <= 0 {
            return true;
        }
        if !self.in_window(progress) {
            return false;
        }
        let p = (-(delta as f64) / self.temperature).exp();
        p >= rng.random::<f64>()
    }
}

/// Serializable choice of acceptance policy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AcceptanceKind {
    #[default]
    StrictDescent,
    Metropolis {
        temperature: f64,
        window_start: f64,
        window_end: f64,
    },
}

impl AcceptanceKind {
    /// Metropolis with the stock temperature and window.
    pub fn metropolis() -> Self {
        let (window_start, window_end) = Metropolis::DEFAULT_WINDOW;
        Self::Metropolis {
            temperature: Metropolis::DEFAULT_TEMPERATURE,
            window_start,
            window_end,
        }
    }

    /// Instantiates the policy, rejecting out-of-range parameters.
    pub fn build(&self) -> Result<Box<dyn AcceptancePolicy>> {
        Ok(match *self {
            Self::StrictDescent => Box::new(StrictDescent),
            Self::Metropolis {
                temperature,
                window_start,
                window_end,
            } => Box::new(Metropolis::new(temperature, window_start, window_end)?),
        })
    }
}

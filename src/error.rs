//! Error types.
//!
//! Only structural problems and bad configuration surface as errors. Infeasible candidate moves
//! are an expected outcome of the search and are retried silently, and
//! state inconsistencies are reported by
//! [`ScheduleState::check_invariants`](crate::state::ScheduleState::check_invariants).

use thiserror::Error;

use crate::models::EntityKind;

/// Errors produced while reading or seeding a timetable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimetableError {
    /// The week does not have enough room-slots for all meetings.
    #[error("required load {required} exceeds weekly room capacity {capacity}")]
    CapacityExceeded { required: u64, capacity: u64 },

    /// A single group or professor needs more meetings than there are slots.
    #[error("{kind} {id} needs {required} classes but a week has only {capacity} slots")]
    EntityOverloaded {
        kind: EntityKind,
        id: u32,
        required: u32,
        capacity: u32,
    },

    /// Seeding could not place every meeting. Problems that pass the
    /// capacity checks always seed.
    #[error("seeding left {unscheduled} classes unscheduled")]
    SeedIncomplete { unscheduled: u64 },

    /// A configuration value outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed problem or solution text.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Result alias for timetable operations.
pub type Result<T> = std::result::Result<T, TimetableError>;

//! Timetabling domain models.
//!
//! Provides the immutable problem definition, the weekly grid
//! coordinates, and the solution (timetable) produced by the optimizer.
//!
//! # Domain Mappings
//!
//! | u-timetable | University | School | Training center |
//! |-------------|------------|--------|-----------------|
//! | Group | Student cohort | Class | Trainee batch |
//! | Professor | Lecturer | Teacher | Instructor |
//! | Slot | Lecture period | Lesson | Session |
//! | Room | Lecture hall | Classroom | Training room |

mod problem;
mod slot;
mod solution;

pub use problem::{EntityKind, Problem};
pub use slot::{
    Cell, EntityId, Move, Slot, CLASSES_PER_DAY, DAYS_PER_WEEK, SLOTS_PER_WEEK,
};
pub use solution::Solution;

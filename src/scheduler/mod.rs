//! Constructive seeding and timetable KPIs.
//!
//! # Algorithm
//!
//! `GreedySeeder` fills the week slot by slot with any (group, prof) pair
//! that still owes classes and is free in that slot, falling back to a
//! balanced edge coloring when the greedy pass comes up short. It is not
//! optimal, but provides a fast feasible starting point for the local search.
//!
//! # KPI
//!
//! `TimetableKpi` summarizes a finished timetable: fatigue split by side,
//! idle periods, room utilization and daily spans.

mod coloring;
mod greedy;
mod kpi;

pub use greedy::GreedySeeder;
pub use kpi::TimetableKpi;

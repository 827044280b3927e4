//! Timetable quality metrics (KPIs).
//!
//! Computes summary indicators from a finished timetable and its problem.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Total fatigue | Σ over entity-days of `(2 + span + 1)²` |
//! | Group / professor fatigue | The same sum restricted to one side |
//! | Idle periods | Free periods strictly inside an entity's daily run |
//! | Peak room utilization | Busiest slot's classes / rooms |
//! | Avg room utilization | Scheduled classes / (rooms × slots per week) |
//! | Avg daily span | Mean `last − first + 1` over non-empty entity-days |

use std::collections::HashMap;

use crate::fatigue::{self, DaySpan};
use crate::models::{EntityId, EntityKind, Problem, Slot, Solution};

/// Timetable performance indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct TimetableKpi {
    /// Total fatigue recomputed from the grid.
    pub total_fatigue: u32,
    /// Fatigue contributed by group-days.
    pub group_fatigue: u32,
    /// Fatigue contributed by professor-days.
    pub prof_fatigue: u32,
    /// Free periods inside group daily runs.
    pub group_idle_periods: u32,
    /// Free periods inside professor daily runs.
    pub prof_idle_periods: u32,
    /// Entity-days with at least one class.
    pub active_days: usize,
    /// Mean daily run length over active entity-days.
    pub avg_daily_span: f64,
    /// Busiest slot's occupancy as a fraction of the rooms (0.0..1.0).
    pub peak_room_utilization: f64,
    /// Scheduled classes as a fraction of weekly room-slots (0.0..1.0).
    pub avg_room_utilization: f64,
}

impl TimetableKpi {
    /// Computes KPIs from a timetable and its problem.
    pub fn calculate(problem: &Problem, solution: &Solution) -> Self {
        let spans: HashMap<(EntityKind, EntityId, u32), DaySpan> =
            fatigue::spans(solution.cells());

        let mut classes_per_day: HashMap<(EntityKind, EntityId, u32), u32> = HashMap::new();
        let mut per_slot: HashMap<Slot, u32> = HashMap::new();
        let mut scheduled: u64 = 0;
        for cell in solution.cells() {
            let day = cell.slot.day;
            *classes_per_day
                .entry((EntityKind::Group, cell.group, day))
                .or_default() += 1;
            *classes_per_day
                .entry((EntityKind::Professor, cell.prof, day))
                .or_default() += 1;
            *per_slot.entry(cell.slot).or_default() += 1;
            scheduled += 1;
        }

        let mut group_fatigue = 0;
        let mut prof_fatigue = 0;
        let mut group_idle = 0;
        let mut prof_idle = 0;
        let mut total_span: u64 = 0;
        for (key, &(first, last)) in &spans {
            let cost = fatigue::span_fatigue(first, last);
            let width = last - first + 1;
            let idle = width - classes_per_day.get(key).copied().unwrap_or(0);
            total_span += width as u64;
            match key.0 {
                EntityKind::Group => {
                    group_fatigue += cost;
                    group_idle += idle;
                }
                EntityKind::Professor => {
                    prof_fatigue += cost;
                    prof_idle += idle;
                }
            }
        }

        let rooms = problem.num_rooms();
        let peak = per_slot.values().copied().max().unwrap_or(0);
        let peak_room_utilization = if rooms == 0 {
            0.0
        } else {
            peak as f64 / rooms as f64
        };
        let capacity = problem.capacity();
        let avg_room_utilization = if capacity == 0 {
            0.0
        } else {
            scheduled as f64 / capacity as f64
        };
        let avg_daily_span = if spans.is_empty() {
            0.0
        } else {
            total_span as f64 / spans.len() as f64
        };

        Self {
            total_fatigue: group_fatigue + prof_fatigue,
            group_fatigue,
            prof_fatigue,
            group_idle_periods: group_idle,
            prof_idle_periods: prof_idle,
            active_days: spans.len(),
            avg_daily_span,
            peak_room_utilization,
            avg_room_utilization,
        }
    }

    /// Share of total fatigue carried by groups (0.0..1.0).
    pub fn group_share(&self) -> f64 {
        if self.total_fatigue == 0 {
            0.0
        } else {
            self.group_fatigue as f64 / self.total_fatigue as f64
        }
    }

    /// Whether no entity has a hole in any of its days.
    pub fn is_compact(&self) -> bool {
        self.group_idle_periods == 0 && self.prof_idle_periods == 0
    }
}

//! Offline timetable checker.
//!
//! Verifies a finished timetable against its problem. Detects:
//! - Declared fatigue differing from the recomputed value
//! - Slots using more rooms than exist
//! - Professors teaching two groups in one slot
//! - Professor ids outside the problem
//! - (group, prof) pairs with the wrong number of classes
//! - A timetable sized for a different number of groups
//!
//! Group exclusivity holds by construction: the timetable stores one
//! professor per (group, slot).

use std::collections::HashMap;
use std::fmt;

use crate::models::{EntityId, Problem, Slot, Solution};

/// A detected violation.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Violation category.
    pub kind: ViolationKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// Declared fatigue is not the recomputed fatigue.
    FatigueMismatch,
    /// More classes in a slot than rooms.
    RoomCapacityExceeded,
    /// A professor appears twice in a slot.
    ProfessorDoubleBooked,
    /// A professor id outside `1..=num_profs`.
    UnknownProfessor,
    /// A pair's class count differs from its requirement.
    RequirementMismatch,
    /// The timetable's group count differs from the problem's.
    ShapeMismatch,
}

impl Violation {
    fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Checks `solution` against `problem` and returns every violation found.
///
/// An empty result means the timetable is valid.
pub fn validate(problem: &Problem, solution: &Solution) -> Vec<Violation> {
    let mut violations = Vec::new();

    if solution.num_groups() != problem.num_groups() {
        violations.push(Violation::new(
            ViolationKind::ShapeMismatch,
            format!(
                "timetable has {} groups, problem has {}",
                solution.num_groups(),
                problem.num_groups()
            ),
        ));
        return violations;
    }

    let fatigue = solution.recompute_fatigue();
    if solution.fatigue != fatigue {
        violations.push(Violation::new(
            ViolationKind::FatigueMismatch,
            format!("expected fatigue {fatigue}, got {}", solution.fatigue),
        ));
    }

    for slot in Slot::all() {
        let mut rooms = 0;
        let mut teaching: HashMap<EntityId, EntityId> = HashMap::new();
        for g in problem.groups() {
            let prof = solution.prof_at(g, slot);
            if prof == 0 {
                continue;
            }
            rooms += 1;
            if prof > problem.num_profs() {
                violations.push(Violation::new(
                    ViolationKind::UnknownProfessor,
                    format!("group {g} has unknown professor {prof} on {slot}"),
                ));
            }
            if let Some(other) = teaching.insert(prof, g) {
                violations.push(Violation::new(
                    ViolationKind::ProfessorDoubleBooked,
                    format!("professor {prof} teaches groups {other} and {g} on {slot}"),
                ));
            }
        }
        if rooms > problem.num_rooms() {
            violations.push(Violation::new(
                ViolationKind::RoomCapacityExceeded,
                format!("too many rooms occupied on {slot}"),
            ));
        }
    }

    let mut classes: HashMap<(EntityId, EntityId), u32> = HashMap::new();
    for cell in solution.cells() {
        *classes.entry((cell.group, cell.prof)).or_default() += 1;
    }
    for g in problem.groups() {
        for p in problem.profs() {
            let expected = problem.required(g, p);
            let actual = classes.get(&(g, p)).copied().unwrap_or(0);
            if actual != expected {
                violations.push(Violation::new(
                    ViolationKind::RequirementMismatch,
                    format!("expected {expected} classes for (group={g}, prof={p}), got {actual}"),
                ));
            }
        }
    }

    violations
}

/// Whether `solution` passes every check.
pub fn is_valid(problem: &Problem, solution: &Solution) -> bool {
    validate(problem, solution).is_empty()
}

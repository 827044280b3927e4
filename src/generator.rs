//! Random problem generator.
//!
//! # Algorithm
//!
//! 1. Draw group, professor and room counts uniformly from `1..=max`.
//! 2. For each (group, prof) pair in order, draw a class count uniformly
//!    from `0..=min(group headroom, prof headroom)`, where headroom is the
//!    per-entity cap minus what the entity already has.
//! 3. Reject and redraw the whole instance while total demand exceeds
//!    `max_room_utilization` of the weekly room-slots.
//!
//! The utilization cap leaves the greedy seeder room to work with.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Problem;

/// Generator limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub max_groups: u32,
    pub max_profs: u32,
    pub max_rooms: u32,
    /// Weekly cap on classes for one group.
    pub max_classes_per_group: u32,
    /// Weekly cap on classes for one professor.
    pub max_classes_per_prof: u32,
    /// Upper bound on demand / (rooms × slots per week).
    pub max_room_utilization: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_groups: 60,
            max_profs: 60,
            max_rooms: 60,
            max_classes_per_group: 24,
            max_classes_per_prof: 24,
            max_room_utilization: 0.75,
        }
    }
}

impl GeneratorConfig {
    pub fn with_max_groups(mut self, max_groups: u32) -> Self {
        self.max_groups = max_groups;
        self
    }

    pub fn with_max_profs(mut self, max_profs: u32) -> Self {
        self.max_profs = max_profs;
        self
    }

    pub fn with_max_rooms(mut self, max_rooms: u32) -> Self {
        self.max_rooms = max_rooms;
        self
    }

    pub fn with_max_classes(mut self, per_group: u32, per_prof: u32) -> Self {
        self.max_classes_per_group = per_group;
        self.max_classes_per_prof = per_prof;
        self
    }

    pub fn with_max_room_utilization(mut self, utilization: f64) -> Self {
        self.max_room_utilization = utilization;
        self
    }
}

/// Draws a random problem satisfying `config`.
///
/// # Panics
/// If any `max_*` count is zero.
pub fn generate<R: Rng + ?Sized>(config: &GeneratorConfig, rng: &mut R) -> Problem {
    assert!(
        config.max_groups > 0 && config.max_profs > 0 && config.max_rooms > 0,
        "entity limits must be positive"
    );
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let num_groups = rng.random_range(1..=config.max_groups);
        let num_profs = rng.random_range(1..=config.max_profs);
        let num_rooms = rng.random_range(1..=config.max_rooms);

        let mut problem = Problem::new(num_groups, num_profs, num_rooms);
        let mut group_load = vec![0u32; num_groups as usize + 1];
        let mut prof_load = vec![0u32; num_profs as usize + 1];
        for g in 1..=num_groups {
            for p in 1..=num_profs {
                let headroom = config
                    .max_classes_per_group
                    .saturating_sub(group_load[g as usize])
                    .min(config.max_classes_per_prof.saturating_sub(prof_load[p as usize]));
                let count = rng.random_range(0..=headroom);
                problem.set_required(g, p, count);
                group_load[g as usize] += count;
                prof_load[p as usize] += count;
            }
        }

        if problem.room_utilization() <= config.max_room_utilization {
            debug!(
                attempts,
                groups = num_groups,
                profs = num_profs,
                rooms = num_rooms,
                utilization = problem.room_utilization(),
                "generated problem"
            );
            return problem;
        }
    }
}

//! Weekly class timetabling.
//!
//! Assigns the required (group, professor) meetings to the slots of a
//! 6-day × 7-period week under room, group and professor exclusivity,
//! minimizing *fatigue*: a quadratic penalty on how spread out each
//! entity's day is.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Problem`, `Slot`, `Cell`, `Move`, `Solution`
//! - **`fatigue`**: The pure cost model
//! - **`persistent`**: Copy-on-write treap maps backing the state
//! - **`edges`**: Randomized duplicate-free candidate set
//! - **`state`**: Incremental schedule state with exact rollback
//! - **`scheduler`**: Greedy seeding and timetable KPIs
//! - **`search`**: Anytime local search, acceptance policies, budgets
//! - **`validation`**: Offline timetable checker
//! - **`generator`**: Random instance generator
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use u_timetable::models::Problem;
//! use u_timetable::search::{self, LocalSearch, SearchConfig, StepBudget};
//! use u_timetable::validation;
//!
//! let problem = Arc::new(Problem::from_matrix(2, vec![vec![3, 2], vec![1, 4]]));
//! let mut engine = LocalSearch::new(SearchConfig::default().with_seed(1)).unwrap();
//! let outcome = engine.solve(problem.clone(), &mut StepBudget::new(1_000)).unwrap();
//!
//! let solution = outcome.best.to_solution();
//! assert_eq!(solution.fatigue, search::fatigue(&outcome.best));
//! assert!(validation::is_valid(&problem, &solution));
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Seidel & Aragon (1996), "Randomized Search Trees"
//! - Okasaki (1998), "Purely Functional Data Structures"

pub mod edges;
pub mod error;
pub mod fatigue;
pub mod generator;
pub mod models;
pub mod persistent;
pub mod scheduler;
pub mod search;
pub mod state;
pub mod validation;

pub use error::{Result, TimetableError};

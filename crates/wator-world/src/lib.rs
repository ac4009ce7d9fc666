//! Wa-Tor world engine.
//!
//! This module implements the toroidal grid where fish and sharks live, and the
//! parallel tick scheduler that advances it one generation at a time.

pub mod arbiter;
pub mod grid;
pub mod rules;
pub mod scheduler;
pub mod simulation;
pub mod topology;

pub use arbiter::ClaimTable;
pub use grid::Grid;
pub use rules::{PassOutput, Rules};
pub use scheduler::{Band, PartitionPlan, TickScheduler};
pub use simulation::{Simulation, SimulationSummary};

//! Configuration types for the simulation.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Simulation parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Side length of the square, edge-wrapping grid
    pub grid_size: i32,
    /// Chance (percent) that a cell starts as a fish
    pub fish_percentage: u32,
    /// Chance (percent) that a cell starts as a shark
    pub shark_percentage: u32,
    /// Moves a fish makes before it reproduces
    pub fish_breed_time: u32,
    /// Moves a shark makes before it reproduces
    pub shark_breed_time: u32,
    /// Moves a shark survives without eating
    pub shark_starve_time: u32,
    /// Number of row bands, one worker each
    pub worker_bands: usize,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_size: 333,
            fish_percentage: 50,
            shark_percentage: 20,
            fish_breed_time: 3,
            shark_breed_time: 8,
            shark_starve_time: 3,
            worker_bands: 16,
            seed: 0,
        }
    }
}

impl SimConfig {
    /// Reject configurations the engine cannot run.
    pub fn validate(&self) -> Result<()> {
        if self.grid_size <= 0 {
            return Err(Error::Validation(format!(
                "grid_size must be positive, got {}",
                self.grid_size
            )));
        }

        if self.fish_percentage.saturating_add(self.shark_percentage) > 100 {
            return Err(Error::Validation(format!(
                "fish_percentage + shark_percentage must not exceed 100, got {} + {}",
                self.fish_percentage, self.shark_percentage
            )));
        }

        if self.worker_bands == 0 || self.worker_bands > self.grid_size as usize {
            return Err(Error::Validation(format!(
                "worker_bands must be between 1 and grid_size ({}), got {}",
                self.grid_size, self.worker_bands
            )));
        }

        for (name, value) in [
            ("fish_breed_time", self.fish_breed_time),
            ("shark_breed_time", self.shark_breed_time),
            ("shark_starve_time", self.shark_starve_time),
        ] {
            if value == 0 {
                return Err(Error::Validation(format!("{name} must be at least 1")));
            }
        }

        Ok(())
    }
}

/// Ticks between population metric snapshots unless configured otherwise
pub const DEFAULT_METRICS_INTERVAL_TICKS: u64 = 100;

/// Headless runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Simulation parameters
    pub sim: SimConfig,
    /// Ticks to run; `None` runs until interrupted
    pub num_ticks: Option<u64>,
    /// Throughput sampling period (milliseconds)
    pub report_interval_ms: u64,
    /// Population metrics are emitted every this many ticks (0 disables)
    pub metrics_interval_ticks: u64,
    /// Emit logs as JSON lines instead of human-readable text
    pub json_logs: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            sim: SimConfig::default(),
            num_ticks: None,
            report_interval_ms: 500,
            metrics_interval_ticks: DEFAULT_METRICS_INTERVAL_TICKS,
            json_logs: false,
        }
    }
}

impl RunnerConfig {
    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: RunnerConfig = serde_json::from_str(&raw)?;
        config.sim.validate()?;
        Ok(config)
    }
}

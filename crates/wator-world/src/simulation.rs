//! Simulation host: owns the grid and the scheduler and advances them tick by tick.

use crate::grid::Grid;
use crate::scheduler::TickScheduler;
use parking_lot::RwLock;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, event, info, instrument, Level};
use wator_core::{
    Error, PopulationCounts, Result, SimConfig, TickStats, DEFAULT_METRICS_INTERVAL_TICKS,
};

pub struct Simulation {
    grid: Arc<RwLock<Grid>>,
    scheduler: TickScheduler,
    config: SimConfig,
    tick: u64,
    totals: TickStats,
    metrics_interval: u64,
}

impl Simulation {
    /// Seed a fresh grid from `config` and prepare the scheduler.
    pub fn new(config: SimConfig) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let grid = Grid::initialize(&config, &mut rng)?;
        let scheduler = TickScheduler::new(&config, ChaCha8Rng::seed_from_u64(rng.gen()))?;
        Ok(Self::assemble(config, grid, scheduler))
    }

    /// Start from an existing grid instead of a random one.
    pub fn from_grid(config: SimConfig, grid: Grid) -> Result<Self> {
        if grid.size() != config.grid_size {
            return Err(Error::InvalidState(format!(
                "grid of size {} does not match configured size {}",
                grid.size(),
                config.grid_size
            )));
        }
        let scheduler = TickScheduler::new(&config, ChaCha8Rng::seed_from_u64(config.seed))?;
        Ok(Self::assemble(config, grid, scheduler))
    }

    fn assemble(config: SimConfig, grid: Grid, scheduler: TickScheduler) -> Self {
        let population = grid.counts();
        debug!(
            grid_size = config.grid_size,
            bands = config.worker_bands,
            fish = population.fish,
            sharks = population.sharks,
            "Simulation created"
        );

        Self {
            grid: Arc::new(RwLock::new(grid)),
            scheduler,
            config,
            tick: 0,
            totals: TickStats::new(),
            metrics_interval: DEFAULT_METRICS_INTERVAL_TICKS,
        }
    }

    /// Emit population metrics every `ticks` ticks; 0 disables them.
    pub fn with_metrics_interval(mut self, ticks: u64) -> Self {
        self.metrics_interval = ticks;
        self
    }

    /// Shared handle to the current generation, for readers such as renderers.
    /// Ticks only take the write lock for the final swap.
    pub fn grid(&self) -> Arc<RwLock<Grid>> {
        self.grid.clone()
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Events accumulated over every tick so far
    pub fn totals(&self) -> TickStats {
        self.totals
    }

    pub fn population(&self) -> PopulationCounts {
        self.grid.read().counts()
    }

    /// Execute one simulation tick
    pub fn step(&mut self) -> Result<TickStats> {
        let stats = {
            let current = self.grid.read();
            self.scheduler.compute_next(&current)?
        };
        {
            let mut grid = self.grid.write();
            self.scheduler.swap_into(&mut grid);
        }

        self.tick += 1;
        self.totals += stats;

        if self.metrics_interval > 0 && self.tick % self.metrics_interval == 0 {
            self.emit_population_metrics(&stats);
        }

        Ok(stats)
    }

    /// Run the simulation for the specified number of ticks
    #[instrument(skip(self), fields(start_tick = self.tick))]
    pub fn run(&mut self, ticks: u64) -> Result<SimulationSummary> {
        info!("Running simulation for {} ticks", ticks);

        for _ in 0..ticks {
            self.step()?;
        }

        let summary = self.summary();
        info!(
            event = "run_summary",
            total_ticks = summary.total_ticks,
            fish = summary.population.fish,
            sharks = summary.population.sharks,
            births = summary.totals.births(),
            deaths = summary.totals.deaths(),
            "Run complete"
        );
        Ok(summary)
    }

    pub fn summary(&self) -> SimulationSummary {
        SimulationSummary {
            total_ticks: self.tick,
            population: self.population(),
            totals: self.totals,
        }
    }

    fn emit_population_metrics(&self, last: &TickStats) {
        let population = self.population();

        info!(
            event = "population_metrics",
            tick = self.tick,
            fish = population.fish,
            sharks = population.sharks,
            empty = population.empty,
            fish_births = last.fish_births,
            fish_eaten = last.fish_eaten,
            shark_births = last.shark_births,
            shark_starvations = last.shark_starvations,
            claim_conflicts = last.claim_conflicts,
            "Population metrics snapshot"
        );

        event!(
            Level::INFO,
            gauge_name = "population_fish",
            gauge_value = population.fish,
            tick = self.tick,
            "Fish population gauge"
        );

        event!(
            Level::INFO,
            gauge_name = "population_sharks",
            gauge_value = population.sharks,
            tick = self.tick,
            "Shark population gauge"
        );
    }
}

/// Outcome of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub total_ticks: u64,
    pub population: PopulationCounts,
    pub totals: TickStats,
}

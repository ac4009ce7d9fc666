//! Parallel tick scheduler.
//!
//! A tick runs two passes over the current generation, sharks first, then
//! fish. Each pass is split into row phases: rows that share a phase are at
//! least three rows apart on the torus, so no two movers in the same phase can
//! reach the same cell. Within a phase every band worker handles its own rows
//! of that phase, and the phase ends with a barrier. Each actor draws from its
//! own random stream, derived from the tick seed and its cell index. Together
//! these make the next generation independent of the band count and of how
//! the pool schedules the workers.

use crate::arbiter::ClaimTable;
use crate::grid::Grid;
use crate::rules::{PassOutput, Rules};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::ops::Range;
use tracing::{debug, trace};
use wator_core::{Error, Position, Result, SimConfig, TickStats};

/// Contiguous range of rows handled by one worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub start: i32,
    pub end: i32,
}

impl Band {
    pub fn rows(&self) -> Range<i32> {
        self.start..self.end
    }

    pub fn height(&self) -> i32 {
        self.end - self.start
    }
}

/// Disjoint bands covering every row exactly once, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionPlan {
    bands: Vec<Band>,
}

impl PartitionPlan {
    /// Split `size` rows into `band_count` bands. Leftover rows go one each to
    /// the first bands, so heights differ by at most one.
    pub fn new(size: i32, band_count: usize) -> Result<Self> {
        if size <= 0 || band_count == 0 || band_count > size as usize {
            return Err(Error::Validation(format!(
                "cannot split {} rows into {} bands",
                size, band_count
            )));
        }

        let base = size / band_count as i32;
        let mut remainder = size % band_count as i32;
        let mut start = 0;

        let bands = (0..band_count)
            .map(|_| {
                let mut height = base;
                if remainder > 0 {
                    height += 1;
                    remainder -= 1;
                }
                let band = Band {
                    start,
                    end: start + height,
                };
                start += height;
                band
            })
            .collect();

        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

/// Phase of row `y`: `y % 3` for the first `3 * (size / 3)` rows, then one
/// phase of its own for each leftover row so the wrap-around seam keeps the
/// three-row spacing.
pub fn row_phase(y: i32, size: i32) -> usize {
    let full = size - size % 3;
    if y < full {
        (y % 3) as usize
    } else {
        3 + (y - full) as usize
    }
}

pub fn row_phase_count(size: i32) -> usize {
    3 + (size % 3) as usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Sharks,
    Fish,
}

/// Owns the next-generation buffer, the claim table and the worker pool,
/// and advances a grid one tick at a time.
pub struct TickScheduler {
    size: i32,
    rules: Rules,
    plan: PartitionPlan,
    claims: ClaimTable,
    next: Grid,
    pool: rayon::ThreadPool,
    rng: ChaCha8Rng,
}

impl TickScheduler {
    pub fn new(config: &SimConfig, rng: ChaCha8Rng) -> Result<Self> {
        config.validate()?;
        let plan = PartitionPlan::new(config.grid_size, config.worker_bands)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_bands)
            .thread_name(|i| format!("wator-band-{i}"))
            .build()
            .map_err(|e| Error::ResourceExhausted(format!("worker pool: {e}")))?;

        debug!(
            grid_size = config.grid_size,
            bands = plan.len(),
            row_phases = row_phase_count(config.grid_size),
            "Tick scheduler ready"
        );

        Ok(Self {
            size: config.grid_size,
            rules: Rules::from_config(config),
            plan,
            claims: ClaimTable::new(config.grid_size),
            next: Grid::new(config.grid_size),
            pool,
            rng,
        })
    }

    pub fn plan(&self) -> &PartitionPlan {
        &self.plan
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    /// Claims granted during the most recent tick
    pub fn claims(&self) -> &ClaimTable {
        &self.claims
    }

    /// Advance `grid` by one generation.
    pub fn advance(&mut self, grid: &mut Grid) -> Result<TickStats> {
        let stats = self.compute_next(grid)?;
        self.swap_into(grid);
        Ok(stats)
    }

    /// Build the next generation from `current` into the scheduler's own
    /// buffer. `current` is only read.
    pub fn compute_next(&mut self, current: &Grid) -> Result<TickStats> {
        if current.size() != self.size {
            return Err(Error::InvalidState(format!(
                "grid of size {} given to a scheduler for size {}",
                current.size(),
                self.size
            )));
        }

        self.next.clear();
        self.claims.reset();
        let tick_seed: u64 = self.rng.gen();

        let mut stats = self.run_pass(current, Pass::Sharks, tick_seed);
        stats += self.run_pass(current, Pass::Fish, tick_seed);
        Ok(stats)
    }

    /// Swap the generation built by [`compute_next`](Self::compute_next) into
    /// `grid`. The old generation becomes the next tick's scratch buffer.
    pub fn swap_into(&mut self, grid: &mut Grid) {
        std::mem::swap(grid, &mut self.next);
    }

    fn run_pass(&mut self, current: &Grid, pass: Pass, tick_seed: u64) -> TickStats {
        let Self {
            size,
            rules,
            plan,
            claims,
            next,
            pool,
            ..
        } = self;
        let (rules, plan, claims, pool) = (&*rules, &*plan, &*claims, &*pool);
        let mut stats = TickStats::new();
        let mut writes = 0;

        for phase in 0..row_phase_count(*size) {
            let outputs: Vec<PassOutput> = pool.install(|| {
                plan.bands()
                    .par_iter()
                    .map(|band| run_band(rules, current, claims, band, phase, pass, tick_seed))
                    .collect()
            });

            for output in outputs {
                writes += output.writes.len();
                for (index, cell) in output.writes {
                    next.set_index(index, cell);
                }
                stats += output.stats;
            }
        }

        trace!(
            ?pass,
            writes,
            claim_conflicts = stats.claim_conflicts,
            "Pass complete"
        );
        stats
    }
}

/// One worker's share of a phase: the band's rows in that phase, row-major.
fn run_band(
    rules: &Rules,
    current: &Grid,
    claims: &ClaimTable,
    band: &Band,
    phase: usize,
    pass: Pass,
    tick_seed: u64,
) -> PassOutput {
    let size = current.size();
    let mut output = PassOutput::new();

    for y in band.rows().filter(|&y| row_phase(y, size) == phase) {
        for x in 0..size {
            let origin = Position::new(x, y);
            let cell = current.get(origin);
            let wanted = match pass {
                Pass::Sharks => cell.is_shark(),
                Pass::Fish => cell.is_fish(),
            };
            if !wanted {
                continue;
            }

            let mut rng = cell_rng(tick_seed, current.index_of(origin));
            match pass {
                Pass::Sharks => rules.update_shark(current, claims, origin, &mut rng, &mut output),
                Pass::Fish => rules.update_fish(current, claims, origin, &mut rng, &mut output),
            }
        }
    }

    output
}

/// Random stream for the actor at `index` during the tick seeded by `tick_seed`
fn cell_rng(tick_seed: u64, index: usize) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(tick_seed);
    rng.set_stream(index as u64);
    rng
}

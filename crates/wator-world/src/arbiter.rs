//! Tick-scoped claim table that arbitrates writes into the next generation.
//!
//! Every cell written during a tick must first be claimed here. A claim is a
//! single compare-and-swap on a per-cell flag, so among any number of workers
//! racing for the same position exactly one succeeds.

use std::sync::atomic::{AtomicBool, Ordering};
use wator_core::Position;

/// One "claimed" flag per grid cell
#[derive(Debug)]
pub struct ClaimTable {
    size: i32,
    claims: Vec<AtomicBool>,
}

impl ClaimTable {
    pub fn new(size: i32) -> Self {
        let len = (size.max(0) as usize).pow(2);
        Self {
            size,
            claims: (0..len).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    /// Clear every claim. Requires exclusive access, so it can never overlap
    /// a worker's `try_claim`.
    pub fn reset(&mut self) {
        for claim in &mut self.claims {
            *claim.get_mut() = false;
        }
    }

    /// Claim `pos` for the caller. Returns `false`, leaving the table
    /// untouched, if someone else got there first this tick.
    pub fn try_claim(&self, pos: Position) -> bool {
        self.claims[self.index_of(pos)]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_claimed(&self, pos: Position) -> bool {
        self.claims[self.index_of(pos)].load(Ordering::Acquire)
    }

    /// Number of positions claimed since the last reset
    pub fn claimed_count(&self) -> usize {
        self.claims
            .iter()
            .filter(|claim| claim.load(Ordering::Acquire))
            .count()
    }

    fn index_of(&self, pos: Position) -> usize {
        let wrapped = pos.wrap(self.size, self.size);
        (wrapped.y * self.size + wrapped.x) as usize
    }
}

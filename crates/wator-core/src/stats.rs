//! Population and per-tick event statistics.

use crate::CellKind;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Events recorded while building one generation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickStats {
    /// Fish that moved to a neighbouring cell
    pub fish_moves: u64,
    /// Fish left behind by a reproducing parent
    pub fish_births: u64,
    /// Fish whose cell was taken by a shark
    pub fish_eaten: u64,
    /// Sharks that moved (to eat or into an empty cell)
    pub shark_moves: u64,
    /// Sharks left behind by a reproducing parent
    pub shark_births: u64,
    /// Sharks that died of hunger
    pub shark_starvations: u64,
    /// Actors with nowhere to go
    pub stays: u64,
    /// Claims lost to another actor
    pub claim_conflicts: u64,
}

impl TickStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn births(&self) -> u64 {
        self.fish_births + self.shark_births
    }

    pub fn deaths(&self) -> u64 {
        self.fish_eaten + self.shark_starvations
    }
}

impl AddAssign for TickStats {
    fn add_assign(&mut self, other: TickStats) {
        self.fish_moves += other.fish_moves;
        self.fish_births += other.fish_births;
        self.fish_eaten += other.fish_eaten;
        self.shark_moves += other.shark_moves;
        self.shark_births += other.shark_births;
        self.shark_starvations += other.shark_starvations;
        self.stays += other.stays;
        self.claim_conflicts += other.claim_conflicts;
    }
}

/// Number of cells of each kind in a grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationCounts {
    pub empty: usize,
    pub fish: usize,
    pub sharks: usize,
}

impl PopulationCounts {
    pub fn record(&mut self, kind: CellKind) {
        match kind {
            CellKind::Empty => self.empty += 1,
            CellKind::Fish => self.fish += 1,
            CellKind::Shark => self.sharks += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.empty + self.fish + self.sharks
    }

    /// Population after a tick with the given events: only births, eaten fish
    /// and starved sharks change the head count.
    pub fn expected_after(&self, stats: &TickStats) -> PopulationCounts {
        let fish = (self.fish + stats.fish_births as usize).saturating_sub(stats.fish_eaten as usize);
        let sharks = (self.sharks + stats.shark_births as usize)
            .saturating_sub(stats.shark_starvations as usize);
        PopulationCounts {
            empty: self.total().saturating_sub(fish + sharks),
            fish,
            sharks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_accumulate() {
        let mut total = TickStats::new();
        total += TickStats {
            fish_births: 2,
            shark_starvations: 1,
            ..Default::default()
        };
        total += TickStats {
            fish_births: 1,
            fish_eaten: 4,
            claim_conflicts: 3,
            ..Default::default()
        };

        assert_eq!(total.fish_births, 3);
        assert_eq!(total.births(), 3);
        assert_eq!(total.deaths(), 5);
        assert_eq!(total.claim_conflicts, 3);
    }

    #[test]
    fn test_expected_population() {
        let before = PopulationCounts {
            empty: 50,
            fish: 30,
            sharks: 20,
        };
        let stats = TickStats {
            fish_births: 5,
            fish_eaten: 8,
            shark_births: 2,
            shark_starvations: 3,
            ..Default::default()
        };

        let after = before.expected_after(&stats);
        assert_eq!(after.fish, 27);
        assert_eq!(after.sharks, 19);
        assert_eq!(after.total(), 100);
    }
}

//! Shark and fish update rules.
//!
//! Both rules read only the current generation and record their results as
//! claimed writes into a [`PassOutput`]. A position is written only after the
//! [`ClaimTable`] has granted it to the caller.

use crate::arbiter::ClaimTable;
use crate::grid::Grid;
use rand::seq::SliceRandom;
use rand::Rng;
use wator_core::{Cell, Position, SimConfig, TickStats};

/// Writes and events produced by one worker during one pass
#[derive(Debug, Default)]
pub struct PassOutput {
    /// `(cell index, new state)` for every position this worker claimed
    pub writes: Vec<(usize, Cell)>,
    pub stats: TickStats,
}

impl PassOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, other: PassOutput) {
        self.writes.extend(other.writes);
        self.stats += other.stats;
    }

    /// Record a write into a position the caller already holds a claim on.
    fn write(&mut self, grid: &Grid, pos: Position, cell: Cell) {
        self.writes.push((grid.index_of(pos), cell));
    }

    /// Claim the actor's own cell and write into it.
    fn write_origin(&mut self, grid: &Grid, claims: &ClaimTable, origin: Position, cell: Cell) {
        // Nobody else targets an occupied origin: sharks claim fish or empty
        // cells, fish claim empty cells, and eaten fish never reach here.
        let claimed = claims.try_claim(origin);
        debug_assert!(claimed, "origin {origin:?} was claimed by another actor");
        if claimed {
            self.write(grid, origin, cell);
        } else {
            self.stats.claim_conflicts += 1;
        }
    }
}

/// Breeding and starvation periods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    pub fish_breed_time: u32,
    pub shark_breed_time: u32,
    pub shark_starve_time: u32,
}

impl Rules {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            fish_breed_time: config.fish_breed_time,
            shark_breed_time: config.shark_breed_time,
            shark_starve_time: config.shark_starve_time,
        }
    }

    /// Decide the fate of the shark at `origin`: eat a neighbouring fish if
    /// one can be claimed, otherwise move to a claimable empty neighbour
    /// (starving or breeding on the way), otherwise stay put.
    pub fn update_shark<R: Rng + ?Sized>(
        &self,
        current: &Grid,
        claims: &ClaimTable,
        origin: Position,
        rng: &mut R,
        out: &mut PassOutput,
    ) {
        let cell = *current.get(origin);
        let Cell::Shark {
            breed_countdown,
            starve_countdown,
        } = cell
        else {
            return;
        };

        let mut around = current.neighbors(origin);
        around.shuffle(rng);

        for &prey in &around {
            if !current.get(prey).is_fish() {
                continue;
            }
            if claims.try_claim(prey) {
                out.write(
                    current,
                    prey,
                    Cell::shark(breed_countdown.saturating_sub(1), self.shark_starve_time),
                );
                out.stats.fish_eaten += 1;
                out.stats.shark_moves += 1;
                return;
            }
            out.stats.claim_conflicts += 1;
        }

        let Some(dest) = claim_empty_neighbor(current, claims, &around, rng, &mut out.stats) else {
            out.write_origin(current, claims, origin, cell);
            out.stats.stays += 1;
            return;
        };

        let breed = breed_countdown.saturating_sub(1);
        let starve = starve_countdown.saturating_sub(1);
        out.stats.shark_moves += 1;

        if starve == 0 {
            out.write(current, dest, Cell::Empty);
            out.stats.shark_starvations += 1;
        } else if breed == 0 {
            out.write_origin(
                current,
                claims,
                origin,
                Cell::shark(self.shark_breed_time, self.shark_starve_time),
            );
            out.write(current, dest, Cell::shark(self.shark_breed_time, starve));
            out.stats.shark_births += 1;
        } else {
            out.write(current, dest, Cell::shark(breed, starve));
        }
    }

    /// Decide the fate of the fish at `origin`: move to a claimable empty
    /// neighbour (breeding on the way) or stay put. Fish eaten earlier in the
    /// tick are skipped.
    pub fn update_fish<R: Rng + ?Sized>(
        &self,
        current: &Grid,
        claims: &ClaimTable,
        origin: Position,
        rng: &mut R,
        out: &mut PassOutput,
    ) {
        let cell = *current.get(origin);
        let Cell::Fish { breed_countdown } = cell else {
            return;
        };

        // A shark claimed this cell during the shark pass
        if claims.is_claimed(origin) {
            return;
        }

        let around = current.neighbors(origin);
        let Some(dest) = claim_empty_neighbor(current, claims, &around, rng, &mut out.stats) else {
            out.write_origin(current, claims, origin, cell);
            out.stats.stays += 1;
            return;
        };

        let breed = breed_countdown.saturating_sub(1);
        out.stats.fish_moves += 1;

        if breed == 0 {
            out.write_origin(current, claims, origin, Cell::fish(self.fish_breed_time));
            out.write(current, dest, Cell::fish(self.fish_breed_time));
            out.stats.fish_births += 1;
        } else {
            out.write(current, dest, Cell::fish(breed));
        }
    }
}

/// Pick uniformly among the neighbours that are empty in `current` and still
/// unclaimed, and claim the pick. A candidate lost to a concurrent claim is
/// dropped and the pick repeats over the rest.
fn claim_empty_neighbor<R: Rng + ?Sized>(
    current: &Grid,
    claims: &ClaimTable,
    around: &[Position; 4],
    rng: &mut R,
    stats: &mut TickStats,
) -> Option<Position> {
    let mut candidates = [Position::new(0, 0); 4];
    let mut len = 0;
    for &pos in around {
        if current.get(pos).is_empty() && !claims.is_claimed(pos) {
            candidates[len] = pos;
            len += 1;
        }
    }

    while len > 0 {
        let pick = rng.gen_range(0..len);
        let pos = candidates[pick];
        len -= 1;
        candidates.swap(pick, len);

        if claims.try_claim(pos) {
            return Some(pos);
        }
        stats.claim_conflicts += 1;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const RULES: Rules = Rules {
        fish_breed_time: 3,
        shark_breed_time: 8,
        shark_starve_time: 3,
    };

    fn apply(size: i32, out: PassOutput) -> Grid {
        let mut next = Grid::new(size);
        for (index, cell) in out.writes {
            next.set_index(index, cell);
        }
        next
    }

    fn is_neighbor(grid: &Grid, a: Position, b: Position) -> bool {
        grid.neighbors(a).contains(&b)
    }

    #[test]
    fn test_shark_eats_adjacent_fish() {
        let mut grid = Grid::new(5);
        let origin = Position::new(2, 2);
        grid.set(origin, Cell::shark(5, 1));
        grid.set(Position::new(2, 1), Cell::fish(2));

        let claims = ClaimTable::new(5);
        let mut out = PassOutput::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        RULES.update_shark(&grid, &claims, origin, &mut rng, &mut out);

        assert_eq!(out.stats.fish_eaten, 1);
        let next = apply(5, out);
        assert_eq!(*next.get(Position::new(2, 1)), Cell::shark(4, 3));
        assert_eq!(*next.get(origin), Cell::Empty);
    }

    #[test]
    fn test_shark_skips_claimed_fish() {
        let mut grid = Grid::new(5);
        let origin = Position::new(2, 2);
        grid.set(origin, Cell::shark(5, 3));
        grid.set(Position::new(2, 1), Cell::fish(2));

        let claims = ClaimTable::new(5);
        assert!(claims.try_claim(Position::new(2, 1)));

        let mut out = PassOutput::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        RULES.update_shark(&grid, &claims, origin, &mut rng, &mut out);

        assert_eq!(out.stats.fish_eaten, 0);
        assert_eq!(out.stats.claim_conflicts, 1);
        assert_eq!(out.stats.shark_moves, 1);

        let next = apply(5, out);
        let (dest, cell) = next.iter().find(|(_, c)| c.is_shark()).unwrap();
        assert!(is_neighbor(&grid, origin, dest));
        assert_ne!(dest, Position::new(2, 1));
        assert_eq!(*cell, Cell::shark(4, 2));
    }

    #[test]
    fn test_shark_starves() {
        let mut grid = Grid::new(5);
        let origin = Position::new(0, 0);
        grid.set(origin, Cell::shark(5, 1));

        let claims = ClaimTable::new(5);
        let mut out = PassOutput::new();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        RULES.update_shark(&grid, &claims, origin, &mut rng, &mut out);

        assert_eq!(out.stats.shark_starvations, 1);
        // The destination was claimed and written empty
        assert_eq!(out.writes.len(), 1);
        assert_eq!(out.writes[0].1, Cell::Empty);
        assert_eq!(apply(5, out).counts().sharks, 0);
    }

    #[test]
    fn test_shark_breeds() {
        let mut grid = Grid::new(5);
        let origin = Position::new(4, 4);
        grid.set(origin, Cell::shark(1, 3));

        let claims = ClaimTable::new(5);
        let mut out = PassOutput::new();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        RULES.update_shark(&grid, &claims, origin, &mut rng, &mut out);

        assert_eq!(out.stats.shark_births, 1);
        let next = apply(5, out);
        assert_eq!(*next.get(origin), Cell::shark(8, 3));
        let moved: Vec<_> = next
            .iter()
            .filter(|(pos, cell)| *pos != origin && cell.is_shark())
            .collect();
        assert_eq!(moved.len(), 1);
        assert!(is_neighbor(&grid, origin, moved[0].0));
        assert_eq!(*moved[0].1, Cell::shark(8, 2));
    }

    #[test]
    fn test_boxed_in_shark_stays() {
        let mut grid = Grid::new(3);
        let origin = Position::new(1, 1);
        grid.set(origin, Cell::shark(4, 1));
        for pos in grid.neighbors(origin) {
            grid.set(pos, Cell::shark(8, 3));
        }

        let claims = ClaimTable::new(3);
        let mut out = PassOutput::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        RULES.update_shark(&grid, &claims, origin, &mut rng, &mut out);

        // Counters are untouched when the shark cannot move
        assert_eq!(out.stats.stays, 1);
        assert_eq!(*apply(3, out).get(origin), Cell::shark(4, 1));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "claimed by another actor")]
    fn test_lost_origin_claim_is_loud() {
        let mut grid = Grid::new(3);
        let origin = Position::new(1, 1);
        grid.set(origin, Cell::shark(4, 2));
        for pos in grid.neighbors(origin) {
            grid.set(pos, Cell::shark(8, 3));
        }

        // Nothing may claim an occupied origin ahead of its actor
        let claims = ClaimTable::new(3);
        assert!(claims.try_claim(origin));

        let mut out = PassOutput::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        RULES.update_shark(&grid, &claims, origin, &mut rng, &mut out);
    }

    #[test]
    fn test_fish_moves_and_breeds() {
        let mut grid = Grid::new(6);
        let origin = Position::new(0, 5);
        grid.set(origin, Cell::fish(1));

        let claims = ClaimTable::new(6);
        let mut out = PassOutput::new();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        RULES.update_fish(&grid, &claims, origin, &mut rng, &mut out);

        assert_eq!(out.stats.fish_births, 1);
        let next = apply(6, out);
        assert_eq!(next.counts().fish, 2);
        assert_eq!(*next.get(origin), Cell::fish(3));
        let (dest, cell) = next.iter().find(|(pos, c)| *pos != origin && c.is_fish()).unwrap();
        assert!(is_neighbor(&grid, origin, dest));
        assert_eq!(*cell, Cell::fish(3));
    }

    #[test]
    fn test_fish_moves_without_breeding() {
        let mut grid = Grid::new(6);
        let origin = Position::new(3, 3);
        grid.set(origin, Cell::fish(3));

        let claims = ClaimTable::new(6);
        let mut out = PassOutput::new();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        RULES.update_fish(&grid, &claims, origin, &mut rng, &mut out);

        let next = apply(6, out);
        assert_eq!(*next.get(origin), Cell::Empty);
        assert_eq!(next.counts().fish, 1);
        let (dest, cell) = next.iter().find(|(_, c)| c.is_fish()).unwrap();
        assert!(is_neighbor(&grid, origin, dest));
        assert_eq!(*cell, Cell::fish(2));
    }

    #[test]
    fn test_eaten_fish_is_skipped() {
        let mut grid = Grid::new(4);
        let origin = Position::new(1, 1);
        grid.set(origin, Cell::fish(3));

        let claims = ClaimTable::new(4);
        assert!(claims.try_claim(origin));

        let mut out = PassOutput::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        RULES.update_fish(&grid, &claims, origin, &mut rng, &mut out);

        assert!(out.writes.is_empty());
        assert_eq!(out.stats, TickStats::default());
    }

    #[test]
    fn test_fish_stays_when_neighbours_taken() {
        let mut grid = Grid::new(4);
        let origin = Position::new(2, 2);
        grid.set(origin, Cell::fish(2));

        let claims = ClaimTable::new(4);
        for pos in grid.neighbors(origin) {
            assert!(claims.try_claim(pos));
        }

        let mut out = PassOutput::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        RULES.update_fish(&grid, &claims, origin, &mut rng, &mut out);

        assert_eq!(out.stats.stays, 1);
        assert_eq!(*apply(4, out).get(origin), Cell::fish(2));
    }

    #[test]
    fn test_empty_pick_covers_all_candidates() {
        let grid = Grid::new(5);
        let origin = Position::new(2, 2);
        let around = grid.neighbors(origin);
        let mut seen = std::collections::HashSet::new();

        for seed in 0..64 {
            let claims = ClaimTable::new(5);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut stats = TickStats::new();
            let dest = claim_empty_neighbor(&grid, &claims, &around, &mut rng, &mut stats).unwrap();
            assert!(claims.is_claimed(dest));
            seen.insert(dest);
        }

        assert_eq!(seen.len(), 4);
    }
}

//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};

/// 2D position in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn add(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Apply toroidal wrapping for given world dimensions
    pub fn wrap(&self, width: i32, height: i32) -> Self {
        Self {
            x: ((self.x % width) + width) % width,
            y: ((self.y % height) + height) % height,
        }
    }
}

/// Direction for movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub fn to_delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::South => (0, 1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }

    pub fn all() -> [Direction; 4] {
        [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ]
    }
}

/// Tag of a cell, without its counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Empty,
    Fish,
    Shark,
}

/// Cell state.
///
/// Countdowns are unsigned; every decrement in the rules saturates at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Fish {
        breed_countdown: u32,
    },
    Shark {
        breed_countdown: u32,
        starve_countdown: u32,
    },
}

impl Cell {
    pub fn fish(breed_countdown: u32) -> Self {
        Cell::Fish { breed_countdown }
    }

    pub fn shark(breed_countdown: u32, starve_countdown: u32) -> Self {
        Cell::Shark {
            breed_countdown,
            starve_countdown,
        }
    }

    pub fn kind(&self) -> CellKind {
        match self {
            Cell::Empty => CellKind::Empty,
            Cell::Fish { .. } => CellKind::Fish,
            Cell::Shark { .. } => CellKind::Shark,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    pub fn is_fish(&self) -> bool {
        matches!(self, Cell::Fish { .. })
    }

    pub fn is_shark(&self) -> bool {
        matches!(self, Cell::Shark { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_wrap() {
        let pos = Position::new(5, 5);
        let wrapped = pos.wrap(10, 10);
        assert_eq!(wrapped, Position::new(5, 5));

        let pos = Position::new(-1, -1);
        let wrapped = pos.wrap(10, 10);
        assert_eq!(wrapped, Position::new(9, 9));

        let pos = Position::new(10, 10);
        let wrapped = pos.wrap(10, 10);
        assert_eq!(wrapped, Position::new(0, 0));

        // Far out of range still lands inside the grid
        let pos = Position::new(-23, 47);
        let wrapped = pos.wrap(10, 10);
        assert_eq!(wrapped, Position::new(7, 7));
    }

    #[test]
    fn test_direction_delta() {
        assert_eq!(Direction::North.to_delta(), (0, -1));
        assert_eq!(Direction::South.to_delta(), (0, 1));
        assert_eq!(Direction::East.to_delta(), (1, 0));
        assert_eq!(Direction::West.to_delta(), (-1, 0));
    }

    #[test]
    fn test_cell_kind() {
        assert_eq!(Cell::default(), Cell::Empty);
        assert_eq!(Cell::Empty.kind(), CellKind::Empty);
        assert_eq!(Cell::fish(3).kind(), CellKind::Fish);
        assert_eq!(Cell::shark(8, 3).kind(), CellKind::Shark);

        assert!(Cell::Empty.is_empty());
        assert!(Cell::fish(1).is_fish());
        assert!(!Cell::fish(1).is_shark());
        assert!(Cell::shark(1, 1).is_shark());
    }

    #[test]
    fn test_cell_serialization() {
        let cell = Cell::shark(8, 2);
        let json = serde_json::to_string(&cell).unwrap();
        let deserialized: Cell = serde_json::from_str(&json).unwrap();
        assert_eq!(cell, deserialized);
    }
}

//! 2D grid for the world.

use crate::topology;
use rand::Rng;
use serde::{Deserialize, Serialize};
use wator_core::{Cell, Error, PopulationCounts, Position, Result, SimConfig};

/// A square toroidal grid of cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridSnapshot")]
pub struct Grid {
    size: i32,
    cells: Vec<Cell>,
}

/// Unchecked wire form of a [`Grid`]
#[derive(Deserialize)]
struct GridSnapshot {
    size: i32,
    cells: Vec<Cell>,
}

impl TryFrom<GridSnapshot> for Grid {
    type Error = Error;

    fn try_from(snapshot: GridSnapshot) -> Result<Self> {
        Grid::from_cells(snapshot.size, snapshot.cells)
    }
}

impl Grid {
    /// An all-empty grid. `size` must be positive.
    pub fn new(size: i32) -> Self {
        let len = (size.max(0) as usize).pow(2);
        Self {
            size,
            cells: vec![Cell::Empty; len],
        }
    }

    /// Build a grid from row-major cells.
    pub fn from_cells(size: i32, cells: Vec<Cell>) -> Result<Self> {
        if size <= 0 || cells.len() != (size as usize).pow(2) {
            return Err(Error::InvalidState(format!(
                "{} cells cannot form a {}x{} grid",
                cells.len(),
                size,
                size
            )));
        }
        Ok(Self { size, cells })
    }

    /// Seed a grid from configuration, one independent draw per cell
    pub fn initialize<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        let mut grid = Self::new(config.grid_size);

        for cell in &mut grid.cells {
            let roll = rng.gen_range(0..100);

            *cell = if roll < config.fish_percentage {
                Cell::fish(config.fish_breed_time)
            } else if roll < config.fish_percentage + config.shark_percentage {
                Cell::shark(config.shark_breed_time, config.shark_starve_time)
            } else {
                Cell::Empty
            };
        }

        Ok(grid)
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Get cell at position (with toroidal wrapping)
    pub fn get(&self, pos: Position) -> &Cell {
        &self.cells[self.index_of(pos)]
    }

    /// Set cell at position
    pub fn set(&mut self, pos: Position, cell: Cell) {
        let index = self.index_of(pos);
        self.cells[index] = cell;
    }

    pub(crate) fn set_index(&mut self, index: usize, cell: Cell) {
        self.cells[index] = cell;
    }

    /// Reset every cell to empty, keeping the allocation
    pub fn clear(&mut self) {
        self.cells.fill(Cell::Empty);
    }

    /// The four wrapped neighbours of a position
    pub fn neighbors(&self, pos: Position) -> [Position; 4] {
        topology::neighbors(pos, self.size)
    }

    /// Row-major index of a position, after wrapping
    pub fn index_of(&self, pos: Position) -> usize {
        let wrapped = pos.wrap(self.size, self.size);
        (wrapped.y * self.size + wrapped.x) as usize
    }

    /// Get position from index
    pub fn position_of(&self, index: usize) -> Position {
        let x = (index as i32) % self.size;
        let y = (index as i32) / self.size;
        Position::new(x, y)
    }

    /// Cells of one row, left to right
    pub fn row(&self, y: i32) -> &[Cell] {
        let y = y.rem_euclid(self.size) as usize;
        let width = self.size as usize;
        &self.cells[y * width..(y + 1) * width]
    }

    /// All cells in row-major order
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Iterator over all cells with positions
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (self.position_of(i), cell))
    }

    /// Count the cells of each kind
    pub fn counts(&self) -> PopulationCounts {
        let mut counts = PopulationCounts::default();
        for cell in &self.cells {
            counts.record(cell.kind());
        }
        counts
    }
}

//! Neighbourhoods on the torus.

use wator_core::{Direction, Position};

/// The four orthogonal neighbours of `pos` on a square torus of side `size`,
/// in [`Direction::all`] order. `pos` may lie outside the grid. Callers that
/// need an unbiased order must shuffle the result themselves.
pub fn neighbors(pos: Position, size: i32) -> [Position; 4] {
    let pos = pos.wrap(size, size);
    Direction::all().map(|direction| {
        let (dx, dy) = direction.to_delta();
        pos.add(dx, dy).wrap(size, size)
    })
}

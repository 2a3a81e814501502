#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Walkable tile grid shared by the pathfinding and collision systems.

use rand::{seq::index::sample, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tilewalk_core::{GridPosition, TileType};

/// Reasons a grid operation may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// Both dimensions must be at least one cell.
    #[error("grid dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions {
        /// Requested number of columns.
        width: u32,
        /// Requested number of rows.
        height: u32,
    },
    /// The addressed cell lies outside the grid.
    #[error("cell {0:?} lies outside the grid")]
    OutOfBounds(GridPosition),
}

/// Single tile of the grid.
///
/// Walkability is cached next to the tile type and recomputed whenever the
/// type changes, so the two never diverge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    tile: TileType,
    walkable: bool,
}

impl Cell {
    /// Creates a cell holding the provided tile type.
    #[must_use]
    pub const fn new(tile: TileType) -> Self {
        Self {
            tile,
            walkable: tile.is_walkable(),
        }
    }

    /// Tile type stored in the cell.
    #[must_use]
    pub const fn tile(&self) -> TileType {
        self.tile
    }

    /// Whether agents may stand on the cell.
    #[must_use]
    pub const fn is_walkable(&self) -> bool {
        self.walkable
    }

    fn set_tile(&mut self, tile: TileType) {
        self.tile = tile;
        self.walkable = tile.is_walkable();
    }
}

/// Fixed-size 2D array of cells stored in row-major order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Builds a grid whose boundary cells are walls and whose interior is floor.
    pub fn bordered(width: u32, height: u32) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyDimensions { width, height });
        }

        let mut cells = Vec::with_capacity(width as usize * height as usize);
        for row in 0..height {
            for column in 0..width {
                let border = column == 0 || row == 0 || column == width - 1 || row == height - 1;
                cells.push(Cell::new(if border {
                    TileType::Wall
                } else {
                    TileType::Floor
                }));
            }
        }

        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Builds a bordered grid and scatters `count` wall pillars inside it.
    ///
    /// Pillar cells are distinct interior cells drawn from a `ChaCha8Rng`
    /// seeded with `seed`, so equal arguments always produce equal grids. The
    /// count is clamped to the number of interior cells.
    pub fn with_pillars(width: u32, height: u32, count: usize, seed: u64) -> Result<Self, GridError> {
        let mut grid = Self::bordered(width, height)?;
        let interior_width = width.saturating_sub(2) as usize;
        let interior_height = height.saturating_sub(2) as usize;
        let interior = interior_width * interior_height;
        let count = count.min(interior);
        if count == 0 {
            return Ok(grid);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for index in sample(&mut rng, interior, count).into_iter() {
            let column = (index % interior_width) as i32 + 1;
            let row = (index / interior_width) as i32 + 1;
            grid.set_tile(GridPosition::new(column, row), TileType::Wall)?;
        }

        Ok(grid)
    }

    /// Number of columns in the grid.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows in the grid.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Reports whether `cell` lies inside the grid.
    #[must_use]
    pub fn contains(&self, cell: GridPosition) -> bool {
        self.index(cell).is_some()
    }

    /// Cell stored at `cell`, if it lies inside the grid.
    #[must_use]
    pub fn cell(&self, cell: GridPosition) -> Option<&Cell> {
        self.index(cell).and_then(|index| self.cells.get(index))
    }

    /// Reports whether `cell` is inside the grid and walkable.
    #[must_use]
    pub fn is_walkable(&self, cell: GridPosition) -> bool {
        self.cell(cell).is_some_and(Cell::is_walkable)
    }

    /// Reports whether `cell` is inside the grid and holds a wall.
    #[must_use]
    pub fn is_wall(&self, cell: GridPosition) -> bool {
        self.cell(cell)
            .is_some_and(|cell| cell.tile() == TileType::Wall)
    }

    /// Changes the tile type stored at `cell`.
    pub fn set_tile(&mut self, cell: GridPosition, tile: TileType) -> Result<(), GridError> {
        let index = self.index(cell).ok_or(GridError::OutOfBounds(cell))?;
        self.cells[index].set_tile(tile);
        Ok(())
    }

    /// Iterates over every cell together with its coordinate in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridPosition, &Cell)> + '_ {
        let width = self.width as usize;
        self.cells.iter().enumerate().map(move |(index, cell)| {
            let position = GridPosition::new((index % width) as i32, (index / width) as i32);
            (position, cell)
        })
    }

    /// Row-major index of `cell`, if it lies inside the grid.
    #[must_use]
    pub fn index(&self, cell: GridPosition) -> Option<usize> {
        let column = u32::try_from(cell.column()).ok()?;
        let row = u32::try_from(cell.row()).ok()?;
        if column >= self.width || row >= self.height {
            return None;
        }
        Some(row as usize * self.width as usize + column as usize)
    }

    /// Number of cells stored in the grid.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the grid holds no cells, which construction rules out.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bordered_grid_walls_the_perimeter() {
        let grid = Grid::bordered(5, 4).expect("grid");

        for (position, cell) in grid.iter() {
            let border = position.column() == 0
                || position.row() == 0
                || position.column() == 4
                || position.row() == 3;
            assert_eq!(cell.tile() == TileType::Wall, border, "{position:?}");
            assert_eq!(cell.is_walkable(), !border);
        }
    }

    #[test]
    fn rejects_empty_dimensions() {
        assert_eq!(
            Grid::bordered(0, 3),
            Err(GridError::EmptyDimensions {
                width: 0,
                height: 3
            })
        );
    }

    #[test]
    fn set_tile_recomputes_walkability() {
        let mut grid = Grid::bordered(4, 4).expect("grid");
        let cell = GridPosition::new(1, 2);
        assert!(grid.is_walkable(cell));

        grid.set_tile(cell, TileType::Wall).expect("in bounds");
        assert!(!grid.is_walkable(cell));
        assert!(grid.is_wall(cell));

        grid.set_tile(cell, TileType::Floor).expect("in bounds");
        assert!(grid.is_walkable(cell));
    }

    #[test]
    fn set_tile_rejects_out_of_bounds() {
        let mut grid = Grid::bordered(3, 3).expect("grid");
        let outside = GridPosition::new(-1, 0);
        assert_eq!(
            grid.set_tile(outside, TileType::Floor),
            Err(GridError::OutOfBounds(outside))
        );
        assert!(!grid.is_walkable(outside));
        assert!(!grid.contains(GridPosition::new(3, 0)));
    }

    #[test]
    fn pillars_are_deterministic_and_interior() {
        let first = Grid::with_pillars(12, 10, 15, 7).expect("grid");
        let second = Grid::with_pillars(12, 10, 15, 7).expect("grid");
        assert_eq!(first, second);

        let bordered = Grid::bordered(12, 10).expect("grid");
        let walls = |grid: &Grid| grid.iter().filter(|(_, cell)| !cell.is_walkable()).count();
        assert_eq!(walls(&first), walls(&bordered) + 15);
    }

    #[test]
    fn pillar_count_is_clamped_to_interior() {
        let grid = Grid::with_pillars(4, 4, 100, 1).expect("grid");
        assert!(grid.iter().all(|(_, cell)| !cell.is_walkable()));
    }
}

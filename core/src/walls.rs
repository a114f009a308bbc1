//! Edge topology of the maze grid.

use serde::{Deserialize, Serialize};

use crate::{CellCoord, Direction, GridSize, LayoutError};

/// Blocked flags for the four sides of a single cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WallSides {
    /// Wall shared with the cell above.
    pub top: bool,
    /// Wall shared with the cell to the right.
    pub right: bool,
    /// Wall shared with the cell below.
    pub bottom: bool,
    /// Wall shared with the cell to the left.
    pub left: bool,
}

impl WallSides {
    /// A cell without any walls.
    pub const OPEN: Self = Self {
        top: false,
        right: false,
        bottom: false,
        left: false,
    };

    /// A cell walled in on every side.
    pub const CLOSED: Self = Self {
        top: true,
        right: true,
        bottom: true,
        left: true,
    };

    /// A cell walled in on every side except `direction`.
    #[must_use]
    pub fn open_only(direction: Direction) -> Self {
        let mut sides = Self::CLOSED;
        sides.set(direction, false);
        sides
    }

    /// Reports whether the side facing `direction` is blocked.
    #[must_use]
    pub const fn is_blocked(&self, direction: Direction) -> bool {
        match direction {
            Direction::North => self.top,
            Direction::East => self.right,
            Direction::South => self.bottom,
            Direction::West => self.left,
        }
    }

    /// Sets or clears the side facing `direction`.
    pub fn set(&mut self, direction: Direction, blocked: bool) {
        let side = match direction {
            Direction::North => &mut self.top,
            Direction::East => &mut self.right,
            Direction::South => &mut self.bottom,
            Direction::West => &mut self.left,
        };
        *side = blocked;
    }

    /// Number of blocked sides.
    #[must_use]
    pub fn blocked_count(&self) -> usize {
        Direction::ALL
            .into_iter()
            .filter(|direction| self.is_blocked(*direction))
            .count()
    }
}

/// Sparse wire representation of one cell's walls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WallRecord {
    /// Zero-based row of the cell.
    pub row: u32,
    /// Zero-based column of the cell.
    pub col: u32,
    /// Blocked sides of the cell.
    pub walls: WallSides,
}

impl WallRecord {
    /// Coordinate the record describes.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        CellCoord::new(self.col, self.row)
    }
}

/// Dense, row-major wall model covering every cell of a square grid.
///
/// Each cell stores its own four sides. Two neighbouring cells can disagree
/// about the edge between them; [`WallLayout::is_blocked`] treats the edge as
/// blocked when either side says so.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WallLayout {
    size: GridSize,
    cells: Vec<WallSides>,
}

impl WallLayout {
    /// Creates a layout without any walls.
    #[must_use]
    pub fn open(size: GridSize) -> Self {
        Self::filled(size, WallSides::OPEN)
    }

    /// Creates a layout where every side of every cell is blocked.
    #[must_use]
    pub fn closed(size: GridSize) -> Self {
        Self::filled(size, WallSides::CLOSED)
    }

    fn filled(size: GridSize, sides: WallSides) -> Self {
        Self {
            size,
            cells: vec![sides; size.cell_count()],
        }
    }

    /// Builds a layout from sparse records; cells without a record are open.
    ///
    /// When a cell is listed more than once the first record wins.
    pub fn from_records(size: GridSize, records: &[WallRecord]) -> Result<Self, LayoutError> {
        let mut layout = Self::open(size);
        let mut seen = vec![false; size.cell_count()];

        for record in records {
            let cell = record.cell();
            let index = size
                .index(cell)
                .ok_or_else(|| LayoutError::out_of_bounds(cell, size))?;
            if seen[index] {
                continue;
            }
            seen[index] = true;
            layout.cells[index] = record.walls;
        }

        Ok(layout)
    }

    /// Side length of the grid the layout covers.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Walls recorded for a cell; cells outside the grid have none.
    #[must_use]
    pub fn walls_at(&self, cell: CellCoord) -> WallSides {
        self.size
            .index(cell)
            .map_or(WallSides::OPEN, |index| self.cells[index])
    }

    /// Replaces the walls recorded for an in-grid cell.
    pub fn set_walls(&mut self, cell: CellCoord, sides: WallSides) {
        if let Some(index) = self.size.index(cell) {
            self.cells[index] = sides;
        }
    }

    /// Reports whether movement from `from` toward `direction` is blocked.
    ///
    /// Leaving the grid is always blocked.
    #[must_use]
    pub fn is_blocked(&self, from: CellCoord, direction: Direction) -> bool {
        let Some(to) = self.size.neighbor(from, direction) else {
            return true;
        };
        self.walls_at(from).is_blocked(direction)
            || self.walls_at(to).is_blocked(direction.opposite())
    }

    /// Opens the edge between `cell` and its neighbour in `direction` on
    /// both sides.
    pub fn open_edge(&mut self, cell: CellCoord, direction: Direction) {
        self.set_side(cell, direction, false);
        if let Some(neighbor) = self.size.neighbor(cell, direction) {
            self.set_side(neighbor, direction.opposite(), false);
        }
    }

    fn set_side(&mut self, cell: CellCoord, direction: Direction, blocked: bool) {
        if let Some(index) = self.size.index(cell) {
            self.cells[index].set(direction, blocked);
        }
    }

    /// In-grid neighbours reachable from `cell` through an open edge.
    pub fn open_neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        self.size
            .neighbors(cell)
            .filter(move |(direction, _)| !self.is_blocked(cell, *direction))
            .map(|(_, neighbor)| neighbor)
    }

    /// Sparse records for every cell with at least one blocked side.
    ///
    /// The END cell's record is always included so consumers can locate it.
    #[must_use]
    pub fn records(&self) -> Vec<WallRecord> {
        let end = self.size.end();
        self.size
            .cells()
            .zip(self.cells.iter())
            .filter(|(cell, sides)| sides.blocked_count() > 0 || *cell == end)
            .map(|(cell, sides)| WallRecord {
                row: cell.row(),
                col: cell.column(),
                walls: *sides,
            })
            .collect()
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Maze Bingo engine.
//!
//! This crate defines the vocabulary that connects adapters, the
//! authoritative maze state, and pure systems. Adapters submit [`Command`]
//! values describing desired tile mutations, the world crate executes them via
//! its `apply` entry point and reports the random side effects it triggered as
//! [`Event`] values. Grid geometry ([`GridSize`], [`CellCoord`], [`TileId`]),
//! the edge topology ([`WallLayout`]) and the wire formats used for
//! persistence ([`MazeSnapshot`], [`SavePayload`]) live here so every crate
//! agrees on them.

mod snapshot;
mod walls;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use snapshot::{Descriptions, MazeSnapshot, SavePayload};
pub use walls::{WallLayout, WallRecord, WallSides};

/// Commands that express all permissible tile mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Records one completion against a revealed tile.
    CompleteTile {
        /// Tile the players claim to have completed.
        tile: TileId,
    },
    /// Retracts one completion from a completed frontier tile.
    UncompleteTile {
        /// Tile whose completion is being withdrawn.
        tile: TileId,
    },
}

/// Random side effects reported after a tile transitions to completed.
///
/// A single completion yields at most one trap event and at most one reward
/// event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
    /// A trap tile was completed and raised the requirement of another tile.
    TrapSprung {
        /// Tile whose completion sprang the trap.
        trigger: TileId,
        /// Tile that received the additional requirement.
        target: TileId,
        /// Requirement of the target after the increment.
        completions_required: u32,
    },
    /// A dead end was completed and lowered the requirement of another tile.
    RewardReduced {
        /// Dead-end tile whose completion granted the reward.
        trigger: TileId,
        /// Tile whose requirement was lowered.
        target: TileId,
        /// Requirement of the target after the decrement.
        completions_required: u32,
    },
    /// A dead-end reward lowered another tile's requirement far enough to
    /// complete it outright.
    RewardCompleted {
        /// Dead-end tile whose completion granted the reward.
        trigger: TileId,
        /// Tile that became completed as a result.
        target: TileId,
    },
}

/// Cardinal directions used to address the four sides of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Toward decreasing row indices (the "top" side).
    North,
    /// Toward increasing column indices (the "right" side).
    East,
    /// Toward increasing row indices (the "bottom" side).
    South,
    /// Toward decreasing column indices (the "left" side).
    West,
}

impl Direction {
    /// All four directions in clockwise order starting from the top.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Direction pointing back across the same edge.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }
}

/// Location of a single cell expressed as zero-based column and row indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    #[serde(rename = "col")]
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Returns the adjacent coordinate in `direction` without bounds checks
    /// beyond the grid origin.
    #[must_use]
    pub fn step(self, direction: Direction) -> Option<Self> {
        match direction {
            Direction::North => self.row.checked_sub(1).map(|row| Self::new(self.column, row)),
            Direction::East => self.column.checked_add(1).map(|column| Self::new(column, self.row)),
            Direction::South => self.row.checked_add(1).map(|row| Self::new(self.column, row)),
            Direction::West => self
                .column
                .checked_sub(1)
                .map(|column| Self::new(column, self.row)),
        }
    }
}

/// One-based row-major identifier of a tile.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TileId(u32);

impl TileId {
    /// Creates a new tile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Side length of the square maze grid.
///
/// START sits at the middle of the bottom row and END at the middle of the
/// top row; both are derived from the side length so they move whenever a
/// differently sized maze is loaded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridSize(u32);

impl GridSize {
    /// Smallest supported side length.
    pub const MIN: u32 = 2;
    /// Largest supported side length.
    pub const MAX: u32 = 256;
    /// Side length used when none is requested.
    pub const DEFAULT: Self = Self(9);

    /// Validates and wraps a side length.
    #[must_use]
    pub const fn new(side: u32) -> Option<Self> {
        if side < Self::MIN || side > Self::MAX {
            None
        } else {
            Some(Self(side))
        }
    }

    /// Number of cells along each edge of the grid.
    #[must_use]
    pub const fn side(&self) -> u32 {
        self.0
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        let side = usize::try_from(self.0).unwrap_or(0);
        side.saturating_mul(side)
    }

    /// Cell every team starts from.
    #[must_use]
    pub const fn start(&self) -> CellCoord {
        CellCoord::new(self.0 / 2, self.0 - 1)
    }

    /// Cell the maze leads to.
    #[must_use]
    pub const fn end(&self) -> CellCoord {
        CellCoord::new(self.0 / 2, 0)
    }

    /// Tile identifier of the START cell.
    #[must_use]
    pub const fn start_tile(&self) -> TileId {
        TileId::new((self.0 - 1) * self.0 + self.0 / 2 + 1)
    }

    /// Tile identifier of the END cell.
    #[must_use]
    pub const fn end_tile(&self) -> TileId {
        TileId::new(self.0 / 2 + 1)
    }

    /// Reports whether the coordinate lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.0 && cell.row() < self.0
    }

    /// Dense row-major index of an in-grid cell.
    #[must_use]
    pub fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let side = usize::try_from(self.0).ok()?;
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        Some(row * side + column)
    }

    /// Tile identifier assigned to the cell.
    #[must_use]
    pub fn tile_id(&self, cell: CellCoord) -> Option<TileId> {
        let index = self.index(cell)?;
        u32::try_from(index + 1).ok().map(TileId::new)
    }

    /// Cell addressed by the tile identifier.
    #[must_use]
    pub fn cell(&self, tile: TileId) -> Option<CellCoord> {
        let zero_based = tile.get().checked_sub(1)?;
        let cell = CellCoord::new(zero_based % self.0, zero_based / self.0);
        self.contains(cell).then_some(cell)
    }

    /// Adjacent in-grid cell in `direction`.
    #[must_use]
    pub fn neighbor(&self, cell: CellCoord, direction: Direction) -> Option<CellCoord> {
        cell.step(direction).filter(|next| self.contains(*next))
    }

    /// In-grid neighbours of a cell paired with the direction leading to them.
    pub fn neighbors(self, cell: CellCoord) -> impl Iterator<Item = (Direction, CellCoord)> {
        Direction::ALL
            .into_iter()
            .filter_map(move |direction| Some((direction, self.neighbor(cell, direction)?)))
    }

    /// Iterates every cell in row-major order.
    pub fn cells(self) -> impl Iterator<Item = CellCoord> {
        let side = self.0;
        (0..side).flat_map(move |row| (0..side).map(move |column| CellCoord::new(column, row)))
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Completion bookkeeping for a single tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    /// Identifier of the tile.
    pub id: TileId,
    /// Whether the tile counts as completed.
    pub completed: bool,
    /// Completions needed before the tile is completed.
    pub completions_required: u32,
    /// Completions recorded so far.
    pub completions_done: u32,
}

impl Tile {
    /// Creates an uncompleted tile that needs a single completion.
    #[must_use]
    pub const fn fresh(id: TileId) -> Self {
        Self {
            id,
            completed: false,
            completions_required: 1,
            completions_done: 0,
        }
    }

    /// Reports whether the recorded completions meet the requirement.
    #[must_use]
    pub const fn is_satisfied(&self) -> bool {
        self.completions_done >= self.completions_required
    }

    /// Reports whether the completed flag agrees with the counters.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.completed == self.is_satisfied()
    }
}

/// Visibility class of a tile as seen by players.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TileState {
    /// Hidden behind walls or far from any completed tile.
    Locked,
    /// Visible and available for completion.
    Revealed,
    /// Completed by the team.
    Completed,
}

/// Errors raised while validating maze layouts, payloads and snapshots.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// The requested side length is outside the supported range.
    #[error(
        "grid size {size} is outside the supported range {}..={}",
        GridSize::MIN,
        GridSize::MAX
    )]
    InvalidSize {
        /// Side length that was requested.
        size: u32,
    },
    /// A wall record or trap referenced a cell outside the grid.
    #[error("cell (row {row}, col {col}) lies outside a {size}x{size} grid")]
    CellOutOfBounds {
        /// Row of the offending cell.
        row: u32,
        /// Column of the offending cell.
        col: u32,
        /// Side length of the grid.
        size: u32,
    },
    /// The snapshot lists a different number of tiles than the grid holds.
    #[error("expected {expected} tiles but found {actual}")]
    TileCountMismatch {
        /// Number of cells in the grid.
        expected: usize,
        /// Number of tiles supplied.
        actual: usize,
    },
    /// A tile appears at a position that does not match its identifier.
    #[error("tile at position {position} carries id {found}")]
    MisplacedTile {
        /// Zero-based position within the tile list.
        position: usize,
        /// Identifier found at that position.
        found: TileId,
    },
    /// A tile's completed flag disagrees with its counters.
    #[error("tile {tile} has a completed flag that disagrees with its counters")]
    InconsistentTile {
        /// Identifier of the offending tile.
        tile: TileId,
    },
    /// A cell is recorded as a sprung trap but is not a trap.
    #[error("cell (row {row}, col {col}) is marked as sprung but holds no trap")]
    UnknownSprungTrap {
        /// Row of the offending cell.
        row: u32,
        /// Column of the offending cell.
        col: u32,
    },
}

impl LayoutError {
    pub(crate) fn out_of_bounds(cell: CellCoord, size: GridSize) -> Self {
        Self::CellOutOfBounds {
            row: cell.row(),
            col: cell.column(),
            size: size.side(),
        }
    }
}

/// Validates a raw side length read from a payload or snapshot.
pub fn grid_size(size: u32) -> Result<GridSize, LayoutError> {
    GridSize::new(size).ok_or(LayoutError::InvalidSize { size })
}

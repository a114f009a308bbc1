#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative state of a single team's maze.
//!
//! A [`Maze`] owns the wall layout, the per-tile completion counters, the trap
//! set and the advisory descriptions. The only way to mutate it is
//! [`apply`], which validates a [`Command`] against the current state before
//! touching anything, so a rejected command never leaves partial changes
//! behind. Random side effects draw from the RNG handed to each call and are
//! reported through the caller's event buffer.

mod completion;
pub mod reveal;

use std::collections::BTreeSet;

use maze_bingo_core::{
    grid_size, CellCoord, Command, Descriptions, Event, GridSize, LayoutError, MazeSnapshot,
    SavePayload, Tile, TileId, WallLayout,
};
use rand::Rng;

/// Authoritative maze state for one team.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze {
    size: GridSize,
    walls: WallLayout,
    tiles: Vec<Tile>,
    traps: BTreeSet<CellCoord>,
    sprung_traps: BTreeSet<CellCoord>,
    tile_descriptions: Descriptions,
    trap_descriptions: Descriptions,
}

impl Maze {
    /// Creates a maze over the provided walls with every tile fresh.
    #[must_use]
    pub fn new(walls: WallLayout) -> Self {
        let size = walls.size();
        let tiles = size
            .cells()
            .filter_map(|cell| size.tile_id(cell))
            .map(Tile::fresh)
            .collect();
        Self {
            size,
            walls,
            tiles,
            traps: BTreeSet::new(),
            sprung_traps: BTreeSet::new(),
            tile_descriptions: Descriptions::new(),
            trap_descriptions: Descriptions::new(),
        }
    }

    /// Adopts a designer save file, resetting all completion progress.
    pub fn from_payload(payload: &SavePayload) -> Result<Self, LayoutError> {
        let size = grid_size(payload.side())?;
        let walls = WallLayout::from_records(size, &payload.maze_walls)?;
        let mut maze = Self::new(walls);
        maze.traps = checked_traps(size, &payload.traps)?;
        maze.tile_descriptions = payload.tile_descriptions.clone();
        maze.trap_descriptions = payload.trap_descriptions.clone();
        Ok(maze)
    }

    /// Restores a maze from a persisted snapshot after validating it.
    pub fn from_snapshot(snapshot: &MazeSnapshot) -> Result<Self, LayoutError> {
        let size = grid_size(snapshot.size)?;
        let walls = WallLayout::from_records(size, &snapshot.walls)?;

        if snapshot.tiles.len() != size.cell_count() {
            return Err(LayoutError::TileCountMismatch {
                expected: size.cell_count(),
                actual: snapshot.tiles.len(),
            });
        }
        for (position, tile) in snapshot.tiles.iter().enumerate() {
            let expected = u32::try_from(position + 1).ok().map(TileId::new);
            if expected != Some(tile.id) {
                return Err(LayoutError::MisplacedTile {
                    position,
                    found: tile.id,
                });
            }
            if !tile.is_consistent() {
                return Err(LayoutError::InconsistentTile { tile: tile.id });
            }
        }

        let traps = checked_traps(size, &snapshot.traps)?;
        let sprung_traps = snapshot
            .sprung_traps
            .iter()
            .map(|cell| {
                if traps.contains(cell) {
                    Ok(*cell)
                } else {
                    Err(LayoutError::UnknownSprungTrap {
                        row: cell.row(),
                        col: cell.column(),
                    })
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self {
            size,
            walls,
            tiles: snapshot.tiles.clone(),
            traps,
            sprung_traps,
            tile_descriptions: snapshot.tile_descriptions.clone(),
            trap_descriptions: snapshot.trap_descriptions.clone(),
        })
    }

    /// Captures the full state in its persisted form.
    #[must_use]
    pub fn snapshot(&self) -> MazeSnapshot {
        MazeSnapshot {
            size: self.size.side(),
            tiles: self.tiles.clone(),
            walls: self.walls.records(),
            traps: self.traps.iter().copied().collect(),
            sprung_traps: self.sprung_traps.iter().copied().collect(),
            tile_descriptions: self.tile_descriptions.clone(),
            trap_descriptions: self.trap_descriptions.clone(),
        }
    }

    fn tile_index(&self, id: TileId) -> Option<usize> {
        let index = usize::try_from(id.get().checked_sub(1)?).ok()?;
        (index < self.tiles.len()).then_some(index)
    }

    fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tile_index(id).map(|index| &self.tiles[index])
    }

    fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tile_index(id).map(move |index| &mut self.tiles[index])
    }

    fn revealed(&self) -> BTreeSet<TileId> {
        reveal::revealed(
            &self.tiles,
            &self.walls,
            self.size.start_tile(),
            self.size.end_tile(),
        )
    }

    fn is_trap(&self, id: TileId) -> bool {
        self.size
            .cell(id)
            .is_some_and(|cell| self.traps.contains(&cell))
    }

    /// Marks the trap on `id` as sprung, returning `false` when it already
    /// fired or the tile holds no trap.
    fn spend_trap(&mut self, id: TileId) -> bool {
        match self.size.cell(id) {
            Some(cell) if self.traps.contains(&cell) => self.sprung_traps.insert(cell),
            _ => false,
        }
    }

    /// Dead ends are non-terminal tiles whose own record blocks three sides.
    fn is_dead_end(&self, id: TileId) -> bool {
        if id == self.size.start_tile() || id == self.size.end_tile() {
            return false;
        }
        self.size
            .cell(id)
            .is_some_and(|cell| self.walls.walls_at(cell).blocked_count() == 3)
    }
}

fn checked_traps(size: GridSize, traps: &[CellCoord]) -> Result<BTreeSet<CellCoord>, LayoutError> {
    traps
        .iter()
        .map(|cell| {
            if size.contains(*cell) {
                Ok(*cell)
            } else {
                Err(LayoutError::CellOutOfBounds {
                    row: cell.row(),
                    col: cell.column(),
                    size: size.side(),
                })
            }
        })
        .collect()
}

/// Result of a command that the maze accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A completion was recorded but the tile still needs more.
    Progressed(Tile),
    /// The tile transitioned to completed.
    Completed(Tile),
    /// The tile was already completed; nothing changed.
    AlreadyCompleted(Tile),
    /// One completion was withdrawn from the tile.
    Retracted(Tile),
}

impl Outcome {
    /// Tile state after the command.
    #[must_use]
    pub const fn tile(&self) -> &Tile {
        match self {
            Outcome::Progressed(tile)
            | Outcome::Completed(tile)
            | Outcome::AlreadyCompleted(tile)
            | Outcome::Retracted(tile) => tile,
        }
    }

    /// Reports whether the command changed the maze.
    #[must_use]
    pub const fn changed_state(&self) -> bool {
        !matches!(self, Outcome::AlreadyCompleted(_))
    }
}

/// Reasons a command is rejected without changing the maze.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TileError {
    /// The identifier does not address a tile of this maze.
    #[error("tile {tile} does not exist")]
    NotFound {
        /// Requested tile.
        tile: TileId,
    },
    /// The tile is still hidden from the team.
    #[error("tile {tile} is not revealed")]
    NotRevealed {
        /// Requested tile.
        tile: TileId,
    },
    /// The tile has no completion to withdraw.
    #[error("tile {tile} is not completed")]
    NotCompleted {
        /// Requested tile.
        tile: TileId,
    },
    /// The tile is not on the frontier of the completed region.
    #[error(
        "tile {tile} must border exactly one completed tile to be uncompleted, found {completed_neighbors}"
    )]
    InvalidFrontierState {
        /// Requested tile.
        tile: TileId,
        /// Completed orthogonal neighbours found.
        completed_neighbors: usize,
    },
    /// END stays completed once reached.
    #[error("tile {tile} is the END tile and cannot be uncompleted")]
    EndIsFinal {
        /// Requested tile.
        tile: TileId,
    },
}

/// Applies the provided command to the maze.
///
/// Completion side effects are appended to `out_events`; at most one trap
/// event and one reward event are produced per command.
pub fn apply<R>(
    maze: &mut Maze,
    command: Command,
    rng: &mut R,
    out_events: &mut Vec<Event>,
) -> Result<Outcome, TileError>
where
    R: Rng + ?Sized,
{
    match command {
        Command::CompleteTile { tile } => completion::complete(maze, tile, rng, out_events),
        Command::UncompleteTile { tile } => completion::uncomplete(maze, tile),
    }
}

/// Query functions that provide read-only access to the maze state.
pub mod query {
    use std::collections::BTreeSet;

    use maze_bingo_core::{GridSize, MazeSnapshot, Tile, TileId, TileState, WallLayout};

    use super::{reveal, Maze};

    /// Side length of the maze grid.
    #[must_use]
    pub fn size(maze: &Maze) -> GridSize {
        maze.size
    }

    /// Provides read-only access to the wall layout.
    #[must_use]
    pub fn walls(maze: &Maze) -> &WallLayout {
        &maze.walls
    }

    /// Every tile in row-major order.
    #[must_use]
    pub fn tiles(maze: &Maze) -> &[Tile] {
        &maze.tiles
    }

    /// Looks up a single tile.
    #[must_use]
    pub fn tile(maze: &Maze, id: TileId) -> Option<&Tile> {
        maze.tile(id)
    }

    /// Tiles currently visible to the team.
    #[must_use]
    pub fn revealed(maze: &Maze) -> BTreeSet<TileId> {
        maze.revealed()
    }

    /// Visibility class of a tile.
    #[must_use]
    pub fn tile_state(maze: &Maze, id: TileId) -> Option<TileState> {
        let tile = maze.tile(id)?;
        Some(reveal::classify(tile, &maze.revealed()))
    }

    /// Reports whether the tile hides a trap.
    #[must_use]
    pub fn is_trap(maze: &Maze, id: TileId) -> bool {
        maze.is_trap(id)
    }

    /// Reports whether the tile's trap has already fired.
    #[must_use]
    pub fn is_sprung_trap(maze: &Maze, id: TileId) -> bool {
        maze.size
            .cell(id)
            .is_some_and(|cell| maze.sprung_traps.contains(&cell))
    }

    /// Designer note attached to a tile.
    #[must_use]
    pub fn tile_description(maze: &Maze, id: TileId) -> Option<&str> {
        maze.tile_descriptions.get(&id).map(String::as_str)
    }

    /// Designer note shown when the tile's trap is sprung.
    #[must_use]
    pub fn trap_description(maze: &Maze, id: TileId) -> Option<&str> {
        maze.trap_descriptions.get(&id).map(String::as_str)
    }

    /// Captures the full state in its persisted form.
    #[must_use]
    pub fn snapshot(maze: &Maze) -> MazeSnapshot {
        maze.snapshot()
    }
}

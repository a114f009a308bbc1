#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Procedural maze generation for fresh team mazes.
//!
//! Generation starts from a grid where every side of every cell is walled.
//! A randomized depth-first search carves the main path from START to END,
//! every remaining cell is then linked into the maze through branch
//! corridors, and finally the terminal cells are adjusted: START is opened on
//! all sides and END is sealed so that only the main path leads into it.
//! All randomness comes from the caller's RNG, so a seeded RNG replays the
//! same maze.

use maze_bingo_core::{CellCoord, Direction, GridSize, WallLayout, WallSides};
use rand::{seq::SliceRandom, Rng};

/// Pure system that builds wall layouts for new mazes.
#[derive(Clone, Copy, Debug, Default)]
pub struct MazeGenerator;

impl MazeGenerator {
    /// Creates a new generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generates a connected maze of the requested size.
    pub fn generate<R>(&self, size: GridSize, rng: &mut R) -> GeneratedMaze
    where
        R: Rng + ?Sized,
    {
        let mut carver = Carver::new(size);
        let main_path = carver.carve_main_path(rng);
        carver.link_branches(rng);

        let mut walls = carver.walls;
        open_start(&mut walls);
        seal_end(&mut walls, &main_path);

        GeneratedMaze { walls, main_path }
    }
}

/// Output of a generation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedMaze {
    walls: WallLayout,
    main_path: Vec<CellCoord>,
}

impl GeneratedMaze {
    /// Wall layout of the generated maze.
    #[must_use]
    pub fn walls(&self) -> &WallLayout {
        &self.walls
    }

    /// Cells of the main path, from START to END inclusive.
    #[must_use]
    pub fn main_path(&self) -> &[CellCoord] {
        &self.main_path
    }

    /// Consumes the result and returns the wall layout.
    #[must_use]
    pub fn into_walls(self) -> WallLayout {
        self.walls
    }
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    cell: CellCoord,
    directions: [Direction; 4],
    next: usize,
}

impl Frame {
    fn new<R>(cell: CellCoord, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let mut directions = Direction::ALL;
        directions.shuffle(rng);
        Self {
            cell,
            directions,
            next: 0,
        }
    }

    fn next_direction(&mut self) -> Option<Direction> {
        let direction = self.directions.get(self.next).copied()?;
        self.next += 1;
        Some(direction)
    }
}

struct Carver {
    size: GridSize,
    walls: WallLayout,
    connected: Vec<bool>,
}

impl Carver {
    fn new(size: GridSize) -> Self {
        Self {
            size,
            walls: WallLayout::closed(size),
            connected: vec![false; size.cell_count()],
        }
    }

    fn is_connected(&self, cell: CellCoord) -> bool {
        self.size
            .index(cell)
            .is_some_and(|index| self.connected[index])
    }

    fn connect(&mut self, cell: CellCoord) {
        if let Some(index) = self.size.index(cell) {
            self.connected[index] = true;
        }
    }

    /// Depth-first search from START that stops at the first branch reaching
    /// END. Cells explored by abandoned branches stay visited.
    fn carve_main_path<R>(&mut self, rng: &mut R) -> Vec<CellCoord>
    where
        R: Rng + ?Sized,
    {
        let start = self.size.start();
        let end = self.size.end();
        let mut visited = vec![false; self.size.cell_count()];
        let mut stack = vec![Frame::new(start, rng)];
        if let Some(index) = self.size.index(start) {
            visited[index] = true;
        }

        while let Some(frame) = stack.last_mut() {
            if frame.cell == end {
                break;
            }
            let Some(direction) = frame.next_direction() else {
                let _ = stack.pop();
                continue;
            };
            let Some(next) = self.size.neighbor(frame.cell, direction) else {
                continue;
            };
            let Some(index) = self.size.index(next) else {
                continue;
            };
            if visited[index] {
                continue;
            }
            visited[index] = true;
            stack.push(Frame::new(next, rng));
        }

        let path: Vec<CellCoord> = stack.iter().map(|frame| frame.cell).collect();
        for pair in path.windows(2) {
            if let Some(direction) = direction_between(pair[0], pair[1]) {
                self.walls.open_edge(pair[0], direction);
            }
        }
        for &cell in &path {
            self.connect(cell);
        }
        path
    }

    /// Links every cell that is not yet part of the maze.
    ///
    /// Cells are scanned in row-major order. A cell is attached to a random
    /// connected neighbour and then grows a corridor into every disconnected
    /// cell it can reach. Cells with no connected neighbour yet wait for a
    /// later pass. END is never used as an attachment point.
    fn link_branches<R>(&mut self, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let end = self.size.end();
        loop {
            let mut pending = false;
            let mut progressed = false;

            for cell in self.size.cells() {
                if self.is_connected(cell) {
                    continue;
                }
                let anchors: Vec<Direction> = self
                    .size
                    .neighbors(cell)
                    .filter(|(_, neighbor)| *neighbor != end && self.is_connected(*neighbor))
                    .map(|(direction, _)| direction)
                    .collect();
                let Some(&direction) = anchors.choose(rng) else {
                    pending = true;
                    continue;
                };

                self.walls.open_edge(cell, direction);
                self.connect(cell);
                self.carve_branch(cell, rng);
                progressed = true;
            }

            if !pending || !progressed {
                break;
            }
        }
    }

    fn carve_branch<R>(&mut self, origin: CellCoord, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let mut stack = vec![Frame::new(origin, rng)];

        while let Some(frame) = stack.last_mut() {
            let Some(direction) = frame.next_direction() else {
                let _ = stack.pop();
                continue;
            };
            let cell = frame.cell;
            let Some(next) = self.size.neighbor(cell, direction) else {
                continue;
            };
            if self.is_connected(next) {
                continue;
            }
            self.walls.open_edge(cell, direction);
            self.connect(next);
            stack.push(Frame::new(next, rng));
        }
    }
}

fn direction_between(from: CellCoord, to: CellCoord) -> Option<Direction> {
    Direction::ALL
        .into_iter()
        .find(|direction| from.step(*direction) == Some(to))
}

/// Clears every wall of START and the facing wall of each neighbour.
fn open_start(walls: &mut WallLayout) {
    let size = walls.size();
    let start = size.start();
    walls.set_walls(start, WallSides::OPEN);
    for (direction, _) in size.neighbors(start) {
        walls.open_edge(start, direction);
    }
}

/// Rewrites END so that only the edge toward the main path's previous cell is
/// open. Runs last so it overrides whatever neighbours recorded.
fn seal_end(walls: &mut WallLayout, main_path: &[CellCoord]) {
    let end = walls.size().end();
    let Some(&previous) = main_path.iter().rev().nth(1) else {
        walls.set_walls(end, WallSides::CLOSED);
        return;
    };
    let Some(direction) = direction_between(end, previous) else {
        walls.set_walls(end, WallSides::CLOSED);
        return;
    };
    walls.set_walls(end, WallSides::open_only(direction));
    walls.open_edge(end, direction);
}

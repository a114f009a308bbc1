use std::collections::VecDeque;

use maze_bingo_core::{CellCoord, Direction, GridSize, WallLayout, WallSides};
use maze_bingo_system_generation::MazeGenerator;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn reachable_from(walls: &WallLayout, origin: CellCoord) -> Vec<bool> {
    let size = walls.size();
    let mut seen = vec![false; size.cell_count()];
    let mut queue = VecDeque::from([origin]);
    if let Some(index) = size.index(origin) {
        seen[index] = true;
    }
    while let Some(cell) = queue.pop_front() {
        for next in walls.open_neighbors(cell) {
            let index = size.index(next).expect("neighbor in grid");
            if !seen[index] {
                seen[index] = true;
                queue.push_back(next);
            }
        }
    }
    seen
}

fn generate(side: u32, seed: u64) -> maze_bingo_system_generation::GeneratedMaze {
    let size = GridSize::new(side).expect("valid size");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    MazeGenerator::new().generate(size, &mut rng)
}

#[test]
fn default_maze_reaches_every_cell_from_start() {
    let maze = generate(9, 0x5eed);
    let walls = maze.walls();
    let reachable = reachable_from(walls, walls.size().start());
    assert!(
        reachable.iter().all(|seen| *seen),
        "every cell should be reachable from START"
    );
}

#[test]
fn main_path_runs_from_start_to_end_through_open_edges() {
    let maze = generate(9, 42);
    let size = maze.walls().size();
    let path = maze.main_path();

    assert_eq!(path.first(), Some(&size.start()));
    assert_eq!(path.last(), Some(&size.end()));
    for pair in path.windows(2) {
        let open: Vec<_> = maze.walls().open_neighbors(pair[0]).collect();
        assert!(
            open.contains(&pair[1]),
            "path step {:?} -> {:?} should be open",
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn start_has_no_walls_of_its_own() {
    let maze = generate(9, 7);
    let size = maze.walls().size();
    assert_eq!(maze.walls().walls_at(size.start()), WallSides::OPEN);
    for (direction, neighbor) in size.neighbors(size.start()) {
        assert!(
            !maze.walls().walls_at(neighbor).is_blocked(direction.opposite()),
            "neighbor {neighbor:?} should not wall off START"
        );
    }
}

#[test]
fn end_has_exactly_one_opening_toward_the_main_path() {
    let maze = generate(9, 1234);
    let walls = maze.walls();
    let end = walls.size().end();
    let previous = maze.main_path()[maze.main_path().len() - 2];

    assert_eq!(walls.walls_at(end).blocked_count(), 3);
    assert_eq!(walls.open_neighbors(end).collect::<Vec<_>>(), vec![previous]);
}

#[test]
fn end_record_is_always_listed() {
    let maze = generate(5, 99);
    let end = maze.walls().size().end();
    assert!(maze.walls().records().iter().any(|record| record.cell() == end));
}

#[test]
fn same_seed_replays_the_same_maze() {
    assert_eq!(generate(9, 0xdead_beef), generate(9, 0xdead_beef));
}

#[test]
fn different_seeds_produce_different_mazes() {
    let first = generate(9, 1);
    let differs = (2..10).any(|seed| generate(9, seed) != first);
    assert!(differs, "seeds should influence the layout");
}

#[test]
fn two_by_two_grid_still_connects() {
    for seed in 0..32 {
        let maze = generate(2, seed);
        let walls = maze.walls();
        let reachable = reachable_from(walls, walls.size().start());
        assert!(reachable.iter().all(|seen| *seen), "seed {seed} left a cell unreachable");
        let end = walls.size().end();
        assert_eq!(walls.open_neighbors(end).count(), 1, "seed {seed}");
        assert!(walls.is_blocked(end, Direction::North));
    }
}

proptest! {
    #[test]
    fn generated_mazes_are_connected(side in 2u32..=14, seed in any::<u64>()) {
        let maze = generate(side, seed);
        let walls = maze.walls();
        let reachable = reachable_from(walls, walls.size().start());
        prop_assert!(reachable.iter().all(|seen| *seen));
    }

    #[test]
    fn end_is_entered_from_the_main_path_only(side in 2u32..=14, seed in any::<u64>()) {
        let maze = generate(side, seed);
        let walls = maze.walls();
        let end = walls.size().end();
        let path = maze.main_path();
        prop_assert!(path.len() >= 2);
        let open: Vec<_> = walls.open_neighbors(end).collect();
        prop_assert_eq!(open, vec![path[path.len() - 2]]);
    }

    #[test]
    fn start_record_is_fully_open(side in 2u32..=14, seed in any::<u64>()) {
        let maze = generate(side, seed);
        let start = maze.walls().size().start();
        prop_assert_eq!(maze.walls().walls_at(start), WallSides::OPEN);
    }
}

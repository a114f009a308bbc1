use maze_bingo_core::{CellCoord, Command, Event, GridSize, MazeSnapshot};
use maze_bingo_system_generation::MazeGenerator;
use maze_bingo_world::{self as world, query, Maze, Outcome};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn seeded_maze(side: u32, seed: u64, traps: &[(u32, u32)]) -> (Maze, ChaCha8Rng) {
    let size = GridSize::new(side).expect("valid size");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let walls = MazeGenerator::new().generate(size, &mut rng).into_walls();
    let mut snapshot: MazeSnapshot = Maze::new(walls).snapshot();
    snapshot.traps = traps
        .iter()
        .map(|(column, row)| CellCoord::new(column % side, row % side))
        .collect();
    let maze = Maze::from_snapshot(&snapshot).expect("generated snapshot is valid");
    (maze, rng)
}

proptest! {
    #[test]
    fn completions_never_hide_tiles(
        side in 3u32..=9,
        seed in any::<u64>(),
        traps in prop::collection::vec((0u32..9, 0u32..9), 0..6),
        picks in prop::collection::vec(1u32..=81, 1..120),
    ) {
        let (mut maze, mut rng) = seeded_maze(side, seed, &traps);
        let mut events = Vec::new();

        for pick in picks {
            let before = query::revealed(&maze);
            events.clear();
            let tile = maze_bingo_core::TileId::new(pick);
            let _ = world::apply(&mut maze, Command::CompleteTile { tile }, &mut rng, &mut events);
            let after = query::revealed(&maze);
            prop_assert!(before.is_subset(&after));
        }
    }

    #[test]
    fn each_completion_emits_at_most_one_trap_and_one_reward(
        seed in any::<u64>(),
        traps in prop::collection::vec((0u32..9, 0u32..9), 0..20),
        picks in prop::collection::vec(1u32..=81, 1..120),
    ) {
        let (mut maze, mut rng) = seeded_maze(9, seed, &traps);
        let mut events = Vec::new();

        for pick in picks {
            events.clear();
            let tile = maze_bingo_core::TileId::new(pick);
            let outcome = world::apply(&mut maze, Command::CompleteTile { tile }, &mut rng, &mut events);
            let traps_fired = events.iter().filter(|event| matches!(event, Event::TrapSprung { .. })).count();
            let rewards = events.len() - traps_fired;
            prop_assert!(traps_fired <= 1);
            prop_assert!(rewards <= 1);
            if !matches!(outcome, Ok(Outcome::Completed(_))) {
                prop_assert!(events.is_empty());
            }
            prop_assert!(query::tiles(&maze).iter().all(|tile| tile.is_consistent()));
        }
    }
}

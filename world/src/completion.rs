//! Tile completion state machine with trap and dead-end reward side effects.

use maze_bingo_core::{Event, TileId};
use rand::{seq::SliceRandom, Rng};

use crate::{Maze, Outcome, TileError};

pub(crate) fn complete<R>(
    maze: &mut Maze,
    id: TileId,
    rng: &mut R,
    out_events: &mut Vec<Event>,
) -> Result<Outcome, TileError>
where
    R: Rng + ?Sized,
{
    let index = maze.tile_index(id).ok_or(TileError::NotFound { tile: id })?;
    if maze.tiles[index].completed {
        return Ok(Outcome::AlreadyCompleted(maze.tiles[index]));
    }
    if id != maze.size.start_tile() && !maze.revealed().contains(&id) {
        return Err(TileError::NotRevealed { tile: id });
    }

    let tile = &mut maze.tiles[index];
    tile.completions_done = tile.completions_done.saturating_add(1);
    if !tile.is_satisfied() {
        return Ok(Outcome::Progressed(*tile));
    }
    tile.completed = true;
    let completed = *tile;

    // The trap is spent on first completion even when nothing is in reach.
    if maze.spend_trap(id) {
        spring_trap(maze, id, rng, out_events);
    }
    if maze.is_dead_end(id) {
        grant_reward(maze, id, rng, out_events);
    }

    Ok(Outcome::Completed(completed))
}

pub(crate) fn uncomplete(maze: &mut Maze, id: TileId) -> Result<Outcome, TileError> {
    let index = maze.tile_index(id).ok_or(TileError::NotFound { tile: id })?;
    if !maze.tiles[index].completed {
        return Err(TileError::NotCompleted { tile: id });
    }
    if id == maze.size.end_tile() {
        return Err(TileError::EndIsFinal { tile: id });
    }

    // Walls are ignored here: any completed orthogonal neighbour counts.
    let completed_neighbors = maze
        .size
        .cell(id)
        .map(|cell| {
            maze.size
                .neighbors(cell)
                .filter_map(|(_, neighbor)| maze.size.tile_id(neighbor))
                .filter(|neighbor| maze.tile(*neighbor).is_some_and(|tile| tile.completed))
                .count()
        })
        .unwrap_or(0);
    if completed_neighbors != 1 {
        return Err(TileError::InvalidFrontierState {
            tile: id,
            completed_neighbors,
        });
    }

    let tile = &mut maze.tiles[index];
    tile.completions_done = tile.completions_done.saturating_sub(1);
    if tile.completions_done < tile.completions_required {
        tile.completed = false;
    }
    Ok(Outcome::Retracted(*tile))
}

/// Revealed tiles that are neither completed nor terminal.
fn open_candidates(maze: &Maze) -> Vec<TileId> {
    let start = maze.size.start_tile();
    let end = maze.size.end_tile();
    maze.revealed()
        .into_iter()
        .filter(|id| *id != start && *id != end)
        .filter(|id| maze.tile(*id).is_some_and(|tile| !tile.completed))
        .collect()
}

fn spring_trap<R>(maze: &mut Maze, trigger: TileId, rng: &mut R, out_events: &mut Vec<Event>)
where
    R: Rng + ?Sized,
{
    let candidates = open_candidates(maze);
    let Some(&target) = candidates.choose(rng) else {
        return;
    };
    let Some(tile) = maze.tile_mut(target) else {
        return;
    };
    tile.completions_required = tile.completions_required.saturating_add(1);
    out_events.push(Event::TrapSprung {
        trigger,
        target,
        completions_required: tile.completions_required,
    });
}

fn grant_reward<R>(maze: &mut Maze, trigger: TileId, rng: &mut R, out_events: &mut Vec<Event>)
where
    R: Rng + ?Sized,
{
    let candidates: Vec<TileId> = open_candidates(maze)
        .into_iter()
        .filter(|id| maze.tile(*id).is_some_and(|tile| tile.completions_required > 0))
        .collect();
    let Some(&target) = candidates.choose(rng) else {
        return;
    };
    let Some(tile) = maze.tile_mut(target) else {
        return;
    };

    tile.completions_required = tile.completions_required.saturating_sub(1);
    if tile.completions_required == 0 {
        tile.completed = true;
        tile.completions_done = 0;
        out_events.push(Event::RewardCompleted { trigger, target });
    } else if tile.is_satisfied() {
        tile.completed = true;
        out_events.push(Event::RewardCompleted { trigger, target });
    } else {
        out_events.push(Event::RewardReduced {
            trigger,
            target,
            completions_required: tile.completions_required,
        });
    }
}

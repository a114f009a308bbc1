#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Team-keyed maze state with per-team serialization of mutations.
//!
//! Every team owns one complete maze. [`Teams`] loads the team's snapshot
//! from a [`SnapshotStore`], applies a single command through the world crate
//! and writes the full snapshot back, all while holding that team's lock.
//! Teams never contend with each other; requests for the same team are
//! linearized, including the very first request that generates and persists
//! the default maze.

mod render;
mod store;

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, PoisonError},
};

use log::{debug, info, warn};
use maze_bingo_core::{
    Command, Event, GridSize, LayoutError, MazeSnapshot, SavePayload, Tile, TileId,
};
use maze_bingo_system_generation::MazeGenerator;
use maze_bingo_world::{self as world, query, Maze, Outcome, TileError};
use rand::Rng;
use serde::Serialize;

pub use render::{Render, RenderError, Rendered};
pub use store::{MemorySnapshotStore, PersistenceError, SnapshotStore, StoreLock};

/// Opaque, non-empty name of a team.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TeamKey(String);

impl TeamKey {
    /// Validates a raw team name; surrounding whitespace is ignored.
    pub fn new(raw: &str) -> Result<Self, MissingTeam> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(MissingTeam);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Validates an optional raw team name.
    pub fn parse(raw: Option<&str>) -> Result<Self, MissingTeam> {
        raw.map_or(Err(MissingTeam), Self::new)
    }

    /// Team name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The request did not name a team.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("a team name is required")]
pub struct MissingTeam;

/// Coarse classification used by adapters to pick a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureClass {
    /// The request was invalid for the current state; nothing changed.
    Rejected,
    /// Storage failed; nothing was committed.
    Persistence,
}

/// Errors surfaced by [`Teams`] operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The command was rejected by the maze.
    #[error(transparent)]
    Rejected(#[from] TileError),
    /// The supplied save payload does not describe a valid maze.
    #[error("invalid maze payload: {0}")]
    InvalidPayload(#[from] LayoutError),
    /// The store failed to load or save the team's snapshot.
    #[error("could not persist state for team {team}: {source}")]
    Persistence {
        /// Team whose state was being accessed.
        team: TeamKey,
        /// Failure reported by the store.
        #[source]
        source: PersistenceError,
    },
    /// The stored snapshot failed validation.
    #[error("stored state for team {team} is corrupt: {source}")]
    CorruptSnapshot {
        /// Team whose snapshot is corrupt.
        team: TeamKey,
        /// Validation failure.
        #[source]
        source: LayoutError,
    },
}

impl EngineError {
    /// Classifies the failure for adapters.
    #[must_use]
    pub const fn class(&self) -> FailureClass {
        match self {
            EngineError::Rejected(_) | EngineError::InvalidPayload(_) => FailureClass::Rejected,
            EngineError::Persistence { .. } | EngineError::CorruptSnapshot { .. } => {
                FailureClass::Persistence
            }
        }
    }
}

/// Result of a completion request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionReport {
    /// How the maze handled the request.
    pub outcome: Outcome,
    /// Trap and reward side effects, at most one of each.
    pub events: Vec<Event>,
    /// Designer note for the completed tile.
    pub tile_description: Option<String>,
    /// Designer note for the trap sprung by this completion, if any.
    pub trap_description: Option<String>,
}

/// Read model consumed by front ends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MazeView {
    /// Full persisted state.
    #[serde(flatten)]
    pub snapshot: MazeSnapshot,
    /// Tiles currently visible to the team.
    pub revealed: Vec<TileId>,
}

/// Handle to every team's maze.
#[derive(Debug)]
pub struct Teams<S> {
    store: S,
    locks: Mutex<HashMap<TeamKey, Arc<Mutex<()>>>>,
    generator: MazeGenerator,
    default_size: GridSize,
}

impl<S> Teams<S>
where
    S: SnapshotStore,
{
    /// Creates a handle backed by the provided store.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
            generator: MazeGenerator::new(),
            default_size: GridSize::DEFAULT,
        }
    }

    /// Overrides the side length of generated mazes.
    #[must_use]
    pub fn with_default_size(mut self, size: GridSize) -> Self {
        self.default_size = size;
        self
    }

    /// Underlying snapshot store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replaces the team's maze with the payload's layout, or with a freshly
    /// generated maze when no payload is given.
    pub fn create_maze<R>(
        &self,
        team: &TeamKey,
        payload: Option<&SavePayload>,
        rng: &mut R,
    ) -> Result<MazeSnapshot, EngineError>
    where
        R: Rng + ?Sized,
    {
        let maze = match payload {
            Some(payload) => Maze::from_payload(payload)?,
            None => self.generate(rng),
        };
        let snapshot = maze.snapshot();

        self.with_team_lock(team, || self.save(team, &snapshot))?;
        info!(
            "created {size}x{size} maze for team {team} ({source})",
            size = snapshot.size,
            source = if payload.is_some() { "save file" } else { "generated" }
        );
        Ok(snapshot)
    }

    /// Returns the team's full state, creating the default maze on first
    /// access.
    pub fn fetch_state<R>(&self, team: &TeamKey, rng: &mut R) -> Result<MazeSnapshot, EngineError>
    where
        R: Rng + ?Sized,
    {
        self.with_team_lock(team, || Ok(self.load_or_create(team, rng)?.snapshot()))
    }

    /// Returns the team's state together with the tiles it can see.
    pub fn fetch_view<R>(&self, team: &TeamKey, rng: &mut R) -> Result<MazeView, EngineError>
    where
        R: Rng + ?Sized,
    {
        self.with_team_lock(team, || {
            let maze = self.load_or_create(team, rng)?;
            Ok(MazeView {
                snapshot: maze.snapshot(),
                revealed: query::revealed(&maze).into_iter().collect(),
            })
        })
    }

    /// Records one completion of `tile` for the team.
    pub fn complete_tile<R>(
        &self,
        team: &TeamKey,
        tile: TileId,
        rng: &mut R,
    ) -> Result<CompletionReport, EngineError>
    where
        R: Rng + ?Sized,
    {
        self.with_team_lock(team, || {
            let mut maze = self.load_or_create(team, rng)?;
            let mut events = Vec::new();
            let outcome = world::apply(&mut maze, Command::CompleteTile { tile }, rng, &mut events)?;

            if outcome.changed_state() {
                self.save(team, &maze.snapshot())?;
            }
            debug!("team {team} completed tile {tile}: {outcome:?}, events {events:?}");
            let trap_description = events.iter().find_map(|event| match event {
                Event::TrapSprung { trigger, .. } => query::trap_description(&maze, *trigger),
                _ => None,
            });
            Ok(CompletionReport {
                tile_description: query::tile_description(&maze, tile).map(str::to_owned),
                trap_description: trap_description.map(str::to_owned),
                outcome,
                events,
            })
        })
    }

    /// Withdraws one completion of `tile` for the team.
    pub fn uncomplete_tile<R>(
        &self,
        team: &TeamKey,
        tile: TileId,
        rng: &mut R,
    ) -> Result<Tile, EngineError>
    where
        R: Rng + ?Sized,
    {
        self.with_team_lock(team, || {
            let mut maze = self.load_or_create(team, rng)?;
            let mut events = Vec::new();
            let outcome =
                world::apply(&mut maze, Command::UncompleteTile { tile }, rng, &mut events)?;

            self.save(team, &maze.snapshot())?;
            debug!("team {team} uncompleted tile {tile}: {outcome:?}");
            Ok(*outcome.tile())
        })
    }

    /// Renders the team's current view.
    ///
    /// Loading failures are reported as render failures.
    pub fn render<V, R>(
        &self,
        team: &TeamKey,
        renderer: &V,
        rng: &mut R,
    ) -> Result<V::Artifact, RenderError>
    where
        V: Render,
        R: Rng + ?Sized,
    {
        let view = self
            .fetch_view(team, rng)
            .map_err(|error| RenderError::new(format!("could not load state: {error}")))?;
        renderer.render(team, &view)
    }

    /// Attaches a rendering of the team's current view to an already
    /// committed result.
    pub fn then_render<T, V, R>(
        &self,
        team: &TeamKey,
        value: T,
        renderer: &V,
        rng: &mut R,
    ) -> Rendered<T, V::Artifact>
    where
        V: Render,
        R: Rng + ?Sized,
    {
        let artifact = self.render(team, renderer, rng);
        if let Err(error) = &artifact {
            warn!("team {team}: {error}");
        }
        Rendered { value, artifact }
    }

    fn generate<R>(&self, rng: &mut R) -> Maze
    where
        R: Rng + ?Sized,
    {
        Maze::new(self.generator.generate(self.default_size, rng).into_walls())
    }

    fn load_or_create<R>(&self, team: &TeamKey, rng: &mut R) -> Result<Maze, EngineError>
    where
        R: Rng + ?Sized,
    {
        let stored = self
            .store
            .load(team)
            .map_err(|source| EngineError::Persistence {
                team: team.clone(),
                source,
            })?;

        match stored {
            Some(snapshot) => Maze::from_snapshot(&snapshot).map_err(|source| {
                warn!("team {team} has a corrupt snapshot: {source}");
                EngineError::CorruptSnapshot {
                    team: team.clone(),
                    source,
                }
            }),
            None => {
                let maze = self.generate(rng);
                self.save(team, &maze.snapshot())?;
                info!("generated default maze for team {team}");
                Ok(maze)
            }
        }
    }

    fn save(&self, team: &TeamKey, snapshot: &MazeSnapshot) -> Result<(), EngineError> {
        self.store
            .save(team, snapshot)
            .map_err(|source| EngineError::Persistence {
                team: team.clone(),
                source,
            })
    }

    fn with_team_lock<T>(
        &self,
        team: &TeamKey,
        operation: impl FnOnce() -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(team.clone()).or_default())
        };

        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            match self.store.lock(team) {
                Ok(_store_lock) => operation(),
                Err(source) => Err(EngineError::Persistence {
                    team: team.clone(),
                    source,
                }),
            }
        };

        // Drop the entry once no other call holds or waits on it.
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&lock) == 2 {
            let _ = locks.remove(team);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn tracked_teams<S>(teams: &Teams<S>) -> usize {
        teams
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[test]
    fn idle_team_locks_are_released() {
        let teams = Teams::new(MemorySnapshotStore::new());
        let mut rng = ChaCha8Rng::seed_from_u64(5);

        for name in ["red", "green", "blue"] {
            let team = TeamKey::new(name).expect("valid team");
            let _ = teams.fetch_state(&team, &mut rng).expect("state loads");
            let _ = teams
                .complete_tile(&team, GridSize::DEFAULT.start_tile(), &mut rng)
                .expect("start completes");
        }

        assert_eq!(tracked_teams(&teams), 0);
    }

    #[test]
    fn rejected_commands_release_their_lock() {
        let teams = Teams::new(MemorySnapshotStore::new());
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let team = TeamKey::new("red").expect("valid team");

        let error = teams
            .uncomplete_tile(&team, GridSize::DEFAULT.start_tile(), &mut rng)
            .expect_err("START is not completed yet");

        assert_eq!(error.class(), FailureClass::Rejected);
        assert_eq!(tracked_teams(&teams), 0);
    }
}

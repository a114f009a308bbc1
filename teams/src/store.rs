//! Persistence seam for team snapshots.

use std::{
    collections::HashMap,
    error::Error,
    fmt,
    sync::{PoisonError, RwLock},
};

use maze_bingo_core::MazeSnapshot;

use crate::TeamKey;

/// Durable storage for one snapshot per team.
///
/// Implementations must offer read-your-writes: a `load` issued after a
/// successful `save` for the same team observes that save. A `save` replaces
/// the previous snapshot wholesale.
///
/// [`Teams`](crate::Teams) already serializes access to a team within one
/// process. Stores shared between processes override [`SnapshotStore::lock`]
/// so that a load, mutate and save cycle also excludes other processes.
pub trait SnapshotStore: Send + Sync {
    /// Claims the team's snapshot until the returned lock is dropped.
    fn lock(&self, _team: &TeamKey) -> Result<StoreLock, PersistenceError> {
        Ok(StoreLock::unguarded())
    }

    /// Reads the team's snapshot, or `None` when the team has never been
    /// stored.
    fn load(&self, team: &TeamKey) -> Result<Option<MazeSnapshot>, PersistenceError>;

    /// Overwrites the team's snapshot.
    fn save(&self, team: &TeamKey, snapshot: &MazeSnapshot) -> Result<(), PersistenceError>;
}

/// Exclusive claim on one team's stored snapshot, released on drop.
#[must_use = "the team is unlocked as soon as the lock is dropped"]
pub struct StoreLock {
    held: Option<Box<dyn Send>>,
}

impl StoreLock {
    /// Lock for stores that need no cross-process exclusion.
    pub fn unguarded() -> Self {
        Self { held: None }
    }

    /// Keeps `guard` alive for as long as the lock is held.
    pub fn holding(guard: impl Send + 'static) -> Self {
        Self {
            held: Some(Box::new(guard)),
        }
    }
}

impl fmt::Debug for StoreLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreLock")
            .field("guarded", &self.held.is_some())
            .finish()
    }
}

/// Failure reported by a [`SnapshotStore`].
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct PersistenceError {
    message: String,
    #[source]
    source: Option<Box<dyn Error + Send + Sync>>,
}

impl PersistenceError {
    /// Creates an error without an underlying cause.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping the underlying cause.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Volatile store that keeps snapshots in memory.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    snapshots: RwLock<HashMap<TeamKey, MazeSnapshot>>,
}

impl MemorySnapshotStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of teams with a stored snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Reports whether no team has been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, team: &TeamKey) -> Result<Option<MazeSnapshot>, PersistenceError> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| PersistenceError::new("in-memory snapshot map is poisoned"))?;
        Ok(snapshots.get(team).cloned())
    }

    fn save(&self, team: &TeamKey, snapshot: &MazeSnapshot) -> Result<(), PersistenceError> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| PersistenceError::new("in-memory snapshot map is poisoned"))?;
        let _ = snapshots.insert(team.clone(), snapshot.clone());
        Ok(())
    }
}

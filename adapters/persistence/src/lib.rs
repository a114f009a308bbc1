#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! File-backed snapshot store.
//!
//! Each team's snapshot lives in its own pretty-printed JSON file inside the
//! data directory. The file name is the URL-safe base64 encoding of the team
//! name so arbitrary channel names map to portable file names. Writes go to a
//! uniquely named temporary file that is synced and then renamed over the
//! target, so readers only ever observe a complete snapshot.
//!
//! Several processes may share one data directory. Each team has a sibling
//! `.lock` file, and [`SnapshotStore::lock`] holds an exclusive advisory lock
//! on it for the whole load, mutate and save cycle.

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use fs2::FileExt;
use log::debug;
use maze_bingo_core::MazeSnapshot;
use maze_bingo_teams::{PersistenceError, SnapshotStore, StoreLock, TeamKey};
use tempfile::NamedTempFile;

const SNAPSHOT_EXTENSION: &str = "json";
const LOCK_EXTENSION: &str = "lock";

/// Stores one JSON snapshot file per team.
#[derive(Clone, Debug)]
pub struct FileSnapshotStore {
    root: PathBuf,
}

impl FileSnapshotStore {
    /// Opens a store rooted at `root`, creating the directory when needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|error| {
            PersistenceError::with_source(
                format!("could not create data directory {}", root.display()),
                error,
            )
        })?;
        Ok(Self { root })
    }

    /// Directory holding the snapshot files.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that holds the team's snapshot.
    #[must_use]
    pub fn path_for(&self, team: &TeamKey) -> PathBuf {
        self.root.join(format!("{}.{SNAPSHOT_EXTENSION}", file_stem(team)))
    }

    /// File whose advisory lock guards the team's snapshot.
    #[must_use]
    pub fn lock_path_for(&self, team: &TeamKey) -> PathBuf {
        self.root.join(format!("{}.{LOCK_EXTENSION}", file_stem(team)))
    }

    fn write_atomically(&self, path: &Path, snapshot: &MazeSnapshot) -> io::Result<()> {
        let content = serde_json::to_vec_pretty(snapshot)?;

        let mut temporary = NamedTempFile::new_in(&self.root)?;
        temporary.write_all(&content)?;
        temporary.write_all(b"\n")?;
        temporary.as_file().sync_all()?;

        let _ = temporary.persist(path).map_err(|error| error.error)?;
        Ok(())
    }
}

/// Portable file name stem for a team, shared by every file the team owns.
#[must_use]
pub fn file_stem(team: &TeamKey) -> String {
    URL_SAFE_NO_PAD.encode(team.as_str())
}

impl SnapshotStore for FileSnapshotStore {
    fn lock(&self, team: &TeamKey) -> Result<StoreLock, PersistenceError> {
        let path = self.lock_path_for(team);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|error| {
                PersistenceError::with_source(format!("could not open {}", path.display()), error)
            })?;
        file.lock_exclusive().map_err(|error| {
            PersistenceError::with_source(format!("could not lock {}", path.display()), error)
        })?;
        // Closing the file releases the lock.
        Ok(StoreLock::holding(file))
    }

    fn load(&self, team: &TeamKey) -> Result<Option<MazeSnapshot>, PersistenceError> {
        let path = self.path_for(team);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(PersistenceError::with_source(
                    format!("could not read {}", path.display()),
                    error,
                ))
            }
        };

        serde_json::from_slice(&bytes).map(Some).map_err(|error| {
            PersistenceError::with_source(format!("could not parse {}", path.display()), error)
        })
    }

    fn save(&self, team: &TeamKey, snapshot: &MazeSnapshot) -> Result<(), PersistenceError> {
        let path = self.path_for(team);
        self.write_atomically(&path, snapshot).map_err(|error| {
            PersistenceError::with_source(format!("could not write {}", path.display()), error)
        })?;
        debug!("saved snapshot for team {team} to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_portable_for_any_team_name() {
        let store = FileSnapshotStore {
            root: PathBuf::from("data"),
        };
        let team = TeamKey::new("team/1 ../evil").expect("valid team");
        let path = store.path_for(&team);

        assert_eq!(path.parent(), Some(Path::new("data")));
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .expect("utf-8 file name");
        assert!(name.ends_with(".json"));
        assert!(name
            .trim_end_matches(".json")
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn lock_file_sits_next_to_the_snapshot() {
        let store = FileSnapshotStore {
            root: PathBuf::from("data"),
        };
        let team = TeamKey::new("a b").expect("valid team");

        assert_eq!(
            store.lock_path_for(&team).with_extension(SNAPSHOT_EXTENSION),
            store.path_for(&team)
        );
        assert_ne!(file_stem(&team), file_stem(&TeamKey::new("a_b").expect("valid team")));
    }
}

//! Render collaborator that exports each team's view as a JSON file.

use std::{fs, path::PathBuf};

use maze_bingo_persistence::file_stem;
use maze_bingo_teams::{MazeView, Render, RenderError, TeamKey};

/// Writes `<export_dir>/<team>.view.json` after every mutation so a front end
/// can pick up the new state. The team part is named the same way as the
/// team's snapshot file.
#[derive(Clone, Debug)]
pub(crate) struct JsonExport {
    dir: PathBuf,
}

impl JsonExport {
    pub(crate) fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn view_path(&self, team: &TeamKey) -> PathBuf {
        self.dir.join(format!("{}.view.json", file_stem(team)))
    }
}

impl Render for JsonExport {
    type Artifact = PathBuf;

    fn render(&self, team: &TeamKey, view: &MazeView) -> Result<PathBuf, RenderError> {
        fs::create_dir_all(&self.dir).map_err(|error| {
            RenderError::new(format!(
                "could not create export directory {}: {error}",
                self.dir.display()
            ))
        })?;

        let path = self.view_path(team);
        let contents = serde_json::to_vec_pretty(view)
            .map_err(|error| RenderError::new(format!("could not encode view: {error}")))?;
        fs::write(&path, contents).map_err(|error| {
            RenderError::new(format!("could not write {}: {error}", path.display()))
        })?;
        Ok(path)
    }
}

#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs team bingo mazes against a data directory.

mod config;
mod export;
mod layout_transfer;

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use maze_bingo_core::{grid_size, SavePayload, TileId};
use maze_bingo_persistence::FileSnapshotStore;
use maze_bingo_teams::{
    CompletionReport, EngineError, FailureClass, MissingTeam, PersistenceError, TeamKey, Teams,
};
use maze_bingo_world::Outcome;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::{json, Value};

use crate::{
    config::{ConfigFile, Settings},
    export::JsonExport,
    layout_transfer::LayoutTransferError,
};

const EXIT_FAILURE: u8 = 1;
const EXIT_REJECTED: u8 = 2;
const EXIT_PERSISTENCE: u8 = 3;

/// Run cooperative bingo mazes, one per team.
#[derive(Debug, Parser)]
#[command(name = "maze-bingo", version)]
struct Cli {
    /// Directory holding one snapshot file per team.
    #[arg(long, env = "MAZE_BINGO_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,
    /// Optional TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory that receives a JSON view of the team after each change.
    #[arg(long, global = true)]
    export_dir: Option<PathBuf>,
    /// Seed for maze generation and trap/reward draws.
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Replace the team's maze with a generated one or a designer save file.
    Create {
        /// Team whose maze is replaced.
        #[arg(long)]
        team: String,
        /// Save file produced by the maze designer.
        #[arg(long)]
        save_file: Option<PathBuf>,
        /// Side length of a generated maze.
        #[arg(long, conflicts_with = "save_file")]
        size: Option<u32>,
    },
    /// Print the team's maze and the tiles it can see.
    Show {
        /// Team to display.
        #[arg(long)]
        team: String,
    },
    /// Record one completion of a tile.
    Complete {
        /// Team claiming the completion.
        #[arg(long)]
        team: String,
        /// Tile identifier.
        #[arg(long)]
        tile: u32,
    },
    /// Withdraw one completion of a tile.
    Uncomplete {
        /// Team withdrawing the completion.
        #[arg(long)]
        team: String,
        /// Tile identifier.
        #[arg(long)]
        tile: u32,
    },
    /// Share maze designs as single-line codes.
    Layout {
        #[command(subcommand)]
        action: LayoutCommand,
    },
}

#[derive(Debug, Subcommand)]
enum LayoutCommand {
    /// Print the team's layout as a shareable code.
    Export {
        /// Team whose layout is exported.
        #[arg(long)]
        team: String,
    },
    /// Replace the team's maze with the layout encoded in a code.
    Import {
        /// Team whose maze is replaced.
        #[arg(long)]
        team: String,
        /// Code produced by `layout export`.
        code: String,
    },
}

/// Input the user supplied that could not be understood.
#[derive(Debug, thiserror::Error)]
#[error("save file {path} is not a valid maze save: {source}")]
struct InvalidSaveFile {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
}

/// Entry point for the Maze Bingo command-line interface.
fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(exit_status(&error))
        }
    }
}

fn exit_status(error: &anyhow::Error) -> u8 {
    if let Some(engine) = error.downcast_ref::<EngineError>() {
        return match engine.class() {
            FailureClass::Rejected => EXIT_REJECTED,
            FailureClass::Persistence => EXIT_PERSISTENCE,
        };
    }
    if error.downcast_ref::<PersistenceError>().is_some() {
        return EXIT_PERSISTENCE;
    }
    let rejected = error.downcast_ref::<MissingTeam>().is_some()
        || error.downcast_ref::<LayoutTransferError>().is_some()
        || error.downcast_ref::<InvalidSaveFile>().is_some();
    if rejected {
        EXIT_REJECTED
    } else {
        EXIT_FAILURE
    }
}

fn run(cli: Cli) -> Result<()> {
    let file = match &cli.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    let settings = Settings::resolve(file, cli.data_dir, cli.export_dir)?;

    let seed = cli.seed.unwrap_or_else(rand::random);
    debug!("rng seed {seed}");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let default_size = match &cli.command {
        CliCommand::Create {
            size: Some(side), ..
        } => grid_size(*side).map_err(EngineError::from)?,
        _ => settings.default_size,
    };
    let store =
        FileSnapshotStore::open(&settings.data_dir).context("could not open data directory")?;
    let session = Session {
        teams: Teams::new(store).with_default_size(default_size),
        exporter: settings.export_dir.map(JsonExport::new),
        rng: &mut rng,
    };

    session.dispatch(cli.command)
}

struct Session<'a> {
    teams: Teams<FileSnapshotStore>,
    exporter: Option<JsonExport>,
    rng: &'a mut ChaCha8Rng,
}

impl Session<'_> {
    fn dispatch(mut self, command: CliCommand) -> Result<()> {
        match command {
            CliCommand::Create {
                team, save_file, ..
            } => {
                let team = TeamKey::new(&team)?;
                let payload = save_file.as_deref().map(read_save_file).transpose()?;
                let snapshot = self.teams.create_maze(&team, payload.as_ref(), self.rng)?;
                self.export(&team);
                print_json(&snapshot)
            }
            CliCommand::Show { team } => {
                let team = TeamKey::new(&team)?;
                let view = self.teams.fetch_view(&team, self.rng)?;
                print_json(&view)
            }
            CliCommand::Complete { team, tile } => {
                let team = TeamKey::new(&team)?;
                let tile = TileId::new(tile);
                let report = self.teams.complete_tile(&team, tile, self.rng)?;
                if report.outcome.changed_state() {
                    self.export(&team);
                }
                print_json(&completion_reply(&report))
            }
            CliCommand::Uncomplete { team, tile } => {
                let team = TeamKey::new(&team)?;
                let updated = self
                    .teams
                    .uncomplete_tile(&team, TileId::new(tile), self.rng)?;
                self.export(&team);
                print_json(&updated)
            }
            CliCommand::Layout {
                action: LayoutCommand::Export { team },
            } => {
                let team = TeamKey::new(&team)?;
                let snapshot = self.teams.fetch_state(&team, self.rng)?;
                println!("{}", layout_transfer::encode(&snapshot.to_save_payload())?);
                Ok(())
            }
            CliCommand::Layout {
                action: LayoutCommand::Import { team, code },
            } => {
                let team = TeamKey::new(&team)?;
                let payload = layout_transfer::decode(&code)?;
                let snapshot = self.teams.create_maze(&team, Some(&payload), self.rng)?;
                self.export(&team);
                print_json(&snapshot)
            }
        }
    }

    /// Exports the team's view when an export directory is configured.
    /// Failures are reported but never undo the committed change.
    fn export(&mut self, team: &TeamKey) {
        let Some(exporter) = &self.exporter else {
            return;
        };
        let rendered = self.teams.then_render(team, (), exporter, self.rng);
        match rendered.artifact {
            Ok(path) => debug!("exported view to {}", path.display()),
            Err(error) => eprintln!("warning: {error}"),
        }
    }
}

fn read_save_file(path: &Path) -> Result<SavePayload> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read save file at {}", path.display()))?;
    let payload = serde_json::from_str(&contents).map_err(|source| InvalidSaveFile {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(payload)
}

fn completion_reply(report: &CompletionReport) -> Value {
    let (status, tile) = match &report.outcome {
        Outcome::Progressed(tile) => ("progressed", tile),
        Outcome::Completed(tile) => ("completed", tile),
        Outcome::AlreadyCompleted(tile) => ("alreadyCompleted", tile),
        Outcome::Retracted(tile) => ("retracted", tile),
    };

    let mut reply = json!({
        "status": status,
        "tile": tile,
        "events": report.events,
    });
    if let Some(text) = &report.tile_description {
        reply["tileDescription"] = json!(text);
    }
    if let Some(text) = &report.trap_description {
        reply["trapDescription"] = json!(text);
    }
    reply
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_bingo_core::{Event, Tile};

    #[test]
    fn reply_includes_descriptions_for_sprung_traps() {
        let tile = Tile {
            id: TileId::new(8),
            completed: true,
            completions_required: 1,
            completions_done: 1,
        };
        let events = [Event::TrapSprung {
            trigger: TileId::new(8),
            target: TileId::new(5),
            completions_required: 2,
        }];

        let reply = completion_reply(&CompletionReport {
            outcome: Outcome::Completed(tile),
            events: events.to_vec(),
            tile_description: Some("Bake bread".to_owned()),
            trap_description: Some("Burnt!".to_owned()),
        });

        assert_eq!(reply["status"], "completed");
        assert_eq!(reply["tileDescription"], "Bake bread");
        assert_eq!(reply["trapDescription"], "Burnt!");
        assert_eq!(reply["events"][0]["kind"], "trapSprung");
    }

    #[test]
    fn already_completed_replies_are_distinct() {
        let tile = Tile {
            id: TileId::new(2),
            completed: true,
            completions_required: 1,
            completions_done: 1,
        };
        let reply = completion_reply(&CompletionReport {
            outcome: Outcome::AlreadyCompleted(tile),
            events: Vec::new(),
            tile_description: None,
            trap_description: None,
        });
        assert_eq!(reply["status"], "alreadyCompleted");
        assert!(reply.get("tileDescription").is_none());
        assert!(reply.get("trapDescription").is_none());
    }

    #[test]
    fn engine_failures_map_to_exit_statuses() {
        let rejected = anyhow::Error::new(EngineError::from(
            maze_bingo_world::TileError::NotFound {
                tile: TileId::new(0),
            },
        ));
        assert_eq!(exit_status(&rejected), EXIT_REJECTED);

        let missing = anyhow::Error::new(MissingTeam);
        assert_eq!(exit_status(&missing), EXIT_REJECTED);

        let other = anyhow::anyhow!("disk on fire");
        assert_eq!(exit_status(&other), EXIT_FAILURE);
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}

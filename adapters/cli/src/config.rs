//! Settings resolved from the optional TOML config file and CLI flags.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use maze_bingo_core::GridSize;
use serde::Deserialize;

const DEFAULT_DATA_DIR: &str = "maze-data";

/// Contents of a config file. Relative paths resolve against the file's
/// directory.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConfigFile {
    data_dir: Option<PathBuf>,
    default_size: Option<u32>,
    export_dir: Option<PathBuf>,
}

impl ConfigFile {
    /// Reads and parses the config file at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        let base = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        parse_config(&contents, &base)
    }
}

fn parse_config(contents: &str, base: &Path) -> Result<ConfigFile> {
    let mut config: ConfigFile =
        toml::from_str(contents).context("failed to parse config toml contents")?;
    config.data_dir = config.data_dir.map(|dir| base.join(dir));
    config.export_dir = config.export_dir.map(|dir| base.join(dir));
    Ok(config)
}

/// Effective settings for one invocation.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) data_dir: PathBuf,
    pub(crate) default_size: GridSize,
    pub(crate) export_dir: Option<PathBuf>,
}

impl Settings {
    /// Layers CLI flags over the config file over built-in defaults.
    pub(crate) fn resolve(
        file: ConfigFile,
        data_dir: Option<PathBuf>,
        export_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let default_size = match file.default_size {
            Some(side) => match GridSize::new(side) {
                Some(size) => size,
                None => bail!(
                    "default_size {side} is outside the supported range {}..={}",
                    GridSize::MIN,
                    GridSize::MAX
                ),
            },
            None => GridSize::DEFAULT,
        };

        Ok(Self {
            data_dir: data_dir
                .or(file.data_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR)),
            default_size,
            export_dir: export_dir.or(file.export_dir),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("", Path::new("conf")).expect("empty config parses");
        let settings = Settings::resolve(config, None, None).expect("defaults resolve");
        assert_eq!(
            settings,
            Settings {
                data_dir: PathBuf::from("maze-data"),
                default_size: GridSize::DEFAULT,
                export_dir: None,
            }
        );
    }

    #[test]
    fn config_paths_are_relative_to_the_file() {
        let contents = r#"
            data_dir = "state"
            default_size = 7
            export_dir = "exports"
        "#;
        let config = parse_config(contents, Path::new("conf")).expect("config parses");
        let settings = Settings::resolve(config, None, None).expect("settings resolve");

        assert_eq!(settings.data_dir, Path::new("conf").join("state"));
        assert_eq!(settings.default_size.side(), 7);
        assert_eq!(settings.export_dir, Some(Path::new("conf").join("exports")));
    }

    #[test]
    fn flags_override_the_config_file() {
        let config =
            parse_config(r#"data_dir = "state""#, Path::new("conf")).expect("config parses");
        let settings = Settings::resolve(config, Some(PathBuf::from("elsewhere")), None)
            .expect("settings resolve");
        assert_eq!(settings.data_dir, PathBuf::from("elsewhere"));
    }

    #[test]
    fn rejects_unknown_keys_and_bad_sizes() {
        assert!(parse_config("colour = \"red\"", Path::new(".")).is_err());

        let config = parse_config("default_size = 1", Path::new(".")).expect("config parses");
        assert!(Settings::resolve(config, None, None).is_err());
    }
}

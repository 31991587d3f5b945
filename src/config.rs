//! Application configuration: the two paths the core needs from its host
//! — where Serato's database lives, and where the music library is rooted.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("could not determine the platform config directory")]
    NoConfigDir,
}

/// `{serato_db_path, music_library_path}`, loaded at startup and mutated
/// only via an explicit save.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub serato_db_path: String,
    pub music_library_path: String,
}

impl Config {
    /// Discovery order: `./config.json` in the current working directory,
    /// else the platform config directory's `seratosync/config.json`. If
    /// neither exists, return an empty default rather than failing — the
    /// host is responsible for prompting the user to fill it in.
    pub fn load() -> Self {
        if let Ok(config) = Self::load_from(Path::new("config.json")) {
            info!("loaded config from ./config.json");
            return config;
        }

        match Self::platform_config_path() {
            Ok(path) => match Self::load_from(&path) {
                Ok(config) => {
                    info!("loaded config from {:?}", path);
                    config
                }
                Err(_) => {
                    debug!("no config found at {:?}, using defaults", path);
                    Config::default()
                }
            },
            Err(_) => {
                debug!("no platform config directory available, using defaults");
                Config::default()
            }
        }
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Write this configuration as two-space-indented JSON to the platform
    /// config directory, creating parent directories as needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::platform_config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::File::create(&path)?;
        let mut writer = std::io::BufWriter::new(file);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"  ");
        let mut ser = serde_json::Serializer::with_formatter(&mut writer, formatter);
        serde::Serialize::serialize(self, &mut ser)?;

        info!("saved config to {:?}", path);
        Ok(())
    }

    fn platform_config_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("seratosync").join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// `<serato_db_path>/database V2`, the conventional location of the
    /// master index file.
    pub fn database_path(&self) -> PathBuf {
        Path::new(&self.serato_db_path).join("database V2")
    }

    /// Both paths must be non-empty for a sync to proceed.
    pub fn is_valid(&self) -> bool {
        !self.serato_db_path.trim().is_empty() && !self.music_library_path.trim().is_empty()
    }
}

//! Tool configuration
//!
//! Read from `--config <path>` when given, otherwise from
//! `~/.config/opcode-trie/config.json` if it exists. Missing fields fall back
//! to defaults, and command-line flags override whatever the file says.

use crate::store::WriteOptions;
use crate::trie::ConflictPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Settings shared by the `trie` subcommands
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How `build` handles a path listed twice with different values
    pub conflict_policy: ConflictPolicy,
    /// zstd level for `.zst` outputs
    pub compression_level: i32,
    /// Indent written documents
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        let write = WriteOptions::default();
        Config {
            conflict_policy: ConflictPolicy::default(),
            compression_level: write.compression_level,
            pretty: write.pretty,
        }
    }
}

impl Config {
    /// Default location (~/.config/opcode-trie/config.json)
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".into()))?;
        Ok(config_dir.join("opcode-trie").join("config.json"))
    }

    /// Load from a file that must exist
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Config = serde_json::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        if !(1..=22).contains(&config.compression_level) {
            return Err(Error::Config(format!(
                "compression_level must be 1-22, got {}",
                config.compression_level
            )));
        }
        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Load the explicit path if given, else the default path if present,
    /// else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Ok(path) if path.exists() => Self::from_file(path),
            _ => Ok(Config::default()),
        }
    }

    pub fn write_options(&self) -> WriteOptions {
        WriteOptions {
            pretty: self.pretty,
            compression_level: self.compression_level,
        }
    }
}

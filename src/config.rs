//! Configuration file support.
//!
//! Loads settings from `~/.config/rbn-callparser/config.toml` on Linux
//! (or the platform-appropriate location on other OSes).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::filter::StationFilter;

/// Application configuration loaded from TOML file.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the `cty.dat` country file.
    pub cty_path: PathBuf,

    /// Print decoded stations as JSON lines instead of text.
    pub json: bool,

    /// Also print calls that failed to decode.
    pub show_invalid: bool,

    /// Station filters for selective output.
    pub filters: Vec<StationFilter>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cty_path: PathBuf::from("cty.dat"),
            json: false,
            show_invalid: true,
            filters: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from the default config file location.
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but is malformed.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in config file: {}", path.display()))
    }

    /// Returns the path to the config file.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rbn-callparser/config.toml"))
    }

    /// Validate all configuration settings.
    ///
    /// Returns an error if any filters have invalid patterns.
    pub fn validate(&self) -> Result<()> {
        for (i, filter) in self.filters.iter().enumerate() {
            filter
                .validate()
                .map_err(|e| anyhow::anyhow!("Invalid filter [{}]: {}", i, e))?;
        }
        Ok(())
    }
}

//! User configuration
//!
//! Read from `config.toml` in the per-user config directory. Every key is
//! optional; a missing file means defaults.

use crate::compare::CompareOptions;
use crate::history::Ledger;
use crate::tree::CollectOptions;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub history: HistoryConfig,
    pub hashing: HashingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Record completed checks in the ledger
    pub enabled: bool,
    /// Ledger location; the data directory is used when unset
    pub path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashingConfig {
    /// Hash files of a tree on all cores
    pub parallel: bool,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self { parallel: true }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults on any problem
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{e:#}"), "ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// Load from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Location: <config dir>/hashcheck/config.toml
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "hashcheck").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply command-line flags on top of the file values
    pub fn apply_cli_overrides(
        &mut self,
        history_file: Option<PathBuf>,
        no_history: bool,
        sequential: bool,
    ) {
        if let Some(path) = history_file {
            self.history.path = Some(path);
        }
        if no_history {
            self.history.enabled = false;
        }
        if sequential {
            self.hashing.parallel = false;
        }
    }

    /// Ledger handle for the configured location
    pub fn ledger(&self) -> Result<Ledger> {
        match &self.history.path {
            Some(path) => Ok(Ledger::new(path)),
            None => Ok(Ledger::open_default()?),
        }
    }

    pub fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            collect: CollectOptions {
                parallel: self.hashing.parallel,
            },
        }
    }
}

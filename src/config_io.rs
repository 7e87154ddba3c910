//! Runtime configuration I/O operations.
//!
//! System directory detection and config loading live here, apart from
//! `config.rs`, so the config types stay free of `dirs` and file access.

use crate::config::Config;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Directory paths for configuration and logs
///
/// Only binaries should call [`DirectoryContext::from_system`]; library code
/// receives the context by parameter so tests can point it at a temp dir.
#[derive(Debug, Clone)]
pub struct DirectoryContext {
    /// e.g. ~/.config/fresh-explorer on Linux
    pub config_dir: PathBuf,

    /// e.g. ~/.local/share/fresh-explorer on Linux
    pub data_dir: PathBuf,
}

impl DirectoryContext {
    const APP_DIR: &'static str = "fresh-explorer";

    /// Create a DirectoryContext from the system directories
    pub fn from_system() -> std::io::Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Could not determine config directory",
                )
            })?
            .join(Self::APP_DIR);

        let data_dir = dirs::data_dir()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Could not determine data directory",
                )
            })?
            .join(Self::APP_DIR);

        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    /// All paths point to subdirectories within `temp_dir`
    pub fn for_testing(temp_dir: &Path) -> Self {
        Self {
            config_dir: temp_dir.join("config"),
            data_dir: temp_dir.join("data"),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(Config::FILENAME)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("logs").join("explorer.log")
    }
}

/// Load the configuration at `path`
///
/// A missing file yields the defaults. A file that exists but cannot be
/// read, parsed or validated is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!("No config at {:?}, using defaults", path);
        return Ok(Config::default());
    }
    let config = Config::load_from_file(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    tracing::info!("Loaded config from {:?}", path);
    Ok(config)
}

/// Write `config` to `path`, creating parent directories
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    config
        .save_to_file(path)
        .with_context(|| format!("Failed to save config to {}", path.display()))
}

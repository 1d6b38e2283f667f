//! Configuration loading and root folder resolution
//!
//! Every setting is resolved in priority order:
//! 1. Command-line argument or its environment variable (highest priority)
//! 2. TOML config file
//! 3. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8080;

/// Default bind address
pub const DEFAULT_BIND: &str = "127.0.0.1";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "pairrank.db";

/// One layer of optional settings (command line or config file)
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ConfigLayer {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub bind: Option<String>,
    pub shuffle_pairs: Option<bool>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub port: u16,
    pub bind: String,
    pub shuffle_pairs: bool,
}

impl ServiceConfig {
    /// Merge the command-line layer over the file layer over defaults
    pub fn from_layers(cli: ConfigLayer, file: ConfigLayer) -> Self {
        Self {
            root_folder: cli
                .root_folder
                .or(file.root_folder)
                .unwrap_or_else(default_root_folder),
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            bind: cli
                .bind
                .or(file.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            shuffle_pairs: cli.shuffle_pairs.or(file.shuffle_pairs).unwrap_or(true),
        }
    }

    /// Path of the SQLite database file
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}

/// Load the config file layer, if a config file exists
///
/// A missing file is not an error (empty layer); a file that exists but
/// cannot be parsed is.
pub fn load_file_layer() -> Result<ConfigLayer> {
    match find_config_file() {
        Some(path) => read_config_layer(&path),
        None => {
            debug!("No config file found, using defaults");
            Ok(ConfigLayer::default())
        }
    }
}

/// Parse a TOML config file into a layer
pub fn read_config_layer(path: &Path) -> Result<ConfigLayer> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str::<ConfigLayer>(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Get the configuration file path for the platform, if one exists
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("pairrank").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/pairrank/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/pairrank (or /var/lib/pairrank for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("pairrank"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/pairrank"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("pairrank"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/pairrank"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("pairrank"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\pairrank"))
    } else {
        PathBuf::from("./pairrank_data")
    }
}

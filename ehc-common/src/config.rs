//! Configuration loading and root folder resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "EHC_ROOT_FOLDER";

/// Environment variable naming the database file directly
pub const DATABASE_ENV: &str = "EHC_DATABASE";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "ehc.db";

/// Bootstrap configuration from TOML
///
/// All fields are optional; a missing file is the same as an empty one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Overrides `<root_folder>/ehc.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// HTTP port for ehc-api
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Load the platform config file, or defaults when none exists
    ///
    /// A malformed file logs a warning and is ignored rather than aborting startup.
    pub fn load() -> Self {
        match config_file_path() {
            Some(path) => match Self::from_file(&path) {
                Ok(config) => {
                    debug!("Loaded config file {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("Ignoring config file: {}", e);
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }
}

/// Locate the config file for the current platform, if one exists
fn config_file_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("ehc").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/ehc/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Resolve the root folder (data directory)
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Resolve the database file path
///
/// An explicit database path (CLI, `EHC_DATABASE`, TOML) wins; otherwise the
/// database lives in the resolved root folder.
pub fn resolve_database_path(
    cli_database: Option<&Path>,
    cli_root: Option<&Path>,
    toml: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_database {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATABASE_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml.database_path {
        return path.clone();
    }

    resolve_root_folder(cli_root, toml).join(DATABASE_FILE_NAME)
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("ehc"))
        .unwrap_or_else(|| PathBuf::from("./ehc_data"))
}

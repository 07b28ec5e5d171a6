//! Configuration loading and data folder resolution
//!
//! Bootstrap settings come from an optional TOML file. The data folder
//! (database file and stored images) follows this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable consulted for the data folder
pub const DATA_DIR_ENV: &str = "KITCHEN_DATA_DIR";

/// Database file name inside the data folder
pub const DATABASE_FILE: &str = "kitchen.db";

/// Image folder name inside the data folder
pub const IMAGES_DIR: &str = "images";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Data folder holding the database and images (optional)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Folder of web front-end files served at `/` (optional)
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    /// Location assigned to inventory rows and photos that do not name one
    #[serde(default = "default_location")]
    pub default_location: String,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub listing: ListingConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            data_dir: None,
            static_dir: None,
            default_location: default_location(),
            auth: AuthConfig::default(),
            listing: ListingConfig::default(),
            upload: UploadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Shared-secret credentials checked on every API request.
///
/// An empty password disables the check.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl AuthConfig {
    pub fn is_enabled(&self) -> bool {
        !self.password.is_empty()
    }
}

/// Row caps for constrained deployments
#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    /// When true, listings are capped unless the caller passes `all=true`
    #[serde(default)]
    pub constrained: bool,
    #[serde(default = "default_inventory_row_cap")]
    pub inventory_row_cap: i64,
    #[serde(default = "default_recipe_row_cap")]
    pub recipe_row_cap: i64,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            constrained: false,
            inventory_row_cap: default_inventory_row_cap(),
            recipe_row_cap: default_recipe_row_cap(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum multipart body size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload_bytes(),
        }
    }
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

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_location() -> String {
    "Other".to_string()
}

fn default_inventory_row_cap() -> i64 {
    100
}

fn default_recipe_row_cap() -> i64 {
    50
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load the TOML bootstrap file.
///
/// A missing path yields built-in defaults; a present but unreadable or
/// malformed file is an error.
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let Some(path) = path else {
        return Ok(TomlConfig::default());
    };

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;

    if config.default_location.trim().is_empty() {
        return Err(Error::Config("default_location must not be empty".to_string()));
    }
    if config.listing.inventory_row_cap < 1 || config.listing.recipe_row_cap < 1 {
        return Err(Error::Config("listing row caps must be >= 1".to_string()));
    }
    if config.upload.max_bytes == 0 {
        return Err(Error::Config("upload.max_bytes must be > 0".to_string()));
    }

    Ok(config)
}

/// Resolve the data folder: CLI argument, then environment, then TOML,
/// then the OS default.
pub fn resolve_data_dir(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.data_dir {
        return path.clone();
    }

    default_data_dir()
}

/// OS-dependent default data folder
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("kitchen"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

/// Filesystem layout under a resolved data folder
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join(DATABASE_FILE)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join(IMAGES_DIR)
    }

    /// Create the data and image folders if missing
    pub fn ensure_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.images_dir())?;
        Ok(())
    }
}

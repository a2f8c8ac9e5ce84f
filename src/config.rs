//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\scrobble-charts\config.toml
//! - macOS: ~/Library/Application Support/scrobble-charts/config.toml
//! - Linux: ~/.config/scrobble-charts/config.toml
//!
//! The config file is human-readable and editable. Command-line flags
//! override anything set here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::source::lastfm::{LASTFM_API_BASE, MAX_PAGE_SIZE};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API credentials (keep separate for potential future encryption)
    pub credentials: Credentials,

    /// Last.fm access settings
    pub lastfm: LastFmConfig,

    /// Storage settings
    pub database: DatabaseConfig,
}

/// API credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Last.fm API key for `user.getRecentTracks`
    pub lastfm_api_key: Option<String>,
}

/// Last.fm access settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LastFmConfig {
    /// User imported and charted when `--user` is not given
    pub user: Option<String>,

    /// API endpoint
    pub base_url: String,

    /// Scrobbles per page (1-200)
    pub page_size: u32,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for LastFmConfig {
    fn default() -> Self {
        Self {
            user: None,
            base_url: LASTFM_API_BASE.to_string(),
            page_size: MAX_PAGE_SIZE,
            request_timeout_secs: 30,
        }
    }
}

impl LastFmConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Storage settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file (empty = `scrobble_charts.db` in the working directory)
    pub path: Option<PathBuf>,
}

impl Config {
    /// Reject values the importer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.lastfm.page_size;
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidPageSize(size));
        }
        if self.lastfm.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("scrobble-charts"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location.
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::info!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            tracing::warn!("Using default configuration");
            Config::default()
        }
    }
}

/// Load configuration from an explicit file.
///
/// Unlike [`load`], a missing or malformed file is an error.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    let config: Config =
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
    config.validate()?;

    tracing::info!("Loaded config from {:?}", path);
    Ok(config)
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Page size must be between 1 and 200, got {0}")]
    InvalidPageSize(u32),

    #[error("Request timeout must be at least one second")]
    InvalidTimeout,
}

// ============================================================================
// Tests
// ============================================================================

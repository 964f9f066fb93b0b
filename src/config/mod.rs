//! Configuration management for Estuary.
//!
//! Configuration is read from `~/.config/estuary/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use crate::news::NewsConfig;
use crate::scraper::ScraperConfig;
use crate::store::StoreConfig;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub scraper: ScraperConfig,
    pub news: NewsConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/estuary/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("estuary").join("config.toml"))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# Estuary Configuration
#
# Every key is optional; anything left out keeps its default.

[store]
# "sqlite" or "redis" (redis needs a build with --features redis)
backend = "sqlite"

# SQLite database file (default: <data dir>/estuary/estuary.db)
# path = "/var/lib/estuary/estuary.db"

redis_url = "redis://127.0.0.1:6379/0"

[scraper]
# Category page to scrape
url = "https://www.croma.com/televisions-accessories/c/997"

# Run browser in headless mode (no visible window)
headless = true

window_width = 1920
window_height = 1080

# Seconds to wait for the first product card to appear
initial_wait_secs = 30

# Scroll sweep step in pixels and the pause after each step (milliseconds)
scroll_increment = 300
scroll_pause_ms = 500

# Pauses around centring and hovering each product (milliseconds)
focus_pause_ms = 800
hover_pause_ms = 300

# Seconds to wait for placeholder images to clear before giving up
settle_timeout_secs = 10

# The page counts as settled once fewer placeholder images than this remain
placeholder_threshold = 5

# Image the site shows while the real one loads
placeholder_image = "lazyLoading.gif"

# Extra Chrome flags
chrome_args = []

[news]
max_per_company = 6
summary_limit = 300

# Concurrent feed requests
workers = 4

query_suffix = "pharmaceutical drug"

# Companies are polled in order; a story shared by two companies is
# credited to the first. Omit the list to use the built-in set.
# companies = [
#     { name = "Pfizer", color = "#0093D0" },
#     { name = "Novartis", color = "#EC0016" },
# ]
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

//! User configuration.
//!
//! The provider token lives in a small TOML file, `~/.mararc` by default:
//!
//! ```toml
//! token = "your-tushare-token"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Default rc file name, relative to the home directory.
pub const DEFAULT_CONFIG_FILE: &str = ".mararc";

/// Errors raised while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file does not exist
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The file exists but could not be read
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// No usable token in the file
    #[error("Config file {} must contain a non-empty 'token'", .0.display())]
    MissingToken(PathBuf),
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    token: Option<String>,
}

/// Settings passed to the provider client.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Tushare Pro API token
    pub token: String,
}

impl Config {
    /// Load from `path`, expanding a leading `~/`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = expand_home(path.as_ref());
        if !path.exists() {
            return Err(ConfigError::NotFound(path));
        }
        let text = std::fs::read_to_string(&path)?;
        let config = Self::parse(&text).map_err(|err| match err {
            ConfigError::MissingToken(_) => ConfigError::MissingToken(path.clone()),
            other => other,
        })?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Load from the default location.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(default_path())
    }

    /// Parse TOML text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(text)?;
        match raw.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(Self {
                token: token.to_string(),
            }),
            _ => Err(ConfigError::MissingToken(PathBuf::new())),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config").finish_non_exhaustive()
    }
}

/// `~/.mararc`, or `.mararc` in the working directory when there is no home.
pub fn default_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

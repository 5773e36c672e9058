//! User settings
//!
//! Settings are read from `config.toml` in the platform configuration
//! directory. Every key is optional; a missing file means defaults.

use crate::downloader::PassthroughOptions;
use crate::selection::DEFAULT_PAGE_SIZE;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to determine configuration directory location
    #[error("Failed to determine configuration directory location")]
    ConfigDirectoryNotFound,

    /// Failed to read the settings file
    #[error("Failed to read settings file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The settings file is not valid TOML or has wrong types
    #[error("Invalid settings file {path}: {source}")]
    Invalid {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Per-service overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Passthrough flags used instead of the global ones
    pub options: Option<String>,
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Downloader binary name or path
    pub downloader: String,
    /// Passthrough flags handed to every download
    pub options: String,
    /// Rows per page in the episode menu
    pub page_size: usize,
    /// User agent for every request
    pub user_agent: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Overrides keyed by service name, e.g. `[services.TVNZ]`
    pub services: HashMap<String, ServiceSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            downloader: "devine".to_string(),
            options: String::new(),
            page_size: DEFAULT_PAGE_SIZE,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64)".to_string(),
            timeout_secs: 30,
            services: HashMap::new(),
        }
    }
}

impl Settings {
    /// Loads settings from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_path()?)
    }

    /// Loads settings from `path`, falling back to defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Passthrough options for a service, honouring per-service overrides.
    pub fn options_for(&self, service: &str) -> PassthroughOptions {
        let overridden = self
            .services
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(service))
            .and_then(|(_, settings)| settings.options.as_deref());

        PassthroughOptions::parse(overridden.unwrap_or(&self.options))
    }

    /// Replaces the passthrough options for every service.
    pub fn override_options(&mut self, options: impl Into<String>) {
        self.options = options.into();
        for service in self.services.values_mut() {
            service.options = None;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Path of the settings file.
///
/// - Linux: ~/.config/vinefeeder/config.toml
/// - macOS: ~/Library/Application Support/org.vinefeeder.vinefeeder/config.toml
/// - Windows: %APPDATA%\vinefeeder\vinefeeder\config\config.toml
pub fn config_path() -> Result<PathBuf, ConfigError> {
    let proj_dirs = directories::ProjectDirs::from("org", "vinefeeder", "vinefeeder")
        .ok_or(ConfigError::ConfigDirectoryNotFound)?;
    Ok(proj_dirs.config_dir().join("config.toml"))
}

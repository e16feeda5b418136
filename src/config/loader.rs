//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading the service
//! configuration from a YAML file.

use std::fs;
use std::path::Path;

use crate::error::{RosterError, RosterResult};

use super::types::{AppConfig, AuthConfig, DatabaseConfig, ServerConfig};

/// Environment variable overriding `auth.signing_key`.
pub const SIGNING_KEY_ENV: &str = "ROSTER_SIGNING_KEY";

/// Environment variable overriding `database.url`.
pub const DATABASE_URL_ENV: &str = "ROSTER_DATABASE_URL";

/// Loads and provides access to the service configuration.
///
/// # File Layout
///
/// ```text
/// server:
///   host: "0.0.0.0"
///   port: 8080
/// database:
///   url: "sqlite://roster.db?mode=rwc"
///   max_connections: 5
/// auth:
///   signing_key: "change-me"
///   leeway_seconds: 30
/// ```
///
/// # Example
///
/// ```no_run
/// use shift_roster::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/roster.yaml")?;
/// println!("Listening on {}", loader.server().bind_address());
/// # Ok::<(), shift_roster::error::RosterError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: AppConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified file and applies environment
    /// overrides.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - The file is missing
    /// - The file contains invalid YAML or misses a required field
    /// - The resulting signing key is empty
    pub fn load<P: AsRef<Path>>(path: P) -> RosterResult<Self> {
        let path = path.as_ref();
        let config = Self::load_yaml::<AppConfig>(path)?;
        Self::from_config(config, path, |name| std::env::var(name).ok())
    }

    /// Parses configuration from a YAML string without environment overrides.
    pub fn from_yaml(content: &str) -> RosterResult<Self> {
        let config = serde_yaml::from_str::<AppConfig>(content).map_err(|e| {
            RosterError::ConfigParseError {
                path: "<inline>".to_string(),
                message: e.to_string(),
            }
        })?;
        Self::from_config(config, Path::new("<inline>"), |_| None)
    }

    fn from_config(
        mut config: AppConfig,
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> RosterResult<Self> {
        if let Some(key) = env(SIGNING_KEY_ENV) {
            config.auth.signing_key = key;
        }
        if let Some(url) = env(DATABASE_URL_ENV) {
            config.database.url = url;
        }

        if config.auth.signing_key.trim().is_empty() {
            return Err(RosterError::ConfigParseError {
                path: path.display().to_string(),
                message: "auth.signing_key must not be empty".to_string(),
            });
        }

        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> RosterResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| RosterError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| RosterError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the listener settings.
    pub fn server(&self) -> &ServerConfig {
        &self.config.server
    }

    /// Returns the database settings.
    pub fn database(&self) -> &DatabaseConfig {
        &self.config.database
    }

    /// Returns the token settings.
    pub fn auth(&self) -> &AuthConfig {
        &self.config.auth
    }
}

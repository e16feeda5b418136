//! Configuration loading and management for the roster service.
//!
//! This module loads the listener, database and token settings from a YAML
//! file, with environment overrides for secrets.
//!
//! # Example
//!
//! ```no_run
//! use shift_roster::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/roster.yaml").unwrap();
//! println!("Database: {}", config.database().url);
//! ```

mod loader;
mod types;

pub use loader::{ConfigLoader, DATABASE_URL_ENV, SIGNING_KEY_ENV};
pub use types::{AppConfig, AuthConfig, DatabaseConfig, ServerConfig};

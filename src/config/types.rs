//! Configuration types for the roster service.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from the YAML configuration file.

use serde::Deserialize;

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind (e.g., "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,
    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// The `host:port` string handed to the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection URL (e.g., "sqlite://roster.db?mode=rwc").
    pub url: String,
    /// Upper bound of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Bearer token verification settings.
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the token issuer.
    pub signing_key: String,
    /// Clock skew tolerated when checking `exp`, in seconds.
    #[serde(default = "default_leeway")]
    pub leeway_seconds: u64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_key", &"<redacted>")
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

/// The complete service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// HTTP listener.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection.
    pub database: DatabaseConfig,
    /// Token verification.
    pub auth: AuthConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    5
}

fn default_leeway() -> u64 {
    30
}

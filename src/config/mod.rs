/// Configuration management for the workflow upload service
///
/// Handles server binding, the SQLite store, and the token verification key.
/// Everything is resolved once at startup and handed to the components that need it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Token verification settings
    pub auth: AuthConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
}

/// SQLite store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL (e.g., "sqlite://data/workflows.db")
    pub url: String,
    /// Upper bound on pooled connections
    pub max_connections: u32,
    /// How long a writer waits on SQLite's lock before giving up
    pub busy_timeout_secs: u64,
}

/// Shared-secret settings for HS256 bearer tokens
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Build configuration from ENV_VARs for k8s/container deployment
    ///
    /// Everything has a default except `JWT_SECRET`, which must be provided.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .context("JWT_SECRET must be set to verify upload tokens")?;

        Ok(Self {
            server: ServerConfig {
                host: lookup("WORKFLOW_UPLOAD_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(lookup("WORKFLOW_UPLOAD_PORT"), 3004),
            },
            database: DatabaseConfig {
                url: lookup("WORKFLOW_UPLOAD_DATABASE_URL")
                    .unwrap_or_else(|| "sqlite://data/workflows.db".to_string()),
                max_connections: parse_or(lookup("WORKFLOW_UPLOAD_DB_MAX_CONNECTIONS"), 10),
                busy_timeout_secs: parse_or(lookup("WORKFLOW_UPLOAD_DB_BUSY_TIMEOUT_SECS"), 5),
            },
            auth: AuthConfig { jwt_secret },
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.parse().ok()).unwrap_or(default)
}

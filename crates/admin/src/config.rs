//! Admin directory configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MEMBER_AUTHORITY_CHANNEL` - Channel that role-change events are published on
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `ADMIN_DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `ADMIN_DB_ACQUIRE_TIMEOUT_SECS` - Seconds to wait for a pooled connection (default: 10)
//! - `RUST_LOG` - Log filter (default: `bitbox_admin=info`)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text

use secrecy::SecretString;
use thiserror::Error;

/// Longest channel name `PostgreSQL` accepts (`NAMEDATALEN - 1`).
const MAX_CHANNEL_LENGTH: usize = 63;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Settings for the directory service itself.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// Channel that role-change events are published on.
    pub member_authority_channel: String,
}

impl DirectoryConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the channel name is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the channel name is missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let channel = get_required(&lookup, "MEMBER_AUTHORITY_CHANNEL")?;
        validate_channel(&channel)?;

        Ok(Self {
            member_authority_channel: channel,
        })
    }
}

/// `PostgreSQL` connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub url: SecretString,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or a numeric
    /// setting does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or a numeric
    /// setting does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Fallback to generic DATABASE_URL
        let url = lookup("ADMIN_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .ok_or_else(|| ConfigError::MissingEnvVar("ADMIN_DATABASE_URL".to_string()))?;

        let max_connections = get_or_default(&lookup, "ADMIN_DB_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidEnvVar(
                    "ADMIN_DB_MAX_CONNECTIONS".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;
        let acquire_timeout_secs = get_or_default(&lookup, "ADMIN_DB_ACQUIRE_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("ADMIN_DB_ACQUIRE_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            url: SecretString::from(url),
            max_connections,
            acquire_timeout_secs,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn get_required(lookup: impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_or_default(lookup: impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| default.to_string())
}

fn validate_channel(channel: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| {
        ConfigError::InvalidEnvVar("MEMBER_AUTHORITY_CHANNEL".to_string(), reason.to_string())
    };

    if channel.len() > MAX_CHANNEL_LENGTH {
        return Err(invalid("must be at most 63 characters"));
    }
    if !channel
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(invalid("may only contain letters, digits, '_', '-' and '.'"));
    }
    Ok(())
}

//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod watch;

use serde::Serialize;
use thiserror::Error;

use bitbox_admin::{ConfigError, DirectoryError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The directory rejected or failed the operation.
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Output could not be encoded.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

impl CommandError {
    /// Returns `true` if the request itself was rejected.
    pub const fn is_rejection(&self) -> bool {
        match self {
            Self::Directory(e) => e.is_rejection(),
            _ => false,
        }
    }
}

/// Print a value to stdout as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), CommandError> {
    let output = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{output}");
    }
    Ok(())
}

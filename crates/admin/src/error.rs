//! Error type returned by directory operations.

use thiserror::Error;

use bitbox_admin_core::{AdminId, Email};

use crate::db::RepositoryError;
use crate::models::ValidationError;

/// Errors returned by [`AdminDirectory`](crate::services::AdminDirectory).
///
/// Event publishing failures never appear here; the directory logs them and
/// carries on.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Another active admin already uses this email.
    #[error("Duplicate email: {0}")]
    DuplicateEmail(Email),

    /// A record with the caller-supplied ID already exists, deleted or not.
    #[error("Duplicate admin id: {0}")]
    DuplicateId(AdminId),

    /// No admin record has this ID.
    #[error("Admin not found: {0}")]
    NotFound(AdminId),

    /// Input failed a precondition check.
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The record store failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl DirectoryError {
    /// Returns `true` for errors caused by the request rather than by
    /// infrastructure. Retrying these unchanged fails the same way.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::DuplicateEmail(_)
                | Self::DuplicateId(_)
                | Self::NotFound(_)
                | Self::Validation(_)
        )
    }
}

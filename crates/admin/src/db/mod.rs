//! Persistence for admin records.
//!
//! # Tables
//!
//! - `admin.admin` - Admin records, soft-deleted via the `deleted` flag
//!
//! # Transactions
//!
//! The directory never talks to a connection directly. Every operation opens
//! an [`AdminTransaction`] through an [`AdminStore`], performs its existence
//! checks and writes on it, and commits. A transaction that is dropped without
//! `commit` is rolled back, so any `?` early return leaves the store untouched.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p bitbox-admin-cli -- migrate
//! ```

pub mod admins;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use bitbox_admin_core::{AdminId, Email};

use crate::config::DatabaseConfig;
use crate::models::Admin;

pub use admins::PgAdminStore;
pub use memory::InMemoryAdminStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A record with this ID already exists.
    #[error("admin id already exists: {0}")]
    IdConflict(AdminId),
}

/// Source of admin transactions.
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Open a new transaction.
    async fn begin(&self) -> Result<Box<dyn AdminTransaction>, RepositoryError>;
}

/// Unit of work over admin records.
///
/// Reads observe the transaction's own writes. Nothing becomes visible to
/// other transactions until [`commit`](AdminTransaction::commit).
#[async_trait]
pub trait AdminTransaction: Send {
    /// Count active (non-deleted) admins with the given email.
    async fn count_active_by_email(&mut self, email: &Email) -> Result<i64, RepositoryError>;

    /// Find an admin by ID, deleted or not.
    async fn find_by_id(&mut self, id: AdminId) -> Result<Option<Admin>, RepositoryError>;

    /// Find an admin by ID and hold it against concurrent writers until the
    /// transaction ends.
    async fn find_by_id_for_update(
        &mut self,
        id: AdminId,
    ) -> Result<Option<Admin>, RepositoryError>;

    /// All active admins, oldest first.
    async fn find_all_active(&mut self) -> Result<Vec<Admin>, RepositoryError>;

    /// Insert a record whose ID is not yet taken, returning the stored version.
    ///
    /// Never overwrites an existing record, deleted or not.
    ///
    /// Returns `RepositoryError::IdConflict` if the ID exists and
    /// `RepositoryError::Conflict` if another active admin has the email.
    async fn insert(&mut self, admin: &Admin) -> Result<Admin, RepositoryError>;

    /// Insert or replace an admin record, returning the stored version.
    ///
    /// Returns `RepositoryError::Conflict` if the write would give two active
    /// admins the same email.
    async fn save(&mut self, admin: &Admin) -> Result<Admin, RepositoryError>;

    /// Make the transaction's writes durable.
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool from the database configuration.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(config.url.expose_secret())
        .await
}

/// Run the embedded admin schema migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history is inconsistent.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

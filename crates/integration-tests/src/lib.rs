//! Integration tests for the Bitbox admin directory.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory scenarios
//! cargo test -p bitbox-admin-integration-tests
//!
//! # Include the PostgreSQL scenarios
//! TEST_DATABASE_URL=postgres://localhost/bitbox_admin_test \
//!     cargo test -p bitbox-admin-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `admin_directory` - Directory behavior against in-memory collaborators
//! - `postgres_store` - Directory behavior against a real database

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use sqlx::PgPool;

use bitbox_admin::db::{InMemoryAdminStore, create_pool, run_migrations};
use bitbox_admin::events::{EventPublisher, InMemoryPublisher, PublishError};
use bitbox_admin::models::NewAdmin;
use bitbox_admin::{AdminDirectory, DatabaseConfig};
use bitbox_admin_core::{AuthorityType, Email, RoleChangeEvent};

/// Channel used by every test directory.
pub const TEST_CHANNEL: &str = "member_authority_test";

/// A directory wired to in-memory collaborators that tests can inspect.
pub struct TestContext {
    pub directory: AdminDirectory,
    pub store: InMemoryAdminStore,
    pub publisher: InMemoryPublisher,
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        let store = InMemoryAdminStore::new();
        let publisher = InMemoryPublisher::new();
        let directory = AdminDirectory::new(
            Arc::new(store.clone()),
            Arc::new(publisher.clone()),
            TEST_CHANNEL,
        );
        Self {
            directory,
            store,
            publisher,
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Publisher whose broker is always unreachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailablePublisher;

#[async_trait]
impl EventPublisher for UnavailablePublisher {
    async fn publish(&self, _channel: &str, _event: &RoleChangeEvent) -> Result<(), PublishError> {
        Err(PublishError::Closed("broker unavailable".to_owned()))
    }
}

/// Creation input with a valid name and no profile image.
///
/// # Panics
///
/// Panics if `email` is not a valid address.
#[must_use]
pub fn new_admin(email: &str, authority: AuthorityType) -> NewAdmin {
    NewAdmin {
        id: None,
        email: Email::parse(email).expect("test email must be valid"),
        name: "Kim Bitbox".to_owned(),
        profile_image_url: None,
        authority,
    }
}

/// A unique, valid email address for tests that share a database.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@bitbox.test", uuid::Uuid::new_v4().simple())
}

/// Connect to `TEST_DATABASE_URL` and apply migrations.
///
/// Returns `None` when the variable is not set.
///
/// # Panics
///
/// Panics if the database is unreachable or migrations fail.
pub async fn postgres_pool() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let config = DatabaseConfig {
        url: SecretString::from(url),
        max_connections: 5,
        acquire_timeout_secs: 10,
    };
    let pool = create_pool(&config)
        .await
        .expect("failed to connect to TEST_DATABASE_URL");
    run_migrations(&pool).await.expect("failed to run migrations");
    Some(pool)
}

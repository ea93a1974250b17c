//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! bitbox-admin migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Admin migrations live in `crates/admin/migrations/` and are embedded in the
//! binary at build time.

use bitbox_admin::DatabaseConfig;
use bitbox_admin::db::{create_pool, run_migrations};

use super::CommandError;

/// Run admin database migrations.
pub async fn run() -> Result<(), CommandError> {
    let config = DatabaseConfig::from_env()?;

    tracing::info!("Connecting to admin database...");
    let pool = create_pool(&config).await?;

    tracing::info!("Running admin migrations...");
    run_migrations(&pool).await?;

    tracing::info!("Admin migrations complete!");
    Ok(())
}

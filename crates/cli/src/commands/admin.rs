//! Admin directory commands.
//!
//! # Usage
//!
//! ```bash
//! bitbox-admin admin create -e admin@example.com -n "Admin Name" -r teacher
//! bitbox-admin admin get <id>
//! bitbox-admin admin list
//! bitbox-admin admin update <id> -n "New Name" --profile-image https://cdn.example.com/a.png
//! bitbox-admin admin role <id> manager
//! bitbox-admin admin delete <id>
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string for admin database
//! - `MEMBER_AUTHORITY_CHANNEL` - Channel that role changes are announced on

use std::sync::Arc;

use serde_json::json;

use bitbox_admin::db::{PgAdminStore, create_pool};
use bitbox_admin::events::PgNotifyPublisher;
use bitbox_admin::models::{AdminPatch, NewAdmin};
use bitbox_admin::{AdminDirectory, DatabaseConfig, DirectoryConfig};
use bitbox_admin_core::{AdminId, AuthorityType};

use super::{CommandError, print_json};

/// Build a directory backed by `PostgreSQL` from the environment.
pub async fn connect() -> Result<AdminDirectory, CommandError> {
    let directory_config = DirectoryConfig::from_env()?;
    let database_config = DatabaseConfig::from_env()?;

    tracing::debug!("Connecting to admin database...");
    let pool = create_pool(&database_config).await?;

    Ok(AdminDirectory::new(
        Arc::new(PgAdminStore::new(pool.clone())),
        Arc::new(PgNotifyPublisher::new(pool)),
        directory_config.member_authority_channel,
    ))
}

/// Register an admin and print the stored record.
pub async fn create(directory: &AdminDirectory, input: NewAdmin) -> Result<(), CommandError> {
    let admin = directory.create(input).await?;
    print_json(&admin)
}

/// Print an admin record.
pub async fn get(directory: &AdminDirectory, id: AdminId) -> Result<(), CommandError> {
    let admin = directory.get_by_id(id).await?;
    print_json(&admin)
}

/// Print every active admin.
pub async fn list(directory: &AdminDirectory) -> Result<(), CommandError> {
    let admins = directory.list_all().await?;
    print_json(&admins)
}

/// Update an admin's profile and print the outcome.
pub async fn update(
    directory: &AdminDirectory,
    id: AdminId,
    patch: AdminPatch,
) -> Result<(), CommandError> {
    let updated = directory.update(id, patch).await?;
    print_json(&json!({ "id": id, "updated": updated }))
}

/// Change an admin's authority and print the stored record.
pub async fn role(
    directory: &AdminDirectory,
    id: AdminId,
    authority: AuthorityType,
) -> Result<(), CommandError> {
    let admin = directory.update_role(id, authority).await?;
    print_json(&admin)
}

/// Soft-delete an admin and print the outcome.
pub async fn delete(directory: &AdminDirectory, id: AdminId) -> Result<(), CommandError> {
    directory.delete(id).await?;
    print_json(&json!({ "id": id, "deleted": true }))
}

//! Role change listener.
//!
//! Subscribes to the configured channel with `LISTEN` and prints every
//! role change event as it arrives, until interrupted.
//!
//! # Usage
//!
//! ```bash
//! bitbox-admin watch
//! ```

use sqlx::postgres::PgListener;

use bitbox_admin::db::create_pool;
use bitbox_admin::{DatabaseConfig, DirectoryConfig};
use bitbox_admin_core::RoleChangeEvent;

use super::{CommandError, print_json};

/// Listen for role change events until Ctrl-C.
pub async fn run() -> Result<(), CommandError> {
    let directory_config = DirectoryConfig::from_env()?;
    let database_config = DatabaseConfig::from_env()?;
    let channel = directory_config.member_authority_channel;

    let pool = create_pool(&database_config).await?;
    let mut listener = PgListener::connect_with(&pool).await?;
    listener.listen(&channel).await?;
    tracing::info!(%channel, "Listening for role change events");

    loop {
        tokio::select! {
            notification = listener.recv() => {
                let notification = notification?;
                match serde_json::from_str::<RoleChangeEvent>(notification.payload()) {
                    Ok(event) => print_json(&event)?,
                    Err(e) => tracing::warn!(
                        %channel,
                        payload = notification.payload(),
                        error = %e,
                        "Ignoring malformed role change event"
                    ),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopped listening");
                return Ok(());
            }
        }
    }
}

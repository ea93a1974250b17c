//! `PostgreSQL` `NOTIFY` publisher.
//!
//! Events are sent with `pg_notify(channel, payload)` where the payload is the
//! event's JSON encoding. Consumers `LISTEN` on the same channel name.
//!
//! The notification runs on its own pool connection in a spawned task, outside
//! the directory's transaction, so it is neither delayed nor discarded by the
//! outcome of the surrounding write.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument, warn};

use bitbox_admin_core::RoleChangeEvent;

use super::{EventPublisher, PublishError};

/// Publishes role-change events as `PostgreSQL` notifications.
#[derive(Debug, Clone)]
pub struct PgNotifyPublisher {
    pool: PgPool,
}

impl PgNotifyPublisher {
    /// Create a publisher sending notifications through `pool`.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventPublisher for PgNotifyPublisher {
    #[instrument(skip(self, event), fields(member_id = %event.member_id, authority = %event.member_authority))]
    async fn publish(&self, channel: &str, event: &RoleChangeEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_string(event)?;
        let channel = channel.to_owned();
        let pool = self.pool.clone();

        tokio::spawn(async move {
            let result = sqlx::query("SELECT pg_notify($1, $2)")
                .bind(&channel)
                .bind(&payload)
                .execute(&pool)
                .await;

            match result {
                Ok(_) => debug!(%channel, "Role change notification sent"),
                Err(e) => warn!(%channel, error = %e, "Failed to send role change notification"),
            }
        });

        Ok(())
    }
}

//! Role-change event publishing.
//!
//! The directory hands each [`RoleChangeEvent`] to an [`EventPublisher`] and
//! moves on. Delivery is the publisher's concern: nothing here waits for an
//! acknowledgment, and a failed hand-off never fails the operation that
//! produced the event.

pub mod memory;
pub mod pg_notify;

use async_trait::async_trait;
use thiserror::Error;

use bitbox_admin_core::RoleChangeEvent;

pub use memory::{InMemoryPublisher, PublishedEvent};
pub use pg_notify::PgNotifyPublisher;

/// Errors a publisher can report while accepting an event.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The event could not be encoded.
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The publisher can no longer accept events.
    #[error("publisher closed: {0}")]
    Closed(String),
}

/// Fire-and-forget sink for role-change events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Hand `event` off for delivery on `channel`.
    ///
    /// Returns once the event is accepted, not once it is delivered.
    async fn publish(&self, channel: &str, event: &RoleChangeEvent) -> Result<(), PublishError>;
}

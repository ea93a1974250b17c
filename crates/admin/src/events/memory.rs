//! In-process publisher.
//!
//! Keeps every published event for inspection and forwards it to any live
//! broadcast subscribers.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast};

use bitbox_admin_core::RoleChangeEvent;

use super::{EventPublisher, PublishError};

const SUBSCRIBER_CAPACITY: usize = 64;

/// An event together with the channel it was published on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
    /// Channel name.
    pub channel: String,
    /// The event payload.
    pub event: RoleChangeEvent,
}

/// Publisher that records events in memory.
#[derive(Debug, Clone)]
pub struct InMemoryPublisher {
    published: Arc<Mutex<Vec<PublishedEvent>>>,
    sender: broadcast::Sender<PublishedEvent>,
}

impl Default for InMemoryPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPublisher {
    /// Create a publisher with no recorded events.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(SUBSCRIBER_CAPACITY);
        Self {
            published: Arc::default(),
            sender,
        }
    }

    /// Every event published so far, oldest first.
    pub async fn published(&self) -> Vec<PublishedEvent> {
        self.published.lock().await.clone()
    }

    /// Receive events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventPublisher for InMemoryPublisher {
    async fn publish(&self, channel: &str, event: &RoleChangeEvent) -> Result<(), PublishError> {
        let published = PublishedEvent {
            channel: channel.to_owned(),
            event: *event,
        };
        self.published.lock().await.push(published.clone());
        // No subscribers is fine; the event is still recorded.
        let _ = self.sender.send(published);
        Ok(())
    }
}

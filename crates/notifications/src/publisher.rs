use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use thiserror::Error;
use tracing::debug;

use crate::event::LikeNotificationEvent;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("event queue is not configured")]
    Unavailable,
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &LikeNotificationEvent) -> Result<(), QueueError>;
}

/// Publishes onto a Redis pub/sub channel. Subscribers only see events
/// published while they are attached.
#[derive(Clone)]
pub struct RedisEventPublisher {
    connection: ConnectionManager,
    topic: String,
}

impl RedisEventPublisher {
    pub fn new(connection: ConnectionManager, topic: impl Into<String>) -> Self {
        Self {
            connection,
            topic: topic.into(),
        }
    }
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, event: &LikeNotificationEvent) -> Result<(), QueueError> {
        let payload = event.to_payload()?;
        let mut connection = self.connection.clone();
        let receivers: i64 = connection.publish(&self.topic, payload).await?;
        debug!(topic = %self.topic, receivers, "published like notification");
        Ok(())
    }
}

/// Stand-in when no broker is configured: every publish fails with [`QueueError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct DisabledEventPublisher;

#[async_trait]
impl EventPublisher for DisabledEventPublisher {
    async fn publish(&self, _event: &LikeNotificationEvent) -> Result<(), QueueError> {
        Err(QueueError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_publisher_reports_unavailable() {
        let event = LikeNotificationEvent::for_like("a@x.com", "u1");
        let err = DisabledEventPublisher.publish(&event).await.unwrap_err();
        assert!(matches!(err, QueueError::Unavailable));
    }
}

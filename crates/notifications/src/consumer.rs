//! Long-running loop that turns queued like events into emails.

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::email::{EmailSender, LIKE_NOTIFICATION_SUBJECT};
use crate::event::LikeNotificationEvent;
use crate::publisher::QueueError;

/// Outcome counters for one consumer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub delivered: u64,
    pub malformed: u64,
    pub failed: u64,
}

#[derive(Clone)]
pub struct NotificationConsumer {
    sender: Arc<dyn EmailSender>,
    topic: String,
}

impl NotificationConsumer {
    pub fn new(sender: Arc<dyn EmailSender>, topic: impl Into<String>) -> Self {
        Self {
            sender,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Subscribe to the topic and process messages until `cancel` fires.
    ///
    /// Pub/sub delivery starts at subscription time: events published before
    /// this call, or while the consumer is down, are never seen.
    pub async fn run(
        &self,
        client: &redis::Client,
        cancel: CancellationToken,
    ) -> Result<ConsumerStats, QueueError> {
        let mut pubsub = client.get_async_pubsub().await?;
        pubsub.subscribe(&self.topic).await?;
        info!(topic = %self.topic, "notification consumer subscribed");

        let messages = pubsub
            .on_message()
            .map(|message| message.get_payload_bytes().to_vec());
        let stats = self.process(messages, &cancel).await;

        // The subscription connection is released when `pubsub` drops here.
        Ok(stats)
    }

    /// Handle payloads one at a time. Bad payloads and failed sends are logged
    /// and skipped so a single poisoned message cannot stop the loop.
    pub async fn process<S, P>(&self, messages: S, cancel: &CancellationToken) -> ConsumerStats
    where
        S: Stream<Item = P>,
        P: AsRef<[u8]>,
    {
        futures_util::pin_mut!(messages);
        let mut stats = ConsumerStats::default();

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(topic = %self.topic, "notification consumer cancelled");
                    break;
                }
                next = messages.next() => next,
            };

            let Some(payload) = next else {
                warn!(topic = %self.topic, "notification stream ended");
                break;
            };

            self.handle(payload.as_ref(), &mut stats).await;
        }

        info!(
            delivered = stats.delivered,
            malformed = stats.malformed,
            failed = stats.failed,
            "notification consumer stopped"
        );
        stats
    }

    async fn handle(&self, payload: &[u8], stats: &mut ConsumerStats) {
        let event = match LikeNotificationEvent::from_payload(payload) {
            Ok(event) => event,
            Err(err) => {
                stats.malformed += 1;
                warn!(error = %err, "skipping malformed notification payload");
                return;
            }
        };

        match self
            .sender
            .send(&event.email, LIKE_NOTIFICATION_SUBJECT, &event.message)
            .await
        {
            Ok(()) => {
                stats.delivered += 1;
                info!(to = %event.email, "like notification sent");
            }
            Err(err) => {
                stats.failed += 1;
                error!(to = %event.email, error = %err, "failed to send like notification");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::EmailError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
        fail_for: Option<String>,
    }

    #[async_trait]
    impl EmailSender for RecordingSender {
        async fn send(&self, to: &str, _subject: &str, body: &str) -> Result<(), EmailError> {
            if self.fail_for.as_deref() == Some(to) {
                return Err(EmailError::Rejected {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), body.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn malformed_payload_is_skipped_and_next_is_delivered() {
        let sender = Arc::new(RecordingSender::default());
        let consumer = NotificationConsumer::new(sender.clone(), "send_notification");

        let payloads = futures_util::stream::iter(vec![
            "{not json".to_string(),
            r#"{"email":"b@x.com","message":"liked"}"#.to_string(),
        ]);
        let stats = consumer.process(payloads, &CancellationToken::new()).await;

        assert_eq!(
            stats,
            ConsumerStats {
                delivered: 1,
                malformed: 1,
                failed: 0
            }
        );
        let sent = sender.sent.lock().unwrap();
        assert_eq!(
            sent.as_slice(),
            &[("b@x.com".to_string(), "liked".to_string())]
        );
    }

    #[tokio::test]
    async fn send_failure_does_not_stop_the_loop() {
        let sender = Arc::new(RecordingSender {
            fail_for: Some("down@x.com".to_string()),
            ..RecordingSender::default()
        });
        let consumer = NotificationConsumer::new(sender.clone(), "send_notification");

        let payloads = futures_util::stream::iter(vec![
            r#"{"email":"down@x.com","message":"one"}"#,
            r#"{"email":"up@x.com","message":"two"}"#,
        ]);
        let stats = consumer.process(payloads, &CancellationToken::new()).await;

        assert_eq!(stats.failed, 1);
        assert_eq!(stats.delivered, 1);
        assert_eq!(sender.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cancellation_stops_an_idle_consumer() {
        let consumer = NotificationConsumer::new(Arc::new(RecordingSender::default()), "t");
        let cancel = CancellationToken::new();

        let handle = {
            let consumer = consumer.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                consumer
                    .process(futures_util::stream::pending::<Vec<u8>>(), &cancel)
                    .await
            })
        };

        cancel.cancel();
        let stats = tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("consumer should stop after cancellation")
            .unwrap();
        assert_eq!(stats, ConsumerStats::default());
    }
}

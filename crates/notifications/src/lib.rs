//! Like notifications: the event published when a tweet is liked, the queue
//! it travels through, and the consumer that turns it into an email.

pub mod consumer;
pub mod email;
pub mod event;
pub mod publisher;

pub use consumer::{ConsumerStats, NotificationConsumer};
pub use email::{
    BrevoEmailSender, EmailError, EmailSender, LogEmailSender, LIKE_NOTIFICATION_SUBJECT,
    VERIFICATION_SUBJECT,
};
pub use event::LikeNotificationEvent;
pub use publisher::{DisabledEventPublisher, EventPublisher, QueueError, RedisEventPublisher};

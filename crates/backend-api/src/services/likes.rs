//! Likes, and the notification event each new like produces.

use sqlx::SqlitePool;
use tracing::{debug, error, info};
use warbler_database::{Like, LikeRepository, TweetRepository, UserRepository};
use warbler_notifications::{EventPublisher, LikeNotificationEvent, QueueError};

use super::error::ServiceError;

/// Record the like, then publish a notification for the tweet's author.
///
/// The like is written first and kept even when publishing fails; the
/// caller then gets a dependency error while the like stays counted.
/// With no queue configured the notification is skipped.
pub async fn like_tweet(
    pool: &SqlitePool,
    publisher: &dyn EventPublisher,
    user_id: &str,
    tweet_id: &str,
) -> Result<Like, ServiceError> {
    let tweet = TweetRepository::new(pool.clone())
        .find_by_id(tweet_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("tweet not found"))?;

    let like = LikeRepository::new(pool.clone())
        .like(user_id, tweet_id)
        .await
        .map_err(|e| match ServiceError::from(e) {
            ServiceError::Conflict(_) => ServiceError::conflict("tweet already liked"),
            other => other,
        })?;
    info!(tweet_id, user_id, "tweet liked");

    let Some(owner) = UserRepository::new(pool.clone())
        .find_by_id(&tweet.user_id)
        .await?
    else {
        debug!(tweet_id, "tweet author no longer exists, skipping notification");
        return Ok(like);
    };

    let event = LikeNotificationEvent::for_like(owner.email, user_id);
    match publisher.publish(&event).await {
        Ok(()) => {}
        Err(QueueError::Unavailable) => {
            debug!(tweet_id, "notification queue disabled, skipping like notification");
        }
        Err(e) => {
            error!(tweet_id, user_id, error = %e, "failed to publish like notification");
            return Err(e.into());
        }
    }

    Ok(like)
}

pub async fn unlike_tweet(pool: &SqlitePool, user_id: &str, tweet_id: &str) -> Result<(), ServiceError> {
    LikeRepository::new(pool.clone())
        .unlike(user_id, tweet_id)
        .await
        .map_err(|e| match ServiceError::from(e) {
            ServiceError::NotFound(_) => ServiceError::not_found("like not found"),
            other => other,
        })?;

    info!(tweet_id, user_id, "tweet unliked");
    Ok(())
}

pub async fn like_count(pool: &SqlitePool, tweet_id: &str) -> Result<i64, ServiceError> {
    if TweetRepository::new(pool.clone()).find_by_id(tweet_id).await?.is_none() {
        return Err(ServiceError::not_found("tweet not found"));
    }

    Ok(LikeRepository::new(pool.clone()).count(tweet_id).await?)
}

use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use warbler_database::{
    ListQuery, NewTweet, Page, Tweet, TweetRepository, UpdateTweet, UserRepository,
};

use super::error::ServiceError;
use super::validation::validate_tweet_content;

pub async fn create_tweet(
    pool: &SqlitePool,
    user_id: &str,
    content: String,
    media: Option<String>,
) -> Result<Tweet, ServiceError> {
    validate_tweet_content(&content)?;

    let tweet = TweetRepository::new(pool.clone())
        .create(&NewTweet {
            user_id: user_id.to_string(),
            content,
            media,
        })
        .await
        .map_err(|e| {
            warn!(user_id, error = %e, "failed to create tweet");
            ServiceError::from(e)
        })?;

    info!(tweet_id = %tweet.id, user_id, "tweet created");
    Ok(tweet)
}

pub async fn get_tweet(pool: &SqlitePool, tweet_id: &str) -> Result<Tweet, ServiceError> {
    TweetRepository::new(pool.clone())
        .find_by_id(tweet_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("tweet not found"))
}

async fn ensure_owner(
    repo: &TweetRepository,
    tweet_id: &str,
    user_id: &str,
) -> Result<(), ServiceError> {
    if !repo.is_owner(tweet_id, user_id).await? {
        debug!(tweet_id, user_id, "tweet modification by non-owner");
        return Err(ServiceError::Forbidden);
    }
    Ok(())
}

pub async fn update_tweet(
    pool: &SqlitePool,
    user_id: &str,
    tweet_id: &str,
    request: UpdateTweet,
) -> Result<Tweet, ServiceError> {
    if let Some(content) = &request.content {
        validate_tweet_content(content)?;
    }

    let repo = TweetRepository::new(pool.clone());
    ensure_owner(&repo, tweet_id, user_id).await?;

    let tweet = repo.update(tweet_id, &request).await.map_err(|e| {
        warn!(tweet_id, error = %e, "failed to update tweet");
        ServiceError::from(e)
    })?;

    info!(tweet_id, "tweet updated");
    Ok(tweet)
}

pub async fn delete_tweet(pool: &SqlitePool, user_id: &str, tweet_id: &str) -> Result<(), ServiceError> {
    let repo = TweetRepository::new(pool.clone());
    ensure_owner(&repo, tweet_id, user_id).await?;

    repo.delete(tweet_id).await.map_err(|e| {
        warn!(tweet_id, error = %e, "failed to delete tweet");
        ServiceError::from(e)
    })?;

    info!(tweet_id, "tweet deleted");
    Ok(())
}

pub async fn list_tweets(pool: &SqlitePool, query: &ListQuery) -> Result<Page<Tweet>, ServiceError> {
    Ok(TweetRepository::new(pool.clone()).list(query).await?)
}

/// Tweets of one live user. Unknown or deleted users are not found.
pub async fn list_user_tweets(
    pool: &SqlitePool,
    user_id: &str,
    query: &ListQuery,
) -> Result<Page<Tweet>, ServiceError> {
    if UserRepository::new(pool.clone()).find_by_id(user_id).await?.is_none() {
        return Err(ServiceError::not_found("user not found"));
    }

    Ok(TweetRepository::new(pool.clone())
        .list_by_user(user_id, query)
        .await?)
}

/// Count a view by `user_id`; repeated views by the same user are ignored.
pub async fn record_view(pool: &SqlitePool, user_id: &str, tweet_id: &str) -> Result<(), ServiceError> {
    let repo = TweetRepository::new(pool.clone());
    if repo.find_by_id(tweet_id).await?.is_none() {
        return Err(ServiceError::not_found("tweet not found"));
    }

    let counted = repo.record_view(user_id, tweet_id).await?;
    debug!(tweet_id, user_id, counted, "tweet viewed");
    Ok(())
}

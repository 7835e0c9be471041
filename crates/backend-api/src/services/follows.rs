use sqlx::SqlitePool;
use tracing::info;
use warbler_database::{Follow, FollowRepository, UserRepository};

use super::error::ServiceError;

async fn ensure_user(pool: &SqlitePool, user_id: &str) -> Result<(), ServiceError> {
    match UserRepository::new(pool.clone()).find_by_id(user_id).await? {
        Some(_) => Ok(()),
        None => Err(ServiceError::not_found("user not found")),
    }
}

pub async fn follow_user(
    pool: &SqlitePool,
    follower_id: &str,
    following_id: &str,
) -> Result<Follow, ServiceError> {
    if follower_id == following_id {
        return Err(ServiceError::validation("you cannot follow yourself"));
    }
    ensure_user(pool, following_id).await?;

    let follow = FollowRepository::new(pool.clone())
        .follow(follower_id, following_id)
        .await
        .map_err(|e| match ServiceError::from(e) {
            ServiceError::Conflict(_) => ServiceError::conflict("already following this user"),
            other => other,
        })?;

    info!(follower_id, following_id, "user followed");
    Ok(follow)
}

pub async fn unfollow_user(
    pool: &SqlitePool,
    follower_id: &str,
    following_id: &str,
) -> Result<(), ServiceError> {
    FollowRepository::new(pool.clone())
        .unfollow(follower_id, following_id)
        .await
        .map_err(|e| match ServiceError::from(e) {
            ServiceError::NotFound(_) => ServiceError::not_found("not following this user"),
            other => other,
        })?;

    info!(follower_id, following_id, "user unfollowed");
    Ok(())
}

pub async fn followers(pool: &SqlitePool, user_id: &str) -> Result<Vec<Follow>, ServiceError> {
    ensure_user(pool, user_id).await?;
    Ok(FollowRepository::new(pool.clone()).followers(user_id).await?)
}

pub async fn following(pool: &SqlitePool, user_id: &str) -> Result<Vec<Follow>, ServiceError> {
    ensure_user(pool, user_id).await?;
    Ok(FollowRepository::new(pool.clone()).following(user_id).await?)
}

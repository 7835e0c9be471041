//! Like repository for database operations.

use crate::entities::Like;
use crate::types::{DatabaseError, DatabaseResult};
use chrono::Utc;
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct LikeRepository {
    pool: SqlitePool,
}

impl LikeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a like. Liking twice is [`DatabaseError::Duplicate`], an unknown
    /// tweet or user is [`DatabaseError::NotFound`].
    pub async fn like(&self, user_id: &str, tweet_id: &str) -> DatabaseResult<Like> {
        let created_at = Utc::now();

        sqlx::query("INSERT INTO likes (user_id, tweet_id, created_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(tweet_id)
            .bind(created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_statement("like tweet", "tweet", e))?;

        Ok(Like {
            user_id: user_id.to_string(),
            tweet_id: tweet_id.to_string(),
            created_at,
        })
    }

    pub async fn unlike(&self, user_id: &str, tweet_id: &str) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM likes WHERE user_id = ? AND tweet_id = ?")
            .bind(user_id)
            .bind(tweet_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_statement("unlike tweet", "like", e))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("like on tweet {tweet_id}")));
        }

        Ok(())
    }

    pub async fn count(&self, tweet_id: &str) -> DatabaseResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE tweet_id = ?")
            .bind(tweet_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_statement("count likes", "tweet", e))
    }
}

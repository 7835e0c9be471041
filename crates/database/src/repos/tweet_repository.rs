//! Tweet repository for database operations.

use crate::entities::{NewTweet, Tweet, UpdateTweet};
use crate::types::{DatabaseError, DatabaseResult, ListQuery, Page};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const TWEET_SELECT: &str = r#"
    SELECT t.id, t.user_id, t.content, t.media, t.views_count, t.created_at, t.updated_at,
           (SELECT COUNT(*) FROM likes l WHERE l.tweet_id = t.id) AS likes_count
    FROM tweets t
"#;

fn tweet_from_row(row: &SqliteRow) -> Result<Tweet, sqlx::Error> {
    Ok(Tweet {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        content: row.try_get("content")?,
        media: row.try_get("media")?,
        views_count: row.try_get("views_count")?,
        likes_count: row.try_get("likes_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn decode_all(rows: &[SqliteRow]) -> DatabaseResult<Vec<Tweet>> {
    rows.iter()
        .map(tweet_from_row)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| DatabaseError::from_statement("decode tweet", "tweet", e))
}

/// Repository for tweet database operations
#[derive(Clone)]
pub struct TweetRepository {
    pool: SqlitePool,
}

impl TweetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a tweet. An unknown author surfaces as [`DatabaseError::NotFound`].
    pub async fn create(&self, request: &NewTweet) -> DatabaseResult<Tweet> {
        let now = Utc::now();
        let id = crate::new_public_id();

        sqlx::query(
            "INSERT INTO tweets (id, user_id, content, media, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&request.user_id)
        .bind(&request.content)
        .bind(&request.media)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_statement("create tweet", "user", e))?;

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("tweet {id}")))
    }

    pub async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<Tweet>> {
        let row = sqlx::query(&format!("{TWEET_SELECT} WHERE t.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_statement("find tweet", "tweet", e))?;

        row.as_ref()
            .map(tweet_from_row)
            .transpose()
            .map_err(|e| DatabaseError::from_statement("decode tweet", "tweet", e))
    }

    /// Whether `user_id` authored the tweet. Missing tweets are [`DatabaseError::NotFound`].
    pub async fn is_owner(&self, tweet_id: &str, user_id: &str) -> DatabaseResult<bool> {
        let owner: Option<String> = sqlx::query_scalar("SELECT user_id FROM tweets WHERE id = ?")
            .bind(tweet_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_statement("find tweet owner", "tweet", e))?;

        match owner {
            Some(owner) => Ok(owner == user_id),
            None => Err(DatabaseError::NotFound(format!("tweet {tweet_id}"))),
        }
    }

    pub async fn update(&self, id: &str, request: &UpdateTweet) -> DatabaseResult<Tweet> {
        let result = sqlx::query(
            "UPDATE tweets SET content = COALESCE(?, content), media = COALESCE(?, media), updated_at = ? WHERE id = ?",
        )
        .bind(&request.content)
        .bind(&request.media)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_statement("update tweet", "tweet", e))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("tweet {id}")));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("tweet {id}")))
    }

    /// Hard delete; likes and views cascade.
    pub async fn delete(&self, id: &str) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM tweets WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_statement("delete tweet", "tweet", e))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("tweet {id}")));
        }

        Ok(())
    }

    /// Newest tweets first, optionally filtered by content
    pub async fn list(&self, query: &ListQuery) -> DatabaseResult<Page<Tweet>> {
        let pattern = query.like_pattern();

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tweets WHERE content LIKE ? ESCAPE '\\'")
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| DatabaseError::from_statement("count tweets", "tweet", e))?;

        let rows = sqlx::query(&format!(
            "{TWEET_SELECT} WHERE t.content LIKE ? ESCAPE '\\' ORDER BY t.created_at DESC, t.id LIMIT ? OFFSET ?"
        ))
        .bind(&pattern)
        .bind(i64::from(query.limit))
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_statement("list tweets", "tweet", e))?;

        Ok(Page {
            count,
            items: decode_all(&rows)?,
        })
    }

    /// Tweets written by one user, newest first
    pub async fn list_by_user(&self, user_id: &str, query: &ListQuery) -> DatabaseResult<Page<Tweet>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tweets WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_statement("count user tweets", "tweet", e))?;

        let rows = sqlx::query(&format!(
            "{TWEET_SELECT} WHERE t.user_id = ? ORDER BY t.created_at DESC, t.id LIMIT ? OFFSET ?"
        ))
        .bind(user_id)
        .bind(i64::from(query.limit))
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_statement("list user tweets", "tweet", e))?;

        Ok(Page {
            count,
            items: decode_all(&rows)?,
        })
    }

    /// Count a view of `tweet_id` by `user_id`. Each user is counted once;
    /// returns whether this call incremented the counter.
    pub async fn record_view(&self, user_id: &str, tweet_id: &str) -> DatabaseResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::from_statement("begin view", "tweet", e))?;

        let inserted = sqlx::query(
            "INSERT INTO tweet_views (user_id, tweet_id, viewed_at) VALUES (?, ?, ?) ON CONFLICT (user_id, tweet_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(tweet_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| DatabaseError::from_statement("record view", "tweet", e))?;

        if inserted.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE tweets SET views_count = views_count + 1 WHERE id = ?")
            .bind(tweet_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| DatabaseError::from_statement("increment views", "tweet", e))?;

        tx.commit()
            .await
            .map_err(|e| DatabaseError::from_statement("commit view", "tweet", e))?;

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{migrated_pool, seed_user};

    fn new_tweet(user_id: &str, content: &str) -> NewTweet {
        NewTweet {
            user_id: user_id.to_string(),
            content: content.to_string(),
            media: None,
        }
    }

    #[tokio::test]
    async fn test_tweet_lifecycle() {
        let (pool, _temp_dir) = migrated_pool().await;
        let author = seed_user(&pool, "author").await;
        let repo = TweetRepository::new(pool);

        let tweet = repo.create(&new_tweet(&author.id, "first post")).await.unwrap();
        assert_eq!(tweet.likes_count, 0);
        assert_eq!(tweet.views_count, 0);

        let updated = repo
            .update(
                &tweet.id,
                &UpdateTweet {
                    content: Some("edited".to_string()),
                    media: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.content, "edited");
        assert!(updated.media.is_none());

        assert!(repo.is_owner(&tweet.id, &author.id).await.unwrap());
        assert!(!repo.is_owner(&tweet.id, "someone-else").await.unwrap());

        repo.delete(&tweet.id).await.unwrap();
        assert!(repo.find_by_id(&tweet.id).await.unwrap().is_none());
        assert!(repo.is_owner(&tweet.id, &author.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_create_for_unknown_user_is_not_found() {
        let (pool, _temp_dir) = migrated_pool().await;
        let repo = TweetRepository::new(pool);

        let err = repo.create(&new_tweet("ghost", "boo")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_and_list_by_user() {
        let (pool, _temp_dir) = migrated_pool().await;
        let alice = seed_user(&pool, "alice").await;
        let bob = seed_user(&pool, "bob").await;
        let repo = TweetRepository::new(pool);

        repo.create(&new_tweet(&alice.id, "rust is fun")).await.unwrap();
        repo.create(&new_tweet(&alice.id, "coffee")).await.unwrap();
        repo.create(&new_tweet(&bob.id, "rust again")).await.unwrap();

        let rust = repo
            .list(&ListQuery::new(None, None, Some("rust".to_string())))
            .await
            .unwrap();
        assert_eq!(rust.count, 2);

        let by_alice = repo.list_by_user(&alice.id, &ListQuery::default()).await.unwrap();
        assert_eq!(by_alice.count, 2);
        assert!(by_alice.items.iter().all(|tweet| tweet.user_id == alice.id));
    }

    #[tokio::test]
    async fn test_views_count_each_user_once() {
        let (pool, _temp_dir) = migrated_pool().await;
        let author = seed_user(&pool, "author").await;
        let reader = seed_user(&pool, "reader").await;
        let repo = TweetRepository::new(pool);
        let tweet = repo.create(&new_tweet(&author.id, "hello")).await.unwrap();

        assert!(repo.record_view(&reader.id, &tweet.id).await.unwrap());
        assert!(!repo.record_view(&reader.id, &tweet.id).await.unwrap());
        assert!(repo.record_view(&author.id, &tweet.id).await.unwrap());

        let tweet = repo.find_by_id(&tweet.id).await.unwrap().unwrap();
        assert_eq!(tweet.views_count, 2);

        let missing = repo.record_view(&reader.id, "missing").await.unwrap_err();
        assert!(missing.is_not_found());
    }
}

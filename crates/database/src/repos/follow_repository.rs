//! Follow repository for database operations.

use crate::entities::Follow;
use crate::types::{DatabaseError, DatabaseResult};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

fn follow_from_row(row: &SqliteRow) -> Result<Follow, sqlx::Error> {
    Ok(Follow {
        follower_id: row.try_get("follower_id")?,
        following_id: row.try_get("following_id")?,
        created_at: row.try_get("created_at")?,
    })
}

#[derive(Clone)]
pub struct FollowRepository {
    pool: SqlitePool,
}

impl FollowRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn follow(&self, follower_id: &str, following_id: &str) -> DatabaseResult<Follow> {
        let created_at = Utc::now();

        sqlx::query("INSERT INTO follows (follower_id, following_id, created_at) VALUES (?, ?, ?)")
            .bind(follower_id)
            .bind(following_id)
            .bind(created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_statement("follow user", "user", e))?;

        Ok(Follow {
            follower_id: follower_id.to_string(),
            following_id: following_id.to_string(),
            created_at,
        })
    }

    pub async fn unfollow(&self, follower_id: &str, following_id: &str) -> DatabaseResult<()> {
        let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND following_id = ?")
            .bind(follower_id)
            .bind(following_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_statement("unfollow user", "follow", e))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("follow of {following_id}")));
        }

        Ok(())
    }

    /// Edges pointing at `user_id`
    pub async fn followers(&self, user_id: &str) -> DatabaseResult<Vec<Follow>> {
        self.edges(
            "SELECT follower_id, following_id, created_at FROM follows WHERE following_id = ? ORDER BY created_at DESC",
            user_id,
        )
        .await
    }

    /// Edges leaving `user_id`
    pub async fn following(&self, user_id: &str) -> DatabaseResult<Vec<Follow>> {
        self.edges(
            "SELECT follower_id, following_id, created_at FROM follows WHERE follower_id = ? ORDER BY created_at DESC",
            user_id,
        )
        .await
    }

    async fn edges(&self, sql: &str, user_id: &str) -> DatabaseResult<Vec<Follow>> {
        let rows = sqlx::query(sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_statement("list follows", "user", e))?;

        rows.iter()
            .map(follow_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DatabaseError::from_statement("decode follow", "follow", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{migrated_pool, seed_user};

    #[tokio::test]
    async fn test_follow_graph() {
        let (pool, _temp_dir) = migrated_pool().await;
        let alice = seed_user(&pool, "alice").await;
        let bob = seed_user(&pool, "bob").await;
        let carol = seed_user(&pool, "carol").await;
        let repo = FollowRepository::new(pool);

        repo.follow(&bob.id, &alice.id).await.unwrap();
        repo.follow(&carol.id, &alice.id).await.unwrap();
        repo.follow(&alice.id, &bob.id).await.unwrap();

        let followers = repo.followers(&alice.id).await.unwrap();
        assert_eq!(followers.len(), 2);
        assert!(followers.iter().all(|edge| edge.following_id == alice.id));

        let following = repo.following(&alice.id).await.unwrap();
        assert_eq!(following.len(), 1);
        assert_eq!(following[0].following_id, bob.id);

        let duplicate = repo.follow(&bob.id, &alice.id).await.unwrap_err();
        assert!(matches!(duplicate, DatabaseError::Duplicate(_)));

        repo.unfollow(&bob.id, &alice.id).await.unwrap();
        assert_eq!(repo.followers(&alice.id).await.unwrap().len(), 1);
        assert!(repo.unfollow(&bob.id, &alice.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_follow_unknown_user_is_not_found() {
        let (pool, _temp_dir) = migrated_pool().await;
        let alice = seed_user(&pool, "alice").await;
        let repo = FollowRepository::new(pool);

        assert!(repo.follow(&alice.id, "ghost").await.unwrap_err().is_not_found());
    }
}

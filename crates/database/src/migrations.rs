//! Database migrations

use anyhow::Context;
use sqlx::SqlitePool;
use tracing::info;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Run database migrations
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    MIGRATOR
        .run(pool)
        .await
        .context("database migrations failed")?;
    info!("database migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::test_support::migrated_pool;

    #[tokio::test]
    async fn test_migrations_create_schema() {
        let (pool, _temp_dir) = migrated_pool().await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE '\\_%' ESCAPE '\\' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let names: Vec<String> = tables.into_iter().map(|(name,)| name).collect();
        for expected in ["follows", "likes", "tweet_views", "tweets", "users"] {
            assert!(names.iter().any(|name| name == expected), "missing table {expected}");
        }
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let (pool, _temp_dir) = migrated_pool().await;
        super::run_migrations(&pool).await.unwrap();
    }
}

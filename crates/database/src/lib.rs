//! Warbler Database Crate
//!
//! This crate provides database functionality for the Warbler backend,
//! including connection management, migrations, and repository implementations.

use cuid2::CuidConstructor;
use once_cell::sync::Lazy;
use sqlx::SqlitePool;
use warbler_config::DatabaseConfig;

pub mod connection;
pub mod entities;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::prepare_database;
pub use migrations::{run_migrations, MIGRATOR};

pub use repos::{FollowRepository, LikeRepository, TweetRepository, UserRepository};

pub use entities::{
    follow::Follow,
    like::Like,
    tweet::{NewTweet, Tweet, UpdateTweet},
    user::{NewUser, UpdateUser, User, UserCredentials},
};

pub use types::{errors::DatabaseError, DatabaseResult, ListQuery, Page};

static CUID: Lazy<CuidConstructor> = Lazy::new(CuidConstructor::new);

/// Generate the opaque identifier used as primary key for users and tweets.
pub fn new_public_id() -> String {
    CUID.create_id()
}

/// Initialize the database with migrations
pub async fn initialize_database(config: &DatabaseConfig) -> DatabaseResult<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .map_err(|e| DatabaseError::ConnectionError(format!("{e:#}")))?;

    run_migrations(&pool)
        .await
        .map_err(|e| DatabaseError::MigrationError(format!("{e:#}")))?;

    Ok(pool)
}


#[cfg(test)]
mod tests {
    use super::test_support::migrated_pool;

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let (pool, _temp_dir) = migrated_pool().await;

        let result: (bool,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert!(result.0);
    }

    #[test]
    fn public_ids_are_unique() {
        let first = super::new_public_id();
        let second = super::new_public_id();
        assert_ne!(first, second);
        assert!(!first.is_empty());
    }
}

//! User repository for database operations.

use crate::entities::{NewUser, UpdateUser, User, UserCredentials};
use crate::types::{DatabaseError, DatabaseResult, ListQuery, Page};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

const USER_COLUMNS: &str =
    "id, email, name, user_name, bio, profile_picture, created_at, updated_at";

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        user_name: row.try_get("user_name")?,
        bio: row.try_get("bio")?,
        profile_picture: row.try_get("profile_picture")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Repository for user database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user. A taken user name or email surfaces as [`DatabaseError::Duplicate`].
    pub async fn create(&self, request: &NewUser) -> DatabaseResult<User> {
        let now = Utc::now();
        let id = crate::new_public_id();

        sqlx::query(
            "INSERT INTO users (id, email, name, user_name, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&request.email)
        .bind(&request.name)
        .bind(&request.user_name)
        .bind(&request.password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_statement("create user", "user", e))?;

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {id}")))
    }

    /// Find a live user by ID
    pub async fn find_by_id(&self, id: &str) -> DatabaseResult<Option<User>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_statement("find user", "user", e))?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(|e| DatabaseError::from_statement("decode user", "user", e))
    }

    /// Look up login credentials by user name or email.
    pub async fn find_credentials(&self, login: &str) -> DatabaseResult<Option<UserCredentials>> {
        let row = sqlx::query(
            "SELECT id, password_hash FROM users WHERE (user_name = ? OR email = ?) AND deleted_at IS NULL",
        )
        .bind(login)
        .bind(login)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_statement("find credentials", "user", e))?;

        row.map(|row| -> Result<UserCredentials, sqlx::Error> {
            Ok(UserCredentials {
                id: row.try_get("id")?,
                password_hash: row.try_get("password_hash")?,
            })
        })
        .transpose()
        .map_err(|e| DatabaseError::from_statement("decode credentials", "user", e))
    }

    /// Check if a live account already uses this user name
    pub async fn username_exists(&self, user_name: &str) -> DatabaseResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE user_name = ? AND deleted_at IS NULL",
        )
        .bind(user_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_statement("check user name", "user", e))?;

        Ok(count > 0)
    }

    /// Check if a live account already uses this email
    pub async fn email_exists(&self, email: &str) -> DatabaseResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE email = ? AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_statement("check email", "user", e))?;

        Ok(count > 0)
    }

    /// Update the provided profile fields
    pub async fn update(&self, id: &str, request: &UpdateUser) -> DatabaseResult<User> {
        if request.is_empty() {
            return self
                .find_by_id(id)
                .await?
                .ok_or_else(|| DatabaseError::NotFound(format!("user {id}")));
        }

        // Build dynamic update query based on provided fields
        let mut query_parts = Vec::new();
        let mut values = Vec::new();

        let fields = [
            ("name", &request.name),
            ("user_name", &request.user_name),
            ("email", &request.email),
            ("bio", &request.bio),
            ("profile_picture", &request.profile_picture),
        ];
        for (column, value) in fields {
            if let Some(value) = value {
                query_parts.push(format!("{column} = ?"));
                values.push(value.clone());
            }
        }

        query_parts.push("updated_at = ?".to_string());

        let query_str = format!(
            "UPDATE users SET {} WHERE id = ? AND deleted_at IS NULL",
            query_parts.join(", ")
        );

        let mut query = sqlx::query(&query_str);
        for value in values {
            query = query.bind(value);
        }

        let result = query
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from_statement("update user", "user", e))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("user {id}")));
        }

        self.find_by_id(id)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("user {id}")))
    }

    /// List live users, newest first, optionally filtered by name or user name
    pub async fn list(&self, query: &ListQuery) -> DatabaseResult<Page<User>> {
        let pattern = query.like_pattern();

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE deleted_at IS NULL AND (name LIKE ?1 ESCAPE '\\' OR user_name LIKE ?1 ESCAPE '\\')",
        )
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_statement("count users", "user", e))?;

        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL AND (name LIKE ?1 ESCAPE '\\' OR user_name LIKE ?1 ESCAPE '\\') ORDER BY created_at DESC, id LIMIT ?2 OFFSET ?3"
        ))
        .bind(&pattern)
        .bind(i64::from(query.limit))
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_statement("list users", "user", e))?;

        let items = rows
            .iter()
            .map(user_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DatabaseError::from_statement("decode user", "user", e))?;

        Ok(Page { count, items })
    }

    /// Delete user (soft delete)
    pub async fn soft_delete(&self, id: &str) -> DatabaseResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE users SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_statement("delete user", "user", e))?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("user {id}")));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{migrated_pool, seed_user};

    fn new_user(user_name: &str, email: &str) -> NewUser {
        NewUser {
            name: "Test User".to_string(),
            email: email.to_string(),
            user_name: user_name.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_user_creation_and_retrieval() {
        let (pool, _temp_dir) = migrated_pool().await;
        let repo = UserRepository::new(pool);

        let created = repo.create(&new_user("tester", "test@example.com")).await.unwrap();
        assert_eq!(created.user_name, "tester");
        assert_eq!(created.email, "test@example.com");

        let found = repo.find_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_duplicate_user_name_is_reported() {
        let (pool, _temp_dir) = migrated_pool().await;
        let repo = UserRepository::new(pool);

        repo.create(&new_user("tester", "one@example.com")).await.unwrap();
        let err = repo
            .create(&new_user("tester", "two@example.com"))
            .await
            .unwrap_err();

        match err {
            DatabaseError::Duplicate(columns) => assert!(columns.contains("user_name")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(repo.username_exists("tester").await.unwrap());
        assert!(!repo.username_exists("nobody").await.unwrap());
        assert!(repo.email_exists("one@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_credentials_by_user_name_or_email() {
        let (pool, _temp_dir) = migrated_pool().await;
        let repo = UserRepository::new(pool);
        let user = repo.create(&new_user("tester", "test@example.com")).await.unwrap();

        let by_name = repo.find_credentials("tester").await.unwrap().unwrap();
        let by_email = repo.find_credentials("test@example.com").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_name.password_hash, "hash");
        assert!(repo.find_credentials("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_only_touches_provided_fields() {
        let (pool, _temp_dir) = migrated_pool().await;
        let repo = UserRepository::new(pool.clone());
        let user = seed_user(&pool, "alice").await;

        let updated = repo
            .update(
                &user.id,
                &UpdateUser {
                    bio: Some("hello".to_string()),
                    ..UpdateUser::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.bio.as_deref(), Some("hello"));
        assert_eq!(updated.name, user.name);
        assert!(updated.updated_at >= user.updated_at);

        let missing = repo.update("nope", &UpdateUser::default()).await.unwrap_err();
        assert!(missing.is_not_found());
    }

    #[tokio::test]
    async fn test_list_searches_and_pages() {
        let (pool, _temp_dir) = migrated_pool().await;
        let repo = UserRepository::new(pool.clone());
        for name in ["alice", "alina", "bob"] {
            seed_user(&pool, name).await;
        }

        let page = repo
            .list(&ListQuery::new(Some(1), Some(1), Some("ali".to_string())))
            .await
            .unwrap();
        assert_eq!(page.count, 2);
        assert_eq!(page.items.len(), 1);

        let all = repo.list(&ListQuery::default()).await.unwrap();
        assert_eq!(all.count, 3);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_user_and_frees_name() {
        let (pool, _temp_dir) = migrated_pool().await;
        let repo = UserRepository::new(pool.clone());
        let user = seed_user(&pool, "carol").await;

        repo.soft_delete(&user.id).await.unwrap();
        assert!(repo.find_by_id(&user.id).await.unwrap().is_none());
        assert!(!repo.username_exists("carol").await.unwrap());
        assert!(repo.soft_delete(&user.id).await.unwrap_err().is_not_found());

        seed_user(&pool, "carol").await;
    }
}

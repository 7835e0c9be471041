use sqlx::SqlitePool;
use tracing::{info, warn};
use warbler_auth::{hash_password, validate_password, MIN_PASSWORD_LENGTH};
use warbler_database::{ListQuery, NewUser, Page, UpdateUser, User, UserRepository};

use super::error::ServiceError;
use super::validation::{validate_display_name, validate_email, validate_user_name};

/// Fields accepted when an account is created directly, without email verification.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub user_name: String,
    pub password: String,
}

pub async fn create_user(pool: &SqlitePool, request: CreateUser) -> Result<User, ServiceError> {
    if !validate_password(&request.password) {
        return Err(ServiceError::validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters and contain both uppercase and lowercase letters"
        )));
    }
    validate_display_name(&request.name)?;
    validate_user_name(&request.user_name)?;
    validate_email(&request.email)?;

    let password_hash = hash_password(&request.password)?;

    let user = UserRepository::new(pool.clone())
        .create(&NewUser {
            name: request.name,
            email: request.email,
            user_name: request.user_name,
            password_hash,
        })
        .await
        .map_err(|e| {
            warn!(error = %e, "failed to create user");
            ServiceError::from(e)
        })?;

    info!(user_id = %user.id, "user created");
    Ok(user)
}

pub async fn get_user(pool: &SqlitePool, user_id: &str) -> Result<User, ServiceError> {
    UserRepository::new(pool.clone())
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("user not found"))
}

pub async fn list_users(pool: &SqlitePool, query: &ListQuery) -> Result<Page<User>, ServiceError> {
    Ok(UserRepository::new(pool.clone()).list(query).await?)
}

/// Update the caller's own profile. Blank strings are treated as absent.
pub async fn update_user(
    pool: &SqlitePool,
    user_id: &str,
    mut request: UpdateUser,
) -> Result<User, ServiceError> {
    for field in [
        &mut request.name,
        &mut request.user_name,
        &mut request.email,
    ] {
        if field.as_deref().is_some_and(|value| value.trim().is_empty()) {
            *field = None;
        }
    }

    if let Some(name) = &request.name {
        validate_display_name(name)?;
    }
    if let Some(user_name) = &request.user_name {
        validate_user_name(user_name)?;
    }
    if let Some(email) = &request.email {
        validate_email(email)?;
    }

    let user = UserRepository::new(pool.clone())
        .update(user_id, &request)
        .await
        .map_err(|e| {
            warn!(user_id, error = %e, "failed to update user");
            ServiceError::from(e)
        })?;

    info!(user_id, "user updated");
    Ok(user)
}

pub async fn delete_user(pool: &SqlitePool, user_id: &str) -> Result<(), ServiceError> {
    UserRepository::new(pool.clone())
        .soft_delete(user_id)
        .await
        .map_err(|e| {
            warn!(user_id, error = %e, "failed to delete user");
            ServiceError::from(e)
        })?;

    info!(user_id, "user deleted");
    Ok(())
}

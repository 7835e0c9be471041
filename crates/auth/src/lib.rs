//! Authentication for the Warbler backend: password policy and hashing,
//! credential login and bearer tokens.

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use warbler_config::AuthConfig;
use warbler_database::{DatabaseError, UserRepository};

pub mod password;
pub mod tokens;

pub use password::{hash_password, validate_password, verify_password, MIN_PASSWORD_LENGTH};
pub use tokens::{Claims, TokenIssuer, TokenKind, TokenPair};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("token encoding failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

#[derive(Clone)]
pub struct Authenticator {
    users: UserRepository,
    tokens: TokenIssuer,
}

impl Authenticator {
    pub fn new(pool: SqlitePool, config: &AuthConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenIssuer::from_config(config),
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Log in by user name or email. Unknown logins and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn login_with_password(
        &self,
        login: &str,
        password: &str,
    ) -> Result<(String, TokenPair), AuthError> {
        let Some(credentials) = self.users.find_credentials(login).await? else {
            debug!("login attempt for unknown account");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &credentials.password_hash)? {
            debug!(user_id = %credentials.id, "login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let pair = self.tokens.issue(&credentials.id)?;
        info!(user_id = %credentials.id, "user logged in");
        Ok((credentials.id, pair))
    }

    /// Resolve a bearer access token to the user id it was issued for.
    ///
    /// The account must still exist; tokens of soft-deleted users stop working.
    pub async fn authenticate_token(&self, token: &str) -> Result<String, AuthError> {
        let claims = self.tokens.verify(token, TokenKind::Access)?;

        match self.users.find_by_id(&claims.user_id).await? {
            Some(user) => Ok(user.id),
            None => Err(AuthError::InvalidToken),
        }
    }
}

use thiserror::Error;
use tracing::error;
use warbler_database::DatabaseError;
use warbler_notifications::{EmailError, QueueError};

use crate::ApiError;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Bad input or a policy violation the caller can correct.
    #[error("{0}")]
    Validation(String),
    /// A uniqueness rule would be broken.
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("access denied")]
    Forbidden,
    #[error("authentication required")]
    Unauthorized,
    /// Database, email or queue failure.
    #[error("{context}: {source}")]
    Dependency {
        context: &'static str,
        #[source]
        source: BoxError,
    },
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn dependency(context: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Dependency {
            context,
            source: source.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            DatabaseError::Duplicate(what) => Self::Conflict(format!("{what} already exists")),
            other => Self::dependency("database", other),
        }
    }
}

impl From<EmailError> for ServiceError {
    fn from(err: EmailError) -> Self {
        Self::dependency("email", err)
    }
}

impl From<QueueError> for ServiceError {
    fn from(err: QueueError) -> Self {
        Self::dependency("notification queue", err)
    }
}

impl From<argon2::password_hash::Error> for ServiceError {
    fn from(err: argon2::password_hash::Error) -> Self {
        Self::dependency("password hashing", err.to_string())
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => ApiError::bad_request(msg),
            ServiceError::Conflict(msg) => ApiError::conflict(msg),
            ServiceError::NotFound(msg) => ApiError::not_found(msg),
            ServiceError::Forbidden => ApiError::forbidden("access denied"),
            ServiceError::Unauthorized => ApiError::unauthorized("authentication required"),
            ServiceError::Dependency { context, source } => {
                error!(context, error = %source, "dependency failure");
                ApiError::internal_server_error("internal server error")
            }
        }
    }
}

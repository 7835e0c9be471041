//! Error types for the database layer

use thiserror::Error;
use tracing::error;

/// General database error
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Database migration error: {0}")]
    MigrationError(String),

    #[error("Database query error: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),
}

impl DatabaseError {
    /// Classify a failed statement and log it once, at the storage boundary.
    ///
    /// Unique violations become [`DatabaseError::Duplicate`] naming the
    /// violated columns (`users.user_name`), foreign key violations become [`DatabaseError::NotFound`]
    /// for `referenced`; everything else is kept as a query error.
    pub(crate) fn from_statement(
        operation: &'static str,
        referenced: &str,
        err: sqlx::Error,
    ) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                let columns = db_err
                    .message()
                    .split_once(": ")
                    .map(|(_, columns)| columns)
                    .unwrap_or(referenced)
                    .to_string();
                return DatabaseError::Duplicate(columns);
            }
            if db_err.is_foreign_key_violation() {
                return DatabaseError::NotFound(referenced.to_string());
            }
        }

        error!(operation, error = %err, "database statement failed");
        DatabaseError::QueryError(err)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound(_))
    }
}

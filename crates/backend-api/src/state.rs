use std::sync::Arc;

use axum::http::HeaderMap;
use sqlx::SqlitePool;
use warbler_auth::Authenticator;
use warbler_database::UserRepository;
use warbler_notifications::{EmailSender, EventPublisher};

use crate::pending::PendingRegistrationStore;
use crate::services::RegistrationService;
use crate::util::require_bearer;
use crate::ApiError;

#[derive(Clone)]
pub struct AppState {
    pool: SqlitePool,
    authenticator: Authenticator,
    registration: RegistrationService<UserRepository>,
    publisher: Arc<dyn EventPublisher>,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        authenticator: Authenticator,
        pending: PendingRegistrationStore,
        email: Arc<dyn EmailSender>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        let registration =
            RegistrationService::new(UserRepository::new(pool.clone()), pending, email);

        Self {
            pool,
            authenticator,
            registration,
            publisher,
        }
    }

    pub fn db_pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    pub fn registration(&self) -> &RegistrationService<UserRepository> {
        &self.registration
    }

    pub fn pending(&self) -> &PendingRegistrationStore {
        self.registration.pending()
    }

    pub fn publisher(&self) -> &dyn EventPublisher {
        self.publisher.as_ref()
    }

    /// Resolve the bearer token in `headers` to the caller's user id.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<String, ApiError> {
        let token = require_bearer(headers)?;
        self.authenticator
            .authenticate_token(&token)
            .await
            .map_err(ApiError::from)
    }
}

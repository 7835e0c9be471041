//! Email-verified sign up: `register` parks the requested account and mails a
//! code, `verify` redeems the code and creates the durable user.

use std::sync::Arc;

use tracing::{error, info, warn};
use warbler_auth::{hash_password, validate_password, MIN_PASSWORD_LENGTH};
use warbler_database::{DatabaseResult, NewUser, User, UserRepository};
use warbler_notifications::{EmailSender, VERIFICATION_SUBJECT};

use super::error::ServiceError;
use super::validation::{validate_display_name, validate_email, validate_user_name};
use crate::code::generate_code;
use crate::pending::{PendingRegistrationStore, RegistrationPayload, TakeError};

/// Storage the registration flow needs from the user table.
pub trait RegistrationRepo {
    async fn username_exists(&self, user_name: &str) -> DatabaseResult<bool>;
    async fn email_exists(&self, email: &str) -> DatabaseResult<bool>;
    async fn create(&self, request: &NewUser) -> DatabaseResult<User>;
}

impl RegistrationRepo for UserRepository {
    async fn username_exists(&self, user_name: &str) -> DatabaseResult<bool> {
        self.username_exists(user_name).await
    }

    async fn email_exists(&self, email: &str) -> DatabaseResult<bool> {
        self.email_exists(email).await
    }

    async fn create(&self, request: &NewUser) -> DatabaseResult<User> {
        self.create(request).await
    }
}

pub fn verification_body(code: &str) -> String {
    format!("Your verification code is: {code}")
}

#[derive(Clone)]
pub struct RegistrationService<R> {
    repo: R,
    pending: PendingRegistrationStore,
    email: Arc<dyn EmailSender>,
}

impl<R> RegistrationService<R>
where
    R: RegistrationRepo,
{
    pub fn new(repo: R, pending: PendingRegistrationStore, email: Arc<dyn EmailSender>) -> Self {
        Self {
            repo,
            pending,
            email,
        }
    }

    pub fn pending(&self) -> &PendingRegistrationStore {
        &self.pending
    }

    /// Validate the request, park it under a fresh code and mail the code.
    /// Returns the address the code went to.
    pub async fn register(&self, payload: RegistrationPayload) -> Result<String, ServiceError> {
        if !validate_password(&payload.password) {
            return Err(ServiceError::validation(format!(
                "password must be at least {MIN_PASSWORD_LENGTH} characters and contain both uppercase and lowercase letters"
            )));
        }
        validate_display_name(&payload.name)?;
        validate_user_name(&payload.user_name)?;

        let taken = self.repo.username_exists(&payload.user_name).await.map_err(|e| {
            warn!(error = %e, "user name lookup failed");
            ServiceError::dependency("user name lookup", e)
        })?;
        if taken {
            return Err(ServiceError::conflict("user name already taken"));
        }

        validate_email(&payload.email)?;

        let registered = self.repo.email_exists(&payload.email).await.map_err(|e| {
            warn!(error = %e, "email lookup failed");
            ServiceError::dependency("email lookup", e)
        })?;
        if registered {
            return Err(ServiceError::conflict("email already registered"));
        }

        let email = payload.email.clone();
        let code = generate_code();
        self.pending.put(&email, &code, payload).await;

        if let Err(e) = self
            .email
            .send(&email, VERIFICATION_SUBJECT, &verification_body(&code))
            .await
        {
            error!(error = %e, "failed to send verification email");
            return Err(e.into());
        }

        info!("verification code sent");
        Ok(email)
    }

    /// Redeem `code` for `email` and create the account it was issued for.
    ///
    /// The pending entry is consumed on success, so a second call with the
    /// same code finds nothing. When hashing or the database fails the entry
    /// is put back, and the same code can be retried until it expires.
    pub async fn verify(&self, email: &str, code: &str) -> Result<User, ServiceError> {
        let redeemed = self.pending.take(email, code).await.map_err(|e| match e {
            TakeError::NotFound => {
                ServiceError::not_found("verification code expired or not found")
            }
            TakeError::Mismatch => ServiceError::validation("invalid verification code"),
            TakeError::Exhausted => {
                ServiceError::validation("too many invalid verification codes, please register again")
            }
        })?;

        match self.create_user(&redeemed.payload).await {
            Ok(user) => {
                info!(user_id = %user.id, "registration verified");
                Ok(user)
            }
            Err(e @ ServiceError::Dependency { .. }) => {
                let restored = self.pending.restore(email, redeemed).await;
                warn!(error = %e, restored, "verification failed, pending registration kept");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    async fn create_user(&self, payload: &RegistrationPayload) -> Result<User, ServiceError> {
        let password_hash = hash_password(&payload.password)?;

        self.repo
            .create(&NewUser {
                name: payload.name.clone(),
                email: payload.email.clone(),
                user_name: payload.user_name.clone(),
                password_hash,
            })
            .await
            .map_err(|e| {
                warn!(error = %e, "failed to create verified user");
                ServiceError::from(e)
            })
    }
}

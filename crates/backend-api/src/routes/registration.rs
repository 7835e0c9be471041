use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    pending::RegistrationPayload, routes::models::UserResponse, services::ServiceError, ApiError,
    AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub email: String,
}

/// Clients may resend the whole sign-up form; only `email` and `code` are read.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRegisterRequest {
    pub email: String,
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Sign-up failures the client can act on are all reported as 400.
fn registration_error(error: ServiceError) -> ApiError {
    match error {
        ServiceError::Conflict(message) | ServiceError::NotFound(message) => {
            ApiError::bad_request(message)
        }
        other => ApiError::from(other),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/register",
    tag = "registration",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Verification code sent", body = RegisterResponse),
        (status = 400, description = "Invalid payload or user name taken", body = crate::error::ErrorResponse),
        (status = 500, description = "Lookup or email delivery failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let payload = RegistrationPayload {
        name: req.name,
        email: req.email.trim().to_string(),
        user_name: req.user_name,
        password: req.password,
    };

    let email = state
        .registration()
        .register(payload)
        .await
        .map_err(registration_error)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "verification code sent".to_string(),
            email,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/verify-register",
    tag = "registration",
    request_body = VerifyRegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Code expired, unknown or wrong", body = crate::error::ErrorResponse),
        (status = 500, description = "Account could not be stored", body = crate::error::ErrorResponse)
    )
)]
pub async fn verify_register(
    State(state): State<AppState>,
    Json(req): Json<VerifyRegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = state
        .registration()
        .verify(req.email.trim(), &req.code)
        .await
        .map_err(registration_error)?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use warbler_database::UpdateUser;

use crate::{
    routes::models::{
        CreateUserRequest, FollowResponse, FollowsResponse, UpdateUserRequest, UserResponse,
        UsersResponse,
    },
    services::{follows as follow_service, users as user_service},
    util::PageParams,
    ApiError, AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/user",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid payload", body = crate::error::ErrorResponse),
        (status = 409, description = "User name or email taken", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let user = user_service::create_user(
        state.db_pool(),
        user_service::CreateUser {
            name: req.name,
            email: req.email.trim().to_string(),
            user_name: req.user_name,
            password: req.password,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = user_service::get_user(state.db_pool(), &user_id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "users",
    params(PageParams),
    responses((status = 200, description = "One page of users", body = UsersResponse))
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<UsersResponse>, ApiError> {
    let page = user_service::list_users(state.db_pool(), &params.into()).await?;
    Ok(Json(page.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/user",
    tag = "users",
    security(("bearerAuth" = [])),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Invalid payload", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 409, description = "User name or email taken", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = state.authenticate(&headers).await?;

    let user = user_service::update_user(
        state.db_pool(),
        &user_id,
        UpdateUser {
            name: req.name,
            user_name: req.user_name,
            email: req.email.map(|email| email.trim().to_string()),
            bio: req.bio,
            profile_picture: req.profile_picture,
        },
    )
    .await?;

    Ok(Json(user.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/user",
    tag = "users",
    security(("bearerAuth" = [])),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let user_id = state.authenticate(&headers).await?;
    user_service::delete_user(state.db_pool(), &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/user/{id}/follow",
    tag = "follows",
    security(("bearerAuth" = [])),
    params(("id" = String, Path, description = "User to follow")),
    responses(
        (status = 201, description = "Now following", body = FollowResponse),
        (status = 400, description = "Cannot follow yourself", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already following", body = crate::error::ErrorResponse)
    )
)]
pub async fn follow_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(following_id): Path<String>,
) -> Result<(StatusCode, Json<FollowResponse>), ApiError> {
    let user_id = state.authenticate(&headers).await?;
    let follow = follow_service::follow_user(state.db_pool(), &user_id, &following_id).await?;
    Ok((StatusCode::CREATED, Json(follow.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/user/{id}/unfollow",
    tag = "follows",
    security(("bearerAuth" = [])),
    params(("id" = String, Path, description = "User to unfollow")),
    responses(
        (status = 204, description = "No longer following"),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Not following this user", body = crate::error::ErrorResponse)
    )
)]
pub async fn unfollow_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(following_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user_id = state.authenticate(&headers).await?;
    follow_service::unfollow_user(state.db_pool(), &user_id, &following_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/user/{id}/followers",
    tag = "follows",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Accounts following this user", body = FollowsResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_followers(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<FollowsResponse>, ApiError> {
    let follows = follow_service::followers(state.db_pool(), &user_id).await?;
    Ok(Json(follows.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/user/{id}/followings",
    tag = "follows",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Accounts this user follows", body = FollowsResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_followings(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<FollowsResponse>, ApiError> {
    let follows = follow_service::following(state.db_pool(), &user_id).await?;
    Ok(Json(follows.into()))
}

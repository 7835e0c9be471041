use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use warbler_database::UpdateTweet;

use crate::{
    routes::models::{
        CreateTweetRequest, LikeCountResponse, LikeResponse, TweetResponse, TweetsResponse,
        UpdateTweetRequest,
    },
    services::{likes as like_service, tweets as tweet_service},
    util::PageParams,
    ApiError, AppState,
};

#[utoipa::path(
    post,
    path = "/api/v1/tweet",
    tag = "tweets",
    security(("bearerAuth" = [])),
    request_body = CreateTweetRequest,
    responses(
        (status = 201, description = "Tweet created", body = TweetResponse),
        (status = 400, description = "Invalid content", body = crate::error::ErrorResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_tweet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateTweetRequest>,
) -> Result<(StatusCode, Json<TweetResponse>), ApiError> {
    let user_id = state.authenticate(&headers).await?;
    let tweet =
        tweet_service::create_tweet(state.db_pool(), &user_id, req.content, req.media).await?;
    Ok((StatusCode::CREATED, Json(tweet.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/tweet/{id}",
    tag = "tweets",
    params(("id" = String, Path, description = "Tweet id")),
    responses(
        (status = 200, description = "Tweet", body = TweetResponse),
        (status = 404, description = "Tweet not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_tweet(
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
) -> Result<Json<TweetResponse>, ApiError> {
    let tweet = tweet_service::get_tweet(state.db_pool(), &tweet_id).await?;
    Ok(Json(tweet.into()))
}

#[utoipa::path(
    put,
    path = "/api/v1/tweet/{id}",
    tag = "tweets",
    security(("bearerAuth" = [])),
    params(("id" = String, Path, description = "Tweet id")),
    request_body = UpdateTweetRequest,
    responses(
        (status = 200, description = "Tweet updated", body = TweetResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the author", body = crate::error::ErrorResponse),
        (status = 404, description = "Tweet not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_tweet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(tweet_id): Path<String>,
    Json(req): Json<UpdateTweetRequest>,
) -> Result<Json<TweetResponse>, ApiError> {
    let user_id = state.authenticate(&headers).await?;
    let tweet = tweet_service::update_tweet(
        state.db_pool(),
        &user_id,
        &tweet_id,
        UpdateTweet {
            content: req.content,
            media: req.media,
        },
    )
    .await?;
    Ok(Json(tweet.into()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tweet/{id}",
    tag = "tweets",
    security(("bearerAuth" = [])),
    params(("id" = String, Path, description = "Tweet id")),
    responses(
        (status = 204, description = "Tweet deleted"),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the author", body = crate::error::ErrorResponse),
        (status = 404, description = "Tweet not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_tweet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(tweet_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user_id = state.authenticate(&headers).await?;
    tweet_service::delete_tweet(state.db_pool(), &user_id, &tweet_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/tweets",
    tag = "tweets",
    params(PageParams),
    responses((status = 200, description = "One page of tweets", body = TweetsResponse))
)]
pub async fn list_tweets(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<TweetsResponse>, ApiError> {
    let page = tweet_service::list_tweets(state.db_pool(), &params.into()).await?;
    Ok(Json(page.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/tweets/user/{user_id}",
    tag = "tweets",
    params(("user_id" = String, Path, description = "Author id"), PageParams),
    responses(
        (status = 200, description = "One page of the user's tweets", body = TweetsResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_user_tweets(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<TweetsResponse>, ApiError> {
    let page = tweet_service::list_user_tweets(state.db_pool(), &user_id, &params.into()).await?;
    Ok(Json(page.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/tweet/{id}/view",
    tag = "tweets",
    security(("bearerAuth" = [])),
    params(("id" = String, Path, description = "Tweet id")),
    responses(
        (status = 204, description = "View recorded"),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Tweet not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn view_tweet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(tweet_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user_id = state.authenticate(&headers).await?;
    tweet_service::record_view(state.db_pool(), &user_id, &tweet_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v1/tweet/{id}/like",
    tag = "likes",
    security(("bearerAuth" = [])),
    params(("id" = String, Path, description = "Tweet id")),
    responses(
        (status = 201, description = "Tweet liked, author notified", body = LikeResponse),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Tweet not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Already liked", body = crate::error::ErrorResponse),
        (status = 500, description = "Like stored but notification failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn like_tweet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(tweet_id): Path<String>,
) -> Result<(StatusCode, Json<LikeResponse>), ApiError> {
    let user_id = state.authenticate(&headers).await?;
    let like =
        like_service::like_tweet(state.db_pool(), state.publisher(), &user_id, &tweet_id).await?;
    Ok((StatusCode::CREATED, Json(like.into())))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tweet/{id}/unlike",
    tag = "likes",
    security(("bearerAuth" = [])),
    params(("id" = String, Path, description = "Tweet id")),
    responses(
        (status = 204, description = "Like removed"),
        (status = 401, description = "Authentication required", body = crate::error::ErrorResponse),
        (status = 404, description = "Like not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn unlike_tweet(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(tweet_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user_id = state.authenticate(&headers).await?;
    like_service::unlike_tweet(state.db_pool(), &user_id, &tweet_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/v1/tweet/{id}/like-count",
    tag = "likes",
    params(("id" = String, Path, description = "Tweet id")),
    responses(
        (status = 200, description = "Number of likes", body = LikeCountResponse),
        (status = 404, description = "Tweet not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn like_count(
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
) -> Result<Json<LikeCountResponse>, ApiError> {
    let count = like_service::like_count(state.db_pool(), &tweet_id).await?;
    Ok(Json(LikeCountResponse { tweet_id, count }))
}

//! HTTP surface of the Warbler backend: sign up with email verification,
//! login, profiles, tweets, likes and follows.

mod code;
mod docs;
mod error;
mod pending;
mod state;
mod util;

pub mod routes;
pub mod services;

pub use code::generate_code;
pub use docs::ApiDoc;
pub use error::{ApiError, ErrorResponse};
pub use pending::{
    PendingRegistrationStore, Redeemed, RegistrationPayload, TakeError, MAX_CODE_ATTEMPTS,
};
pub use state::AppState;
pub use util::{require_bearer, PageParams};

use axum::{
    http::header::{AUTHORIZATION, CONTENT_TYPE},
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/register", post(routes::registration::register))
        .route(
            "/verify-register",
            post(routes::registration::verify_register),
        )
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        // User routes
        .route(
            "/user",
            post(routes::users::create_user)
                .put(routes::users::update_user)
                .delete(routes::users::delete_user),
        )
        .route("/user/:id", get(routes::users::get_user))
        .route("/users", get(routes::users::list_users))
        // Follow routes
        .route("/user/:id/follow", post(routes::users::follow_user))
        .route("/user/:id/unfollow", delete(routes::users::unfollow_user))
        .route("/user/:id/followers", get(routes::users::list_followers))
        .route("/user/:id/followings", get(routes::users::list_followings))
        // Tweet routes
        .route("/tweet", post(routes::tweets::create_tweet))
        .route(
            "/tweet/:id",
            get(routes::tweets::get_tweet)
                .put(routes::tweets::update_tweet)
                .delete(routes::tweets::delete_tweet),
        )
        .route("/tweets", get(routes::tweets::list_tweets))
        .route(
            "/tweets/user/:user_id",
            get(routes::tweets::list_user_tweets),
        )
        .route("/tweet/:id/view", post(routes::tweets::view_tweet))
        // Like routes
        .route("/tweet/:id/like", post(routes::tweets::like_tweet))
        .route("/tweet/:id/unlike", delete(routes::tweets::unlike_tweet))
        .route("/tweet/:id/like-count", get(routes::tweets::like_count));

    Router::new()
        .nest("/api/v1", api)
        .merge(SwaggerUi::new("/docs").url("/docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
}

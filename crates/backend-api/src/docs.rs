use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health::health_check,
        crate::routes::registration::register,
        crate::routes::registration::verify_register,
        crate::routes::auth::login,
        crate::routes::auth::refresh,
        crate::routes::users::create_user,
        crate::routes::users::get_user,
        crate::routes::users::list_users,
        crate::routes::users::update_user,
        crate::routes::users::delete_user,
        crate::routes::users::follow_user,
        crate::routes::users::unfollow_user,
        crate::routes::users::list_followers,
        crate::routes::users::list_followings,
        crate::routes::tweets::create_tweet,
        crate::routes::tweets::get_tweet,
        crate::routes::tweets::update_tweet,
        crate::routes::tweets::delete_tweet,
        crate::routes::tweets::list_tweets,
        crate::routes::tweets::list_user_tweets,
        crate::routes::tweets::view_tweet,
        crate::routes::tweets::like_tweet,
        crate::routes::tweets::unlike_tweet,
        crate::routes::tweets::like_count
    ),
    components(
        schemas(
            crate::error::ErrorResponse,
            crate::routes::health::HealthResponse,
            crate::routes::registration::RegisterRequest,
            crate::routes::registration::RegisterResponse,
            crate::routes::registration::VerifyRegisterRequest,
            crate::routes::auth::LoginRequest,
            crate::routes::auth::RefreshRequest,
            crate::routes::auth::TokenResponse,
            crate::routes::models::UserResponse,
            crate::routes::models::UsersResponse,
            crate::routes::models::CreateUserRequest,
            crate::routes::models::UpdateUserRequest,
            crate::routes::models::TweetResponse,
            crate::routes::models::TweetsResponse,
            crate::routes::models::CreateTweetRequest,
            crate::routes::models::UpdateTweetRequest,
            crate::routes::models::LikeResponse,
            crate::routes::models::LikeCountResponse,
            crate::routes::models::FollowResponse,
            crate::routes::models::FollowsResponse
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "registration", description = "Sign up with email verification"),
        (name = "auth", description = "Login and token refresh"),
        (name = "users", description = "User profiles"),
        (name = "tweets", description = "Tweets and views"),
        (name = "likes", description = "Likes and like notifications"),
        (name = "follows", description = "Follower graph")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        let mut scheme = SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer));
        if let SecurityScheme::Http(http) = &mut scheme {
            http.bearer_format = Some("JWT".to_string());
        }

        components
            .security_schemes
            .insert("bearerAuth".to_string(), scheme);
    }
}

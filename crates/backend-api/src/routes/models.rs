//! Request and response bodies shared by the route handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use warbler_database::{Follow, Like, Page, Tweet, User};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub user_name: String,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            user_name: user.user_name,
            bio: user.bio,
            profile_picture: user.profile_picture,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UsersResponse {
    pub count: i64,
    pub users: Vec<UserResponse>,
}

impl From<Page<User>> for UsersResponse {
    fn from(page: Page<User>) -> Self {
        Self {
            count: page.count,
            users: page.items.into_iter().map(UserResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TweetResponse {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub media: Option<String>,
    pub views_count: i64,
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Tweet> for TweetResponse {
    fn from(tweet: Tweet) -> Self {
        Self {
            id: tweet.id,
            user_id: tweet.user_id,
            content: tweet.content,
            media: tweet.media,
            views_count: tweet.views_count,
            likes_count: tweet.likes_count,
            created_at: tweet.created_at,
            updated_at: tweet.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TweetsResponse {
    pub count: i64,
    pub tweets: Vec<TweetResponse>,
}

impl From<Page<Tweet>> for TweetsResponse {
    fn from(page: Page<Tweet>) -> Self {
        Self {
            count: page.count,
            tweets: page.items.into_iter().map(TweetResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LikeResponse {
    pub user_id: String,
    pub tweet_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Like> for LikeResponse {
    fn from(like: Like) -> Self {
        Self {
            user_id: like.user_id,
            tweet_id: like.tweet_id,
            created_at: like.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LikeCountResponse {
    pub tweet_id: String,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FollowResponse {
    pub follower_id: String,
    pub following_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Follow> for FollowResponse {
    fn from(follow: Follow) -> Self {
        Self {
            follower_id: follow.follower_id,
            following_id: follow.following_id,
            created_at: follow.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FollowsResponse {
    pub count: usize,
    pub follows: Vec<FollowResponse>,
}

impl From<Vec<Follow>> for FollowsResponse {
    fn from(follows: Vec<Follow>) -> Self {
        Self {
            count: follows.len(),
            follows: follows.into_iter().map(FollowResponse::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub user_name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTweetRequest {
    pub content: String,
    pub media: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTweetRequest {
    pub content: Option<String>,
    pub media: Option<String>,
}

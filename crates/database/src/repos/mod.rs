//! Database repository implementations

pub mod follow_repository;
pub mod like_repository;
pub mod tweet_repository;
pub mod user_repository;

pub use follow_repository::FollowRepository;
pub use like_repository::LikeRepository;
pub use tweet_repository::TweetRepository;
pub use user_repository::UserRepository;

//! Domain entities for the database layer

pub mod follow;
pub mod like;
pub mod tweet;
pub mod user;

pub use follow::Follow;
pub use like::Like;
pub use tweet::{NewTweet, Tweet, UpdateTweet};
pub use user::{NewUser, UpdateUser, User, UserCredentials};

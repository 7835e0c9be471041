pub mod auth;
pub mod health;
pub mod models;
pub mod registration;
pub mod tweets;
pub mod users;

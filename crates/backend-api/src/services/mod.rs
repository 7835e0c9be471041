pub mod error;
pub mod follows;
pub mod likes;
pub mod registration;
pub mod tweets;
pub mod users;
pub mod validation;

pub use error::ServiceError;
pub use registration::{RegistrationRepo, RegistrationService};

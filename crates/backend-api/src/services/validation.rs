//! Input checks shared by the registration and profile services.

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::ServiceError;

pub const MAX_TWEET_LENGTH: usize = 280;

static EMAIL_PATTERN: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$"));

static USER_NAME_PATTERN: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_.-]+$"));

fn is_match(pattern: &Lazy<Result<Regex, regex::Error>>, value: &str) -> Result<bool, ServiceError> {
    pattern
        .as_ref()
        .map(|re| re.is_match(value))
        .map_err(|e| ServiceError::dependency("validation pattern", e.clone()))
}

pub fn validate_email(email: &str) -> Result<(), ServiceError> {
    if email.trim().is_empty() {
        return Err(ServiceError::validation("email is required"));
    }

    if email.len() > 255 || !is_match(&EMAIL_PATTERN, email)? {
        return Err(ServiceError::validation("invalid email address"));
    }

    Ok(())
}

pub fn validate_user_name(user_name: &str) -> Result<(), ServiceError> {
    let length = user_name.chars().count();
    if !(3..=30).contains(&length) {
        return Err(ServiceError::validation(
            "user name must be between 3 and 30 characters",
        ));
    }

    if !is_match(&USER_NAME_PATTERN, user_name)? {
        return Err(ServiceError::validation(
            "user name can only contain letters, numbers, dots, underscores and hyphens",
        ));
    }

    Ok(())
}

pub fn validate_display_name(name: &str) -> Result<(), ServiceError> {
    if name.trim().is_empty() {
        return Err(ServiceError::validation("name cannot be empty"));
    }

    if name.chars().count() > 50 {
        return Err(ServiceError::validation("name must be at most 50 characters"));
    }

    Ok(())
}

pub fn validate_tweet_content(content: &str) -> Result<(), ServiceError> {
    if content.trim().is_empty() {
        return Err(ServiceError::validation("tweet content cannot be empty"));
    }

    if content.chars().count() > MAX_TWEET_LENGTH {
        return Err(ServiceError::validation(format!(
            "tweet content must be at most {MAX_TWEET_LENGTH} characters"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last+tag@mail.example.org").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("a@x").is_err());
    }

    #[test]
    fn test_validate_user_name() {
        assert!(validate_user_name("ada").is_ok());
        assert!(validate_user_name("ada.lovelace_1815").is_ok());
        assert!(validate_user_name("ab").is_err());
        assert!(validate_user_name("has space").is_err());
        assert!(validate_user_name(&"x".repeat(31)).is_err());
    }

    #[test]
    fn test_validate_tweet_content() {
        assert!(validate_tweet_content("hello").is_ok());
        assert!(validate_tweet_content("   ").is_err());
        assert!(validate_tweet_content(&"é".repeat(MAX_TWEET_LENGTH)).is_ok());
        assert!(validate_tweet_content(&"é".repeat(MAX_TWEET_LENGTH + 1)).is_err());
    }
}

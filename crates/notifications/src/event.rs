use serde::{Deserialize, Serialize};

/// Queue payload, encoded as the JSON string `{"email": .., "message": ..}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeNotificationEvent {
    pub email: String,
    pub message: String,
}

impl LikeNotificationEvent {
    /// Event telling the tweet owner at `owner_email` that `liker_id` liked their tweet.
    pub fn for_like(owner_email: impl Into<String>, liker_id: &str) -> Self {
        Self {
            email: owner_email.into(),
            message: format!("User {liker_id} liked your tweet!"),
        }
    }

    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_payload(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_plain_field_names() {
        let event = LikeNotificationEvent::for_like("owner@example.com", "u-42");
        let payload = event.to_payload().unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();

        assert_eq!(value["email"], "owner@example.com");
        assert_eq!(value["message"], "User u-42 liked your tweet!");
    }

    #[test]
    fn from_payload_rejects_missing_fields() {
        assert!(LikeNotificationEvent::from_payload(br#"{"email":"a@x.com"}"#).is_err());
        assert!(LikeNotificationEvent::from_payload(b"not json").is_err());
        let parsed =
            LikeNotificationEvent::from_payload(br#"{"email":"b@x.com","message":"liked"}"#)
                .unwrap();
        assert_eq!(parsed.email, "b@x.com");
    }
}

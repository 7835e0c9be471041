use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Directed edge: `follower_id` follows `following_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Follow {
    pub follower_id: String,
    pub following_id: String,
    pub created_at: DateTime<Utc>,
}

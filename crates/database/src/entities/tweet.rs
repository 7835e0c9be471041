//! Tweet entity definitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub media: Option<String>,
    pub views_count: i64,
    /// Computed from the `likes` table at read time.
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTweet {
    pub user_id: String,
    pub content: String,
    pub media: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTweet {
    pub content: Option<String>,
    pub media: Option<String>,
}

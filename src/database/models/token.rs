use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Issued refresh token, tracked by `jti` so it can be blacklisted
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct RefreshToken {
    pub jti: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub blacklisted_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    pub fn is_blacklisted(&self) -> bool {
        self.blacklisted_at.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

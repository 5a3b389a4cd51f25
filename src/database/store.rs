use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;

use crate::database::manager::DatabaseError;
use crate::database::models::{Division, NewDivision, NewUser, RefreshToken, User};
use crate::filter::FilterData;

/// Persistence operations the services rely on.
///
/// Both backends evaluate the same [`FilterData`], enforce the same unique
/// keys (division code, division name per parent, username, email,
/// employee id) and refuse to hard-delete divisions that users still
/// reference.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), DatabaseError>;

    async fn select_divisions(&self, filter: &FilterData) -> Result<Vec<Division>, DatabaseError>;
    async fn count_divisions(&self, filter: &FilterData) -> Result<i64, DatabaseError>;
    async fn insert_division(&self, new: NewDivision) -> Result<Division, DatabaseError>;
    async fn update_division(&self, division: &Division) -> Result<Division, DatabaseError>;
    /// Removes the division and its whole subtree; returns the number of rows removed
    async fn delete_division(&self, id: i64) -> Result<u64, DatabaseError>;

    async fn select_users(&self, filter: &FilterData) -> Result<Vec<User>, DatabaseError>;
    async fn count_users(&self, filter: &FilterData) -> Result<i64, DatabaseError>;
    async fn insert_user(&self, new: NewUser) -> Result<User, DatabaseError>;
    async fn update_user(&self, user: &User) -> Result<User, DatabaseError>;

    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), DatabaseError>;
    async fn find_refresh_token(&self, jti: &str) -> Result<Option<RefreshToken>, DatabaseError>;
    /// Returns false when the token was already blacklisted or is unknown
    async fn blacklist_refresh_token(&self, jti: &str, at: DateTime<Utc>) -> Result<bool, DatabaseError>;
    async fn flush_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError>;

    async fn get_division(&self, id: i64) -> Result<Option<Division>, DatabaseError> {
        let filter = FilterData::new().with_where(json!({ "id": id })).paginate(1, 0);
        Ok(self.select_divisions(&filter).await?.into_iter().next())
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, DatabaseError> {
        let filter = FilterData::new().with_where(json!({ "id": id })).paginate(1, 0);
        Ok(self.select_users(&filter).await?.into_iter().next())
    }

    async fn find_user_by(&self, column: &str, value: &str) -> Result<Option<User>, DatabaseError> {
        let filter = FilterData::new().with_where(json!({ column: value })).paginate(1, 0);
        Ok(self.select_users(&filter).await?.into_iter().next())
    }
}

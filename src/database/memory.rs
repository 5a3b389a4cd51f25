use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::info;

use crate::database::manager::DatabaseError;
use crate::database::models::{Division, NewDivision, NewUser, RefreshToken, User, DIVISIONS, USERS};
use crate::database::store::Store;
use crate::filter::{matcher, FilterData};

#[derive(Default)]
struct Tables {
    divisions: Vec<Division>,
    users: Vec<User>,
    refresh_tokens: Vec<RefreshToken>,
    next_division_id: i64,
    next_user_id: i64,
}

impl Tables {
    fn check_division(&self, d: &Division) -> Result<(), DatabaseError> {
        for other in self.divisions.iter().filter(|o| o.id != d.id) {
            if other.code == d.code {
                return Err(DatabaseError::UniqueViolation("divisions_code_key".to_string()));
            }
            if other.name == d.name && other.parent_id == d.parent_id {
                return Err(DatabaseError::UniqueViolation("divisions_name_parent_uniq".to_string()));
            }
        }
        if let Some(parent_id) = d.parent_id {
            if !self.divisions.iter().any(|o| o.id == parent_id) {
                return Err(DatabaseError::ForeignKeyViolation("divisions_parent_id_fkey".to_string()));
            }
        }
        Ok(())
    }

    fn check_user(&self, u: &User) -> Result<(), DatabaseError> {
        for other in self.users.iter().filter(|o| o.id != u.id) {
            if other.username == u.username {
                return Err(DatabaseError::UniqueViolation("users_username_key".to_string()));
            }
            if other.email.eq_ignore_ascii_case(&u.email) {
                return Err(DatabaseError::UniqueViolation("users_email_key".to_string()));
            }
            if other.employee_id == u.employee_id {
                return Err(DatabaseError::UniqueViolation("users_employee_id_key".to_string()));
            }
        }
        if let Some(division_id) = u.division_id {
            if !self.divisions.iter().any(|d| d.id == division_id) {
                return Err(DatabaseError::ForeignKeyViolation("users_division_id_fkey".to_string()));
            }
        }
        Ok(())
    }

    fn subtree_ids(&self, root: i64) -> HashSet<i64> {
        let mut ids = HashSet::from([root]);
        let mut frontier = vec![root];
        while let Some(id) = frontier.pop() {
            for child in self.divisions.iter().filter(|d| d.parent_id == Some(id)) {
                if ids.insert(child.id) {
                    frontier.push(child.id);
                }
            }
        }
        ids
    }
}

/// In-process store for development and tests
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }

    async fn select_divisions(&self, filter: &FilterData) -> Result<Vec<Division>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(matcher::apply(&DIVISIONS, &tables.divisions, filter)?)
    }

    async fn count_divisions(&self, filter: &FilterData) -> Result<i64, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(matcher::count(&DIVISIONS, &tables.divisions, filter)? as i64)
    }

    async fn insert_division(&self, new: NewDivision) -> Result<Division, DatabaseError> {
        let mut tables = self.tables.write().await;
        let division = Division::from_new(tables.next_division_id + 1, new, Utc::now());
        tables.check_division(&division)?;
        tables.next_division_id += 1;
        tables.divisions.push(division.clone());
        Ok(division)
    }

    async fn update_division(&self, division: &Division) -> Result<Division, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_division(division)?;
        let slot = tables
            .divisions
            .iter_mut()
            .find(|d| d.id == division.id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Division {} not found", division.id)))?;
        let mut updated = division.clone();
        updated.audit.created_at = slot.audit.created_at;
        updated.audit.updated_at = Utc::now();
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete_division(&self, id: i64) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.write().await;
        if !tables.divisions.iter().any(|d| d.id == id) {
            return Err(DatabaseError::NotFound(format!("Division {} not found", id)));
        }
        let ids = tables.subtree_ids(id);
        if tables.users.iter().any(|u| u.division_id.is_some_and(|d| ids.contains(&d))) {
            return Err(DatabaseError::ForeignKeyViolation("users_division_id_fkey".to_string()));
        }
        tables.divisions.retain(|d| !ids.contains(&d.id));
        info!("Hard deleted division {} ({} rows)", id, ids.len());
        Ok(ids.len() as u64)
    }

    async fn select_users(&self, filter: &FilterData) -> Result<Vec<User>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(matcher::apply(&USERS, &tables.users, filter)?)
    }

    async fn count_users(&self, filter: &FilterData) -> Result<i64, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(matcher::count(&USERS, &tables.users, filter)? as i64)
    }

    async fn insert_user(&self, new: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        let user = User::from_new(tables.next_user_id + 1, new);
        tables.check_user(&user)?;
        tables.next_user_id += 1;
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: &User) -> Result<User, DatabaseError> {
        let mut tables = self.tables.write().await;
        tables.check_user(user)?;
        let slot = tables
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", user.id)))?;
        let mut updated = user.clone();
        updated.date_joined = slot.date_joined;
        updated.updated_at = Utc::now();
        *slot = updated.clone();
        Ok(updated)
    }

    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        if tables.refresh_tokens.iter().any(|t| t.jti == token.jti) {
            return Err(DatabaseError::UniqueViolation("refresh_tokens_pkey".to_string()));
        }
        if !tables.users.iter().any(|u| u.id == token.user_id) {
            return Err(DatabaseError::ForeignKeyViolation("refresh_tokens_user_id_fkey".to_string()));
        }
        tables.refresh_tokens.push(token.clone());
        Ok(())
    }

    async fn find_refresh_token(&self, jti: &str) -> Result<Option<RefreshToken>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables.refresh_tokens.iter().find(|t| t.jti == jti).cloned())
    }

    async fn blacklist_refresh_token(&self, jti: &str, at: DateTime<Utc>) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;
        match tables.refresh_tokens.iter_mut().find(|t| t.jti == jti) {
            Some(token) if token.blacklisted_at.is_none() => {
                token.blacklisted_at = Some(at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn flush_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.refresh_tokens.len();
        tables.refresh_tokens.retain(|t| !t.is_expired(now));
        Ok((before - tables.refresh_tokens.len()) as u64)
    }
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Division, NewDivision, NewUser, RefreshToken, User, DIVISIONS, USERS};
use crate::database::repository::Repository;
use crate::database::store::Store;
use crate::filter::FilterData;

/// PostgreSQL-backed store
pub struct PgStore {
    pool: PgPool,
    divisions: Repository<Division>,
    users: Repository<User>,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            divisions: Repository::new(DIVISIONS, pool.clone()),
            users: Repository::new(USERS, pool.clone()),
            pool,
        }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = DatabaseManager::connect(config).await?;
        if config.run_migrations {
            DatabaseManager::migrate(&pool).await?;
        }
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }

    async fn select_divisions(&self, filter: &FilterData) -> Result<Vec<Division>, DatabaseError> {
        self.divisions.select_any(filter).await
    }

    async fn count_divisions(&self, filter: &FilterData) -> Result<i64, DatabaseError> {
        self.divisions.count(filter).await
    }

    async fn insert_division(&self, new: NewDivision) -> Result<Division, DatabaseError> {
        let division = sqlx::query_as::<_, Division>(
            "INSERT INTO divisions (code, name, description, parent_id, level) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(&new.code)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.parent_id)
        .bind(new.level)
        .fetch_one(&self.pool)
        .await?;
        Ok(division)
    }

    async fn update_division(&self, d: &Division) -> Result<Division, DatabaseError> {
        let division = sqlx::query_as::<_, Division>(
            "UPDATE divisions SET code = $2, name = $3, description = $4, parent_id = $5, level = $6, \
             is_active = $7, deleted_at = $8, deleted_by = $9, updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(d.id)
        .bind(&d.code)
        .bind(&d.name)
        .bind(&d.description)
        .bind(d.parent_id)
        .bind(d.level)
        .bind(d.audit.is_active)
        .bind(d.audit.deleted_at)
        .bind(d.audit.deleted_by)
        .fetch_optional(&self.pool)
        .await?;
        division.ok_or_else(|| DatabaseError::NotFound(format!("Division {} not found", d.id)))
    }

    async fn delete_division(&self, id: i64) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            "WITH RECURSIVE subtree AS ( \
                 SELECT id FROM divisions WHERE id = $1 \
                 UNION ALL \
                 SELECT d.id FROM divisions d JOIN subtree s ON d.parent_id = s.id \
             ) \
             DELETE FROM divisions WHERE id IN (SELECT id FROM subtree)",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Division {} not found", id)));
        }
        info!("Hard deleted division {} ({} rows)", id, result.rows_affected());
        Ok(result.rows_affected())
    }

    async fn select_users(&self, filter: &FilterData) -> Result<Vec<User>, DatabaseError> {
        self.users.select_any(filter).await
    }

    async fn count_users(&self, filter: &FilterData) -> Result<i64, DatabaseError> {
        self.users.count(filter).await
    }

    async fn insert_user(&self, new: NewUser) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password, first_name, last_name, employee_id, phone, \
             division_id, hire_date, type_of_employment, status, is_staff, is_superuser, groups, date_joined) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, \
             COALESCE($15::timestamptz, now())) RETURNING *",
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.employee_id)
        .bind(&new.phone)
        .bind(new.division_id)
        .bind(new.hire_date)
        .bind(new.type_of_employment.as_str())
        .bind(new.status.as_str())
        .bind(new.is_staff)
        .bind(new.is_superuser)
        .bind(&new.groups)
        .bind(new.date_joined)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update_user(&self, u: &User) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET username = $2, email = $3, password = $4, first_name = $5, last_name = $6, \
             employee_id = $7, phone = $8, division_id = $9, hire_date = $10, type_of_employment = $11, \
             status = $12, face_photo_front = $13, face_photo_left = $14, face_photo_right = $15, \
             face_encoding = $16, is_active = $17, is_staff = $18, is_superuser = $19, groups = $20, \
             user_permissions = $21, last_login = $22, updated_at = now() \
             WHERE id = $1 RETURNING *",
        )
        .bind(u.id)
        .bind(&u.username)
        .bind(&u.email)
        .bind(&u.password)
        .bind(&u.first_name)
        .bind(&u.last_name)
        .bind(&u.employee_id)
        .bind(&u.phone)
        .bind(u.division_id)
        .bind(u.hire_date)
        .bind(&u.type_of_employment)
        .bind(&u.status)
        .bind(&u.face_photo_front)
        .bind(&u.face_photo_left)
        .bind(&u.face_photo_right)
        .bind(u.face_encoding.clone().map(sqlx::types::Json))
        .bind(u.is_active)
        .bind(u.is_staff)
        .bind(u.is_superuser)
        .bind(&u.groups)
        .bind(&u.user_permissions)
        .bind(u.last_login)
        .fetch_optional(&self.pool)
        .await?;
        user.ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", u.id)))
    }

    async fn insert_refresh_token(&self, token: &RefreshToken) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO refresh_tokens (jti, user_id, created_at, expires_at, blacklisted_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&token.jti)
        .bind(token.user_id)
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.blacklisted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_refresh_token(&self, jti: &str) -> Result<Option<RefreshToken>, DatabaseError> {
        let token = sqlx::query_as::<_, RefreshToken>("SELECT * FROM refresh_tokens WHERE jti = $1")
            .bind(jti)
            .fetch_optional(&self.pool)
            .await?;
        Ok(token)
    }

    async fn blacklist_refresh_token(&self, jti: &str, at: DateTime<Utc>) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET blacklisted_at = $2 WHERE jti = $1 AND blacklisted_at IS NULL",
        )
        .bind(jti)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn flush_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

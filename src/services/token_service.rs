use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::auth::{Claims, JwtManager, TokenError, TokenType};
use crate::config::SecurityConfig;
use crate::database::models::{RefreshToken, User};
use crate::database::{DatabaseError, Store};
use crate::services::account_service::AccountError;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenPair {
    pub refresh: String,
    pub access: String,
}

/// Result of a refresh; `refresh` is only present when rotation is on
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RefreshedTokens {
    pub access: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

/// Issues, rotates and blacklists JWTs; every refresh token is recorded by jti
pub struct TokenService {
    store: Arc<dyn Store>,
    jwt: JwtManager,
    rotate_refresh_tokens: bool,
    blacklist_after_rotation: bool,
}

impl TokenService {
    pub fn new(store: Arc<dyn Store>, jwt: JwtManager, security: &SecurityConfig) -> Self {
        Self {
            store,
            jwt,
            rotate_refresh_tokens: security.rotate_refresh_tokens,
            blacklist_after_rotation: security.blacklist_after_rotation,
        }
    }

    pub fn jwt(&self) -> &JwtManager {
        &self.jwt
    }

    async fn issue_refresh(&self, user_id: i64) -> Result<String, AccountError> {
        let (token, claims) = self.jwt.issue(TokenType::Refresh, user_id)?;
        self.store
            .insert_refresh_token(&RefreshToken {
                jti: claims.jti.clone(),
                user_id,
                created_at: claims.issued_at(),
                expires_at: claims.expires_at(),
                blacklisted_at: None,
            })
            .await?;
        Ok(token)
    }

    pub async fn issue_pair(&self, user_id: i64) -> Result<TokenPair, AccountError> {
        let refresh = self.issue_refresh(user_id).await?;
        let (access, _) = self.jwt.issue(TokenType::Access, user_id)?;
        Ok(TokenPair { refresh, access })
    }

    /// Valid, unexpired access token of an existing active user
    pub async fn authenticate(&self, token: &str) -> Result<User, TokenError> {
        let claims = self.jwt.decode_expecting(token, TokenType::Access)?;
        self.token_user(&claims).await
    }

    async fn token_user(&self, claims: &Claims) -> Result<User, TokenError> {
        let user = self.store.get_user(claims.user_id).await.map_err(|e| {
            warn!("User lookup for token failed: {}", e);
            TokenError::Invalid
        })?;
        match user {
            Some(user) if user.is_active => Ok(user),
            Some(user) => {
                warn!("Token presented for inactive user {}", user.id);
                Err(TokenError::InactiveUser)
            }
            None => Err(TokenError::UnknownUser),
        }
    }

    async fn ensure_not_blacklisted(&self, claims: &Claims) -> Result<(), AccountError> {
        if let Some(record) = self.store.find_refresh_token(&claims.jti).await? {
            if record.is_blacklisted() {
                warn!("Blacklisted refresh token {} presented by user {}", claims.jti, claims.user_id);
                return Err(TokenError::Blacklisted.into());
            }
        }
        Ok(())
    }

    /// Blacklist a jti, recording it first if this token was never seen.
    /// Only one caller can win: a jti that is already blacklisted is rejected.
    async fn blacklist(&self, claims: &Claims) -> Result<(), AccountError> {
        if self.store.find_refresh_token(&claims.jti).await?.is_none() {
            let record = RefreshToken {
                jti: claims.jti.clone(),
                user_id: claims.user_id,
                created_at: claims.issued_at(),
                expires_at: claims.expires_at(),
                blacklisted_at: None,
            };
            match self.store.insert_refresh_token(&record).await {
                Ok(()) | Err(DatabaseError::UniqueViolation(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        if !self.store.blacklist_refresh_token(&claims.jti, Utc::now()).await? {
            warn!("Refresh token {} was already blacklisted", claims.jti);
            return Err(TokenError::Blacklisted.into());
        }
        Ok(())
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshedTokens, AccountError> {
        let claims = self.jwt.decode_expecting(refresh_token, TokenType::Refresh)?;
        self.ensure_not_blacklisted(&claims).await?;
        let user = self.token_user(&claims).await?;

        let (access, _) = self.jwt.issue(TokenType::Access, user.id)?;
        if !self.rotate_refresh_tokens {
            return Ok(RefreshedTokens { access, refresh: None });
        }

        if self.blacklist_after_rotation {
            self.blacklist(&claims).await?;
        }
        let refresh = self.issue_refresh(user.id).await?;
        Ok(RefreshedTokens { access, refresh: Some(refresh) })
    }

    pub async fn logout(&self, refresh_token: &str) -> Result<(), AccountError> {
        let claims = self.jwt.decode_expecting(refresh_token, TokenType::Refresh)?;
        self.ensure_not_blacklisted(&claims).await?;
        self.blacklist(&claims).await?;
        info!("User {} logged out", claims.user_id);
        Ok(())
    }

    /// Drops expired refresh-token records; returns how many were removed
    pub async fn flush_expired(&self) -> Result<u64, AccountError> {
        let removed = self.store.flush_expired_tokens(Utc::now()).await?;
        info!("Flushed {} expired refresh token(s)", removed);
        Ok(removed)
    }
}

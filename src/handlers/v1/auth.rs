// handlers/v1/auth.rs - register, login, logout and token refresh

use axum::{extract::State, Extension};

use crate::api::v1::{AuthResponse, LoginRequest, MessageResponse, RefreshRequest, RegisterRequest, UserBasic};
use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, ValidJson};
use crate::services::token_service::RefreshedTokens;
use crate::services::AccountError;
use crate::validation::REQUIRED;

/// Create an account and sign it in
#[utoipa::path(
    post,
    path = "/api/v1/accounts/register/",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = AuthResponse),
        (status = 400, description = "Validation error")
    )
)]
pub async fn register(State(state): State<AppState>, ValidJson(body): ValidJson<RegisterRequest>) -> ApiResult<AuthResponse> {
    let (user, tokens) = state.accounts.register(&body).await?;
    let division_name = state.accounts.division_name(&user).await?;
    Ok(ApiResponse::created(AuthResponse {
        user: UserBasic::new(&user, division_name),
        tokens,
        message: "Registration successful".to_string(),
    }))
}

/// Exchange username and password for a token pair
#[utoipa::path(
    post,
    path = "/api/v1/accounts/login/",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing fields, invalid credentials or inactive account")
    )
)]
pub async fn login(State(state): State<AppState>, ValidJson(body): ValidJson<LoginRequest>) -> ApiResult<AuthResponse> {
    let (user, tokens) = state.accounts.login(&body).await?;
    let division_name = state.accounts.division_name(&user).await?;
    Ok(ApiResponse::success(AuthResponse {
        user: UserBasic::new(&user, division_name),
        tokens,
        message: "Login successful".to_string(),
    }))
}

/// Blacklist a refresh token
#[utoipa::path(
    post,
    path = "/api/v1/accounts/logout/",
    tag = "Authentication",
    request_body = RefreshRequest,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
        (status = 400, description = "Missing or invalid refresh token"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ValidJson(body): ValidJson<RefreshRequest>,
) -> ApiResult<MessageResponse> {
    let Some(refresh) = body.refresh.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
        return Err(ApiError::bad_request("Refresh token required"));
    };

    state.tokens.logout(refresh).await.map_err(|err| match err {
        AccountError::Token(token) => {
            tracing::warn!("Logout by user {} with unusable refresh token: {}", current.id, token);
            ApiError::bad_request(token.to_string())
        }
        other => other.into(),
    })?;
    Ok(ApiResponse::success(MessageResponse::new("Logout successful")))
}

/// New access token (and, with rotation, a new refresh token)
#[utoipa::path(
    post,
    path = "/api/v1/accounts/token/refresh/",
    tag = "Authentication",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Refreshed tokens", body = RefreshedTokens),
        (status = 400, description = "Refresh token missing"),
        (status = 401, description = "Refresh token invalid, expired or blacklisted")
    )
)]
pub async fn refresh(State(state): State<AppState>, ValidJson(body): ValidJson<RefreshRequest>) -> ApiResult<RefreshedTokens> {
    let Some(refresh) = body.refresh.as_deref().map(str::trim).filter(|t| !t.is_empty()) else {
        return Err(ApiError::field("refresh", REQUIRED));
    };
    Ok(ApiResponse::success(state.tokens.refresh(refresh).await?))
}

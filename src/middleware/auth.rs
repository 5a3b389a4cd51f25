use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{bearer_token, TokenError};
use crate::database::models::User;
use crate::error::ApiError;

/// Authenticated user, inserted into the request extensions by [`jwt_auth_middleware`]
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

impl std::ops::Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

/// Requires `Authorization: Bearer <access token>` of an existing, active user
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .ok_or(TokenError::Missing)?;

    let user = state.tokens.authenticate(token).await.map_err(|err| {
        tracing::warn!("Rejected access token on {}: {}", request.uri().path(), err);
        err
    })?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

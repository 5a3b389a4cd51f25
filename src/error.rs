use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::auth::{PasswordHashError, TokenError};
use crate::database::DatabaseError;
use crate::filter::FilterError;
use crate::services::account_service::AccountError;
use crate::services::division_service::DivisionError;
use crate::validation::FieldErrors;

/// Category of a failed request. Fixes both the HTTP status and the
/// machine-readable `code` of the error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Validation,
    InvalidJson,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    Internal,
    Unavailable,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest | ErrorKind::Validation | ErrorKind::InvalidJson => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BAD_REQUEST",
            ErrorKind::Validation => "VALIDATION_ERROR",
            ErrorKind::InvalidJson => "INVALID_JSON",
            ErrorKind::Unauthorized => "UNAUTHORIZED",
            ErrorKind::Forbidden => "FORBIDDEN",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::Internal => "INTERNAL_SERVER_ERROR",
            ErrorKind::Unavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

/// Error returned by every handler, rendered as
/// `{"error": true, "message", "code", "field_errors"?}`.
/// Messages are client-safe; internal causes are logged where they are mapped.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    kind: ErrorKind,
    message: String,
    field_errors: Option<HashMap<String, String>>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), field_errors: None }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> u16 {
        self.kind.status().as_u16()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field_errors(&self) -> Option<&HashMap<String, String>> {
        self.field_errors.as_ref()
    }

    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": true,
            "message": self.message,
            "code": self.kind.code(),
        });
        if let Some(fields) = &self.field_errors {
            body["field_errors"] = json!(fields);
        }
        body
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn validation(message: impl Into<String>, field_errors: HashMap<String, String>) -> Self {
        Self { field_errors: Some(field_errors), ..Self::new(ErrorKind::Validation, message) }
    }

    /// Single-field validation failure; the field message doubles as the top-level message
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let fields = HashMap::from([(field.to_string(), message.clone())]);
        Self::validation(message, fields)
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidJson, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unavailable, message)
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        let message = errors.summary();
        ApiError::validation(message, errors.into_map())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(msg) => ApiError::not_found(msg),
            DatabaseError::UniqueViolation(msg) => ApiError::conflict(msg),
            DatabaseError::ForeignKeyViolation(msg) => ApiError::conflict(msg),
            DatabaseError::ConfigMissing(_) | DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("Database configuration error: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::QueryError(msg) => {
                tracing::error!(error = %msg, "database query failed");
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            DatabaseError::Migration(msg) => {
                tracing::error!(error = %msg, "migration failed");
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            DatabaseError::Sqlx(sqlx_err) => match sqlx_err {
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                    tracing::error!("Database connection error: {}", sqlx_err);
                    ApiError::service_unavailable("Database temporarily unavailable")
                }
                other => {
                    tracing::error!(error = %other, "sqlx error");
                    ApiError::internal_server_error("Database error occurred")
                }
            },
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Generation(msg) => {
                tracing::error!("Token generation failed: {}", msg);
                ApiError::internal_server_error("Could not issue token")
            }
            other => ApiError::unauthorized(other.to_string()),
        }
    }
}

impl From<PasswordHashError> for ApiError {
    fn from(err: PasswordHashError) -> Self {
        tracing::error!("Password hashing failed: {}", err);
        ApiError::internal_server_error("An error occurred while processing your request")
    }
}

impl From<DivisionError> for ApiError {
    fn from(err: DivisionError) -> Self {
        match err {
            DivisionError::NotFound(_) => ApiError::not_found("Division not found"),
            DivisionError::Invalid(errors) => errors.into(),
            DivisionError::Database(db) => db.into(),
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::NotFound(_) => ApiError::not_found("User not found"),
            AccountError::Invalid(errors) => errors.into(),
            AccountError::InvalidCredentials => ApiError::field("non_field_errors", err.to_string()),
            AccountError::Inactive => ApiError::field("non_field_errors", err.to_string()),
            AccountError::Token(token) => token.into(),
            AccountError::Password(hash) => hash.into(),
            AccountError::Database(db) => db.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.kind.status(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_carries_field_errors() {
        let err = ApiError::field("email", "Enter a valid email address.");
        let body = err.to_json();
        assert_eq!(err.status_code(), 400);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field_errors"]["email"], "Enter a valid email address.");
    }

    #[test]
    fn plain_errors_omit_field_errors() {
        let body = ApiError::not_found("Division not found").to_json();
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], "NOT_FOUND");
        assert!(body.get("field_errors").is_none());
    }

    #[test]
    fn database_errors_map_to_status() {
        assert_eq!(ApiError::from(DatabaseError::NotFound("x".into())).status_code(), 404);
        assert_eq!(ApiError::from(DatabaseError::UniqueViolation("x".into())).status_code(), 409);
        assert_eq!(ApiError::from(DatabaseError::QueryError("x".into())).status_code(), 500);
        assert_eq!(ApiError::from(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut)).status_code(), 503);
    }
}

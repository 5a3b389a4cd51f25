//! Request and response shapes for `/api/v1/accounts/` authentication and profile routes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::double_option;
use crate::database::models::User;
use crate::services::TokenPair;
use crate::utils::datetime::api_format;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RegisterRequest {
    #[schema(example = "budi.santoso")]
    pub username: Option<String>,
    #[schema(example = "EMP001")]
    pub employee_id: Option<String>,
    #[schema(example = "budi@example.co.id")]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[schema(example = "081234567890")]
    pub phone: Option<String>,
    #[schema(format = Password)]
    pub password: Option<String>,
    #[schema(format = Password)]
    pub password_confirm: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Option<String>,
    #[schema(format = Password)]
    pub password: Option<String>,
}

/// Body of `token/refresh/` and `logout/`
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

/// Writable profile fields; anything else in the body is ignored
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    #[serde(deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub division: Option<Option<i64>>,
    #[serde(deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, format = Date, example = "2024-01-15")]
    pub hire_date: Option<Option<String>>,
    #[schema(example = "full_time")]
    pub type_of_employment: Option<String>,
    #[schema(example = "active")]
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ChangePasswordRequest {
    #[schema(format = Password)]
    pub old_password: Option<String>,
    #[schema(format = Password)]
    pub new_password: Option<String>,
    #[schema(format = Password)]
    pub new_password_confirm: Option<String>,
}

/// Basic user shape returned by register and login
#[derive(Debug, Serialize, ToSchema)]
pub struct UserBasic {
    pub id: i64,
    pub username: String,
    pub employee_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub division: Option<i64>,
    pub division_name: Option<String>,
    pub role: String,
    pub is_active: bool,
    #[serde(serialize_with = "api_format::datetime")]
    #[schema(value_type = String, example = "30/12/2025 15:30:00")]
    pub date_joined: DateTime<Utc>,
    pub type_of_employment: String,
    pub status: String,
}

impl UserBasic {
    pub fn new(user: &User, division_name: Option<String>) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            employee_id: user.employee_id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            division: user.division_id,
            division_name,
            role: user.role(),
            is_active: user.is_active,
            date_joined: user.date_joined,
            type_of_employment: user.type_of_employment.clone(),
            status: user.status.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserBasic,
    pub tokens: TokenPair,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub employee_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub division: Option<i64>,
    pub division_name: Option<String>,
    #[serde(serialize_with = "api_format::option_date")]
    #[schema(value_type = Option<String>, example = "15/01/2024")]
    pub hire_date: Option<NaiveDate>,
    pub role: String,
    pub groups: Vec<String>,
    pub face_photo_front: Option<String>,
    pub face_photo_left: Option<String>,
    pub face_photo_right: Option<String>,
    pub has_complete_face_data: bool,
    pub is_active: bool,
    #[serde(serialize_with = "api_format::datetime")]
    #[schema(value_type = String, example = "30/12/2025 15:30:00")]
    pub date_joined: DateTime<Utc>,
    #[serde(serialize_with = "api_format::option_datetime")]
    #[schema(value_type = Option<String>)]
    pub last_login: Option<DateTime<Utc>>,
    pub type_of_employment: String,
    pub status: String,
}

impl Profile {
    pub fn new(user: &User, division_name: Option<String>) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            employee_id: user.employee_id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            division: user.division_id,
            division_name,
            hire_date: user.hire_date,
            role: user.role(),
            groups: user.groups.clone(),
            face_photo_front: user.face_photo_front.clone(),
            face_photo_left: user.face_photo_left.clone(),
            face_photo_right: user.face_photo_right.clone(),
            has_complete_face_data: user.has_complete_face_data(),
            is_active: user.is_active,
            date_joined: user.date_joined,
            last_login: user.last_login,
            type_of_employment: user.type_of_employment.clone(),
            status: user.status.clone(),
        }
    }
}

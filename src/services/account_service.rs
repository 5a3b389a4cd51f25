use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde_json::json;
use tracing::info;

use crate::api::v1::accounts::{ChangePasswordRequest, LoginRequest, ProfileUpdate, RegisterRequest};
use crate::auth::{hash_password, verify_password, PasswordHashError, PasswordPolicy, TokenError, UserAttributes};
use crate::config::SecurityConfig;
use crate::database::models::{EmploymentStatus, EmploymentType, FacePose, NewUser, User};
use crate::database::{DatabaseError, Store};
use crate::filter::FilterData;
use crate::permissions::Role;
use crate::services::escape_like;
use crate::services::token_service::{TokenPair, TokenService};
use crate::validation::{limits, validate_email, validate_image, validate_phone, FieldErrors};

const INVALID_USERNAME: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";
const EMAIL_TAKEN: &str = "user with this email already exists.";
const EMPLOYEE_ID_TAKEN: &str = "Employee ID is already in use";
const BAD_DATE: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("User {0} not found")]
    NotFound(i64),

    #[error("Invalid account data: {}", .0.summary())]
    Invalid(FieldErrors),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Account is inactive")]
    Inactive,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Password(#[from] PasswordHashError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<FieldErrors> for AccountError {
    fn from(errors: FieldErrors) -> Self {
        AccountError::Invalid(errors)
    }
}

/// Registration, login and self-service profile operations
pub struct AccountService {
    store: Arc<dyn Store>,
    tokens: Arc<TokenService>,
    policy: PasswordPolicy,
    update_last_login: bool,
}

fn is_valid_username(username: &str) -> bool {
    username.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
}

/// Lowercases the domain part; the local part is kept as typed
fn normalize_email(email: &str) -> String {
    match email.trim().rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.trim().to_string(),
    }
}

/// Maps a unique-key violation raised by the store back onto the offending field
fn unique_violation(err: DatabaseError) -> AccountError {
    match err {
        DatabaseError::UniqueViolation(constraint) => {
            let (field, message) = if constraint.contains("username") {
                ("username", USERNAME_TAKEN)
            } else if constraint.contains("email") {
                ("email", EMAIL_TAKEN)
            } else if constraint.contains("employee_id") {
                ("employee_id", EMPLOYEE_ID_TAKEN)
            } else {
                return DatabaseError::UniqueViolation(constraint).into();
            };
            FieldErrors::from((field, message.to_string())).into()
        }
        other => other.into(),
    }
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, tokens: Arc<TokenService>, security: &SecurityConfig) -> Self {
        Self {
            store,
            tokens,
            policy: PasswordPolicy::new(security.password_min_length),
            update_last_login: security.update_last_login,
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Name of the user's division, if any
    pub async fn division_name(&self, user: &User) -> Result<Option<String>, AccountError> {
        match user.division_id {
            Some(id) => Ok(self.store.get_division(id).await?.map(|d| d.name)),
            None => Ok(None),
        }
    }

    async fn email_taken(&self, email: &str, except: Option<i64>) -> Result<bool, AccountError> {
        let mut filter = FilterData::new().with_where(json!({ "email": { "$ilike": escape_like(email) } }));
        if let Some(id) = except {
            filter = filter.and_where(json!({ "id": { "$ne": id } }));
        }
        Ok(self.store.count_users(&filter).await? > 0)
    }

    fn check_policy(&self, field: &str, password: &str, attrs: &UserAttributes<'_>, errors: &mut FieldErrors) {
        if let Err(messages) = self.policy.validate(password, attrs) {
            errors.add(field, messages.join(" "));
        }
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<(User, TokenPair), AccountError> {
        let mut errors = FieldErrors::new();

        let username = errors.require("username", req.username.as_deref());
        if let Some(username) = username {
            if !is_valid_username(username) {
                errors.add("username", INVALID_USERNAME);
            }
            errors.check_max_length("username", username, limits::USERNAME);
        }

        let employee_id = errors.require("employee_id", req.employee_id.as_deref());
        if let Some(employee_id) = employee_id {
            errors.check_max_length("employee_id", employee_id, limits::EMPLOYEE_ID);
        }

        let email = errors.require("email", req.email.as_deref()).map(normalize_email);
        if let Some(email) = &email {
            errors.check("email", validate_email(email));
            errors.check_max_length("email", email, limits::EMAIL);
        }

        let first_name = req.first_name.as_deref().unwrap_or_default().trim();
        let last_name = req.last_name.as_deref().unwrap_or_default().trim();
        errors.check_max_length("first_name", first_name, limits::PERSON_NAME);
        errors.check_max_length("last_name", last_name, limits::PERSON_NAME);

        let phone = req.phone.as_deref().unwrap_or_default().trim();
        errors.check("phone", validate_phone(phone));
        errors.check_max_length("phone", phone, limits::PHONE);

        // Passwords are not trimmed
        let password = req.password.as_deref().filter(|p| !p.is_empty());
        let confirm = req.password_confirm.as_deref().filter(|p| !p.is_empty());
        errors.require("password", password);
        errors.require("password_confirm", confirm);

        if let Some(password) = password {
            let attrs = UserAttributes {
                username: username.unwrap_or_default(),
                first_name,
                last_name,
                email: email.as_deref().unwrap_or_default(),
            };
            self.check_policy("password", password, &attrs, &mut errors);
            if confirm.is_some_and(|c| c != password) {
                errors.add("password", "Passwords do not match");
            }
        }

        if let Some(username) = username {
            if self.store.find_user_by("username", username).await?.is_some() {
                errors.add("username", USERNAME_TAKEN);
            }
        }
        if let Some(email) = &email {
            if !errors.has("email") && self.email_taken(email, None).await? {
                errors.add("email", EMAIL_TAKEN);
            }
        }
        if let Some(employee_id) = employee_id {
            if self.store.find_user_by("employee_id", employee_id).await?.is_some() {
                errors.add("employee_id", EMPLOYEE_ID_TAKEN);
            }
        }

        let (Some(username), Some(employee_id), Some(email), Some(password)) = (username, employee_id, email, password)
        else {
            return Err(errors.into());
        };
        errors.into_result()?;

        let user = self
            .store
            .insert_user(NewUser {
                username: username.to_string(),
                email,
                password_hash: hash_password(password)?,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                employee_id: employee_id.to_string(),
                phone: phone.to_string(),
                ..NewUser::default()
            })
            .await
            .map_err(unique_violation)?;

        let tokens = self.tokens.issue_pair(user.id).await?;
        info!("Registered user {} ({})", user.username, user.id);
        Ok((user, tokens))
    }

    pub async fn login(&self, req: &LoginRequest) -> Result<(User, TokenPair), AccountError> {
        let mut errors = FieldErrors::new();
        let username = errors.require("username", req.username.as_deref());
        let password = req.password.as_deref().filter(|p| !p.is_empty());
        errors.require("password", password);

        let (Some(username), Some(password)) = (username, password) else {
            return Err(errors.into());
        };

        let Some(mut user) = self.store.find_user_by("username", username).await? else {
            return Err(AccountError::InvalidCredentials);
        };
        if !verify_password(password, &user.password) {
            return Err(AccountError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AccountError::Inactive);
        }

        if self.update_last_login {
            user.last_login = Some(Utc::now());
            user = self.store.update_user(&user).await?;
        }

        let tokens = self.tokens.issue_pair(user.id).await?;
        info!("User {} logged in", user.username);
        Ok((user, tokens))
    }

    /// Applies a profile update. PUT (`partial == false`) requires `email`.
    pub async fn update_profile(&self, mut user: User, update: &ProfileUpdate, partial: bool) -> Result<User, AccountError> {
        let mut errors = FieldErrors::new();

        let email = if partial {
            update.email.as_deref().map(|e| {
                if e.trim().is_empty() {
                    errors.add("email", "This field may not be blank.");
                }
                normalize_email(e)
            })
        } else {
            errors.require("email", update.email.as_deref()).map(normalize_email)
        };
        if let Some(email) = email.as_deref().filter(|e| !e.is_empty()) {
            errors.check("email", validate_email(email));
            errors.check_max_length("email", email, limits::EMAIL);
            if !errors.has("email") && self.email_taken(email, Some(user.id)).await? {
                errors.add("email", EMAIL_TAKEN);
            }
        }

        if let Some(first_name) = &update.first_name {
            errors.check_max_length("first_name", first_name.trim(), limits::PERSON_NAME);
        }
        if let Some(last_name) = &update.last_name {
            errors.check_max_length("last_name", last_name.trim(), limits::PERSON_NAME);
        }
        if let Some(phone) = &update.phone {
            errors.check("phone", validate_phone(phone));
            errors.check_max_length("phone", phone.trim(), limits::PHONE);
        }

        if let Some(Some(division_id)) = update.division {
            let usable = self.store.get_division(division_id).await?.is_some_and(|d| d.is_active());
            if !usable {
                errors.add("division", format!("Invalid pk \"{}\" - object does not exist.", division_id));
            }
        }

        let hire_date = match &update.hire_date {
            Some(Some(raw)) if !raw.trim().is_empty() => match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
                Ok(date) => Some(Some(date)),
                Err(_) => {
                    errors.add("hire_date", BAD_DATE);
                    None
                }
            },
            Some(_) => Some(None),
            None => None,
        };

        let employment = update
            .type_of_employment
            .as_deref()
            .and_then(|raw| match raw.parse::<EmploymentType>() {
                Ok(kind) => Some(kind),
                Err(message) => {
                    errors.add("type_of_employment", message);
                    None
                }
            });
        let status = update.status.as_deref().and_then(|raw| match raw.parse::<EmploymentStatus>() {
            Ok(status) => Some(status),
            Err(message) => {
                errors.add("status", message);
                None
            }
        });

        errors.into_result()?;

        if let Some(email) = email {
            user.email = email;
        }
        if let Some(first_name) = &update.first_name {
            user.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = &update.last_name {
            user.last_name = last_name.trim().to_string();
        }
        if let Some(phone) = &update.phone {
            user.phone = phone.trim().to_string();
        }
        if let Some(division) = update.division {
            user.division_id = division;
        }
        if let Some(hire_date) = hire_date {
            user.hire_date = hire_date;
        }
        if let Some(kind) = employment {
            user.type_of_employment = kind.as_str().to_string();
        }
        if let Some(status) = status {
            user.status = status.as_str().to_string();
        }
        user.updated_at = Utc::now();

        let user = self.store.update_user(&user).await.map_err(unique_violation)?;
        info!("User {} updated their profile", user.id);
        Ok(user)
    }

    pub async fn change_password(&self, mut user: User, req: &ChangePasswordRequest) -> Result<(), AccountError> {
        let mut errors = FieldErrors::new();
        let old = req.old_password.as_deref().filter(|p| !p.is_empty());
        let new = req.new_password.as_deref().filter(|p| !p.is_empty());
        let confirm = req.new_password_confirm.as_deref().filter(|p| !p.is_empty());
        errors.require("old_password", old);
        errors.require("new_password", new);
        errors.require("new_password_confirm", confirm);

        if let Some(old) = old {
            if !verify_password(old, &user.password) {
                errors.add("old_password", "Old password is incorrect");
            }
        }
        if let Some(new) = new {
            let attrs = UserAttributes {
                username: &user.username,
                first_name: &user.first_name,
                last_name: &user.last_name,
                email: &user.email,
            };
            self.check_policy("new_password", new, &attrs, &mut errors);
            if confirm.is_some_and(|c| c != new) {
                errors.add("new_password", "New passwords do not match");
            }
        }

        let Some(new) = new else {
            return Err(errors.into());
        };
        errors.into_result()?;

        user.password = hash_password(new)?;
        user.updated_at = Utc::now();
        self.store.update_user(&user).await?;
        info!("User {} changed their password", user.id);
        Ok(())
    }

    /// Creates a staff superuser, used by the CLI
    pub async fn create_superuser(
        &self,
        username: &str,
        email: &str,
        employee_id: &str,
        password: &str,
    ) -> Result<User, AccountError> {
        let mut errors = FieldErrors::new();
        if !is_valid_username(username) || username.is_empty() {
            errors.add("username", INVALID_USERNAME);
        }
        let email = normalize_email(email);
        errors.check("email", validate_email(&email));
        errors.require("employee_id", Some(employee_id));
        if password.is_empty() {
            errors.add("password", crate::validation::REQUIRED);
        }
        errors.into_result()?;

        let user = self
            .store
            .insert_user(NewUser {
                username: username.to_string(),
                email,
                password_hash: hash_password(password)?,
                employee_id: employee_id.trim().to_string(),
                is_staff: true,
                is_superuser: true,
                ..NewUser::default()
            })
            .await
            .map_err(unique_violation)?;
        info!("Created superuser {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Adds a known role group; assigning a group twice is a no-op
    pub async fn assign_group(&self, id: i64, group: &str) -> Result<User, AccountError> {
        let mut user = self.store.get_user(id).await?.ok_or(AccountError::NotFound(id))?;
        let Some(role) = Role::from_group_name(group.trim()) else {
            let known: Vec<&str> = Role::ALL.iter().map(|r| r.group_name()).collect();
            let message = format!("Unknown group \"{}\". Expected one of: {}.", group.trim(), known.join(", "));
            return Err(FieldErrors::from(("groups", message)).into());
        };

        if user.groups.iter().any(|g| g == role.group_name()) {
            return Ok(user);
        }
        user.groups.push(role.group_name().to_string());
        user.updated_at = Utc::now();
        let user = self.store.update_user(&user).await?;
        info!("Assigned group {} to user {}", role.group_name(), user.id);
        Ok(user)
    }

    /// Records the stored path of one face photo after validating the file
    pub async fn set_face_photo(&self, id: i64, pose: FacePose, path: &str, size: u64) -> Result<User, AccountError> {
        let mut user = self.store.get_user(id).await?.ok_or(AccountError::NotFound(id))?;
        let field = match pose {
            FacePose::Front => "face_photo_front",
            FacePose::Left => "face_photo_left",
            FacePose::Right => "face_photo_right",
        };
        let mut errors = FieldErrors::new();
        errors.check(field, validate_image(path, size));
        errors.into_result()?;

        *user.face_photo_mut(pose) = Some(path.to_string());
        user.updated_at = Utc::now();
        let user = self.store.update_user(&user).await?;
        info!("Stored {} for user {}", field, user.id);
        Ok(user)
    }
}

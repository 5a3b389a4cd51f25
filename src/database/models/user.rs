use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

use crate::filter::{ColumnKind, TableSchema};

pub const USERS: TableSchema = TableSchema {
    name: "users",
    columns: &[
        ("id", ColumnKind::Int),
        ("username", ColumnKind::Text),
        ("email", ColumnKind::Text),
        ("first_name", ColumnKind::Text),
        ("last_name", ColumnKind::Text),
        ("employee_id", ColumnKind::Text),
        ("phone", ColumnKind::Text),
        ("division_id", ColumnKind::Int),
        ("hire_date", ColumnKind::Date),
        ("type_of_employment", ColumnKind::Text),
        ("status", ColumnKind::Text),
        ("face_photo_front", ColumnKind::Text),
        ("face_photo_left", ColumnKind::Text),
        ("face_photo_right", ColumnKind::Text),
        ("face_encoding", ColumnKind::Json),
        ("is_active", ColumnKind::Bool),
        ("is_staff", ColumnKind::Bool),
        ("is_superuser", ColumnKind::Bool),
        ("groups", ColumnKind::TextArray),
        ("user_permissions", ColumnKind::TextArray),
        ("date_joined", ColumnKind::Timestamp),
        ("last_login", ColumnKind::Timestamp),
        ("updated_at", ColumnKind::Timestamp),
    ],
};

pub const DEFAULT_ORDER: &str = "employee_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    #[default]
    FullTime,
    PartTime,
    Contract,
    Internship,
}

impl EmploymentType {
    pub const ALL: [EmploymentType; 4] = [
        EmploymentType::FullTime,
        EmploymentType::PartTime,
        EmploymentType::Contract,
        EmploymentType::Internship,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full_time",
            EmploymentType::PartTime => "part_time",
            EmploymentType::Contract => "contract",
            EmploymentType::Internship => "internship",
        }
    }
}

impl std::str::FromStr for EmploymentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmploymentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("\"{}\" is not a valid choice.", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    #[default]
    Active,
    Probation,
    OnLeave,
    Resigned,
    Terminated,
}

impl EmploymentStatus {
    pub const ALL: [EmploymentStatus; 5] = [
        EmploymentStatus::Active,
        EmploymentStatus::Probation,
        EmploymentStatus::OnLeave,
        EmploymentStatus::Resigned,
        EmploymentStatus::Terminated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EmploymentStatus::Active => "active",
            EmploymentStatus::Probation => "probation",
            EmploymentStatus::OnLeave => "on_leave",
            EmploymentStatus::Resigned => "resigned",
            EmploymentStatus::Terminated => "terminated",
        }
    }
}

impl std::str::FromStr for EmploymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmploymentStatus::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("\"{}\" is not a valid choice.", s))
    }
}

/// Which of the three face photos a path belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacePose {
    Front,
    Left,
    Right,
}

impl std::str::FromStr for FacePose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "front" => Ok(FacePose::Front),
            "left" => Ok(FacePose::Left),
            "right" => Ok(FacePose::Right),
            other => Err(format!("unknown pose '{}', expected front, left or right", other)),
        }
    }
}

/// Employee account. The password hash is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub employee_id: String,
    pub phone: String,
    pub division_id: Option<i64>,
    pub hire_date: Option<NaiveDate>,
    pub type_of_employment: String,
    pub status: String,
    pub face_photo_front: Option<String>,
    pub face_photo_left: Option<String>,
    pub face_photo_right: Option<String>,
    pub face_encoding: Option<Value>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub groups: Vec<String>,
    pub user_permissions: Vec<String>,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub employee_id: String,
    pub phone: String,
    pub division_id: Option<i64>,
    pub hire_date: Option<NaiveDate>,
    pub type_of_employment: EmploymentType,
    pub status: EmploymentStatus,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub groups: Vec<String>,
    /// Defaults to the insert time; set only when importing existing staff
    pub date_joined: Option<DateTime<Utc>>,
}

impl User {
    pub fn from_new(id: i64, new: NewUser) -> Self {
        let now = Utc::now();
        Self {
            id,
            username: new.username,
            email: new.email,
            password: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            employee_id: new.employee_id,
            phone: new.phone,
            division_id: new.division_id,
            hire_date: new.hire_date,
            type_of_employment: new.type_of_employment.as_str().to_string(),
            status: new.status.as_str().to_string(),
            face_photo_front: None,
            face_photo_left: None,
            face_photo_right: None,
            face_encoding: None,
            is_active: true,
            is_staff: new.is_staff,
            is_superuser: new.is_superuser,
            groups: new.groups,
            user_permissions: vec![],
            date_joined: new.date_joined.unwrap_or(now),
            last_login: None,
            updated_at: now,
        }
    }

    /// "first last", trimmed
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn role(&self) -> String {
        crate::permissions::role_display(self)
    }

    pub fn has_complete_face_data(&self) -> bool {
        self.face_photo_front.is_some() && self.face_photo_left.is_some() && self.face_photo_right.is_some()
    }

    pub fn face_photo_mut(&mut self, pose: FacePose) -> &mut Option<String> {
        match pose {
            FacePose::Front => &mut self.face_photo_front,
            FacePose::Left => &mut self.face_photo_left,
            FacePose::Right => &mut self.face_photo_right,
        }
    }

    /// `EMPLOYEE_ID - full name`, falling back to the username
    pub fn label(&self) -> String {
        let name = self.full_name();
        let name = if name.is_empty() { self.username.clone() } else { name };
        format!("{} - {}", self.employee_id, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User::from_new(
            1,
            NewUser {
                username: "sari".into(),
                email: "sari@example.com".into(),
                password_hash: "$argon2id$secret".into(),
                employee_id: "EMP010".into(),
                ..NewUser::default()
            },
        )
    }

    #[test]
    fn derived_values() {
        let mut user = sample();
        assert_eq!(user.full_name(), "");
        assert_eq!(user.label(), "EMP010 - sari");
        assert_eq!(user.role(), "Employee");
        assert_eq!(user.type_of_employment, "full_time");
        assert_eq!(user.status, "active");

        user.first_name = "Sari".into();
        user.last_name = "Wulandari".into();
        assert_eq!(user.full_name(), "Sari Wulandari");
        assert_eq!(user.label(), "EMP010 - Sari Wulandari");
    }

    #[test]
    fn face_data_requires_all_three_photos() {
        let mut user = sample();
        *user.face_photo_mut(FacePose::Front) = Some("faces/front/a.jpg".into());
        *user.face_photo_mut(FacePose::Left) = Some("faces/left/a.jpg".into());
        assert!(!user.has_complete_face_data());
        *user.face_photo_mut(FacePose::Right) = Some("faces/right/a.jpg".into());
        assert!(user.has_complete_face_data());
    }

    #[test]
    fn password_is_never_serialized() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "sari");
    }

    #[test]
    fn parses_choices() {
        assert_eq!("on_leave".parse::<EmploymentStatus>(), Ok(EmploymentStatus::OnLeave));
        assert_eq!("contract".parse::<EmploymentType>(), Ok(EmploymentType::Contract));
        assert!("retired".parse::<EmploymentStatus>().is_err());
        assert!("side".parse::<FacePose>().is_err());
    }
}

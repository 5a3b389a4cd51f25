//! Response shapes of the read-only `/api/v2/accounts/users/` directory.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::parse_bool_param;
use crate::services::user_service::{parse_ordering, UserActivity, UserDetail, UserQuery, UserRow, UserStatistics};
use crate::utils::datetime::api_format;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListParams {
    /// Matches username, email, first or last name and employee id
    pub search: Option<String>,
    pub is_active: Option<String>,
    /// Division id
    pub division: Option<String>,
    /// `username`, `email`, `created_at` or `employee_id`, `-` prefix to reverse. Defaults to `-created_at`.
    pub ordering: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl UserListParams {
    pub fn to_query(&self) -> UserQuery {
        UserQuery {
            search: self.search.clone(),
            is_active: parse_bool_param(self.is_active.as_deref()),
            division: self.division.as_deref().and_then(|d| d.trim().parse().ok()),
            ordering: parse_ordering(self.ordering.as_deref()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListItem {
    pub id: i64,
    pub employee_id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub division_name: Option<String>,
    pub is_active: bool,
    pub account_age_days: i64,
    pub is_online: bool,
    #[serde(serialize_with = "api_format::datetime")]
    #[schema(value_type = String)]
    pub date_joined: DateTime<Utc>,
}

impl From<&UserRow> for UserListItem {
    fn from(row: &UserRow) -> Self {
        let u = &row.user;
        Self {
            id: u.id,
            employee_id: u.employee_id.clone(),
            username: u.username.clone(),
            email: u.email.clone(),
            full_name: u.full_name(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            phone: u.phone.clone(),
            division_name: row.division_name.clone(),
            is_active: u.is_active,
            account_age_days: row.account_age_days,
            is_online: u.is_active,
            date_joined: u.date_joined,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DivisionInfoView {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub level: i32,
    #[schema(example = "HR Department > Recruitment")]
    pub hierarchy_path: String,
    pub employee_count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountStatistics {
    pub account_age_days: i64,
    pub is_superuser: bool,
    pub is_staff: bool,
    #[serde(serialize_with = "api_format::option_datetime")]
    #[schema(value_type = Option<String>)]
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionsSummary {
    /// Directly granted permissions only
    pub total_permissions: usize,
    pub groups: Vec<String>,
    pub is_admin: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserDetailView {
    pub id: i64,
    pub employee_id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub status: String,
    pub type_of_employment: String,
    #[serde(serialize_with = "api_format::option_date")]
    #[schema(value_type = Option<String>)]
    pub hire_date: Option<NaiveDate>,
    pub is_active: bool,
    pub division_info: Option<DivisionInfoView>,
    pub account_statistics: AccountStatistics,
    pub permissions_summary: PermissionsSummary,
    #[serde(serialize_with = "api_format::datetime")]
    #[schema(value_type = String)]
    pub date_joined: DateTime<Utc>,
    #[serde(serialize_with = "api_format::datetime")]
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl From<&UserDetail> for UserDetailView {
    fn from(detail: &UserDetail) -> Self {
        let u = &detail.user;
        Self {
            id: u.id,
            employee_id: u.employee_id.clone(),
            username: u.username.clone(),
            email: u.email.clone(),
            full_name: u.full_name(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            phone: u.phone.clone(),
            status: u.status.clone(),
            type_of_employment: u.type_of_employment.clone(),
            hire_date: u.hire_date,
            is_active: u.is_active,
            division_info: detail.division.as_ref().map(|info| DivisionInfoView {
                id: info.division.id,
                code: info.division.code.clone(),
                name: info.division.name.clone(),
                level: info.division.level,
                hierarchy_path: info.hierarchy_path.clone(),
                employee_count: info.employee_count,
            }),
            account_statistics: AccountStatistics {
                account_age_days: detail.account_age_days,
                is_superuser: u.is_superuser,
                is_staff: u.is_staff,
                last_login: u.last_login,
            },
            permissions_summary: PermissionsSummary {
                total_permissions: u.user_permissions.len(),
                groups: u.groups.clone(),
                is_admin: u.is_superuser || u.is_staff,
            },
            date_joined: u.date_joined,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatisticsSummary {
    pub total_users: i64,
    pub active_users: i64,
    pub inactive_users: i64,
    pub new_users_last_30_days: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopDivision {
    #[serde(rename = "division__name")]
    pub division_name: String,
    pub count: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserStatisticsView {
    pub summary: StatisticsSummary,
    pub top_divisions: Vec<TopDivision>,
    #[serde(serialize_with = "api_format::datetime")]
    #[schema(value_type = String)]
    pub generated_at: DateTime<Utc>,
}

impl From<UserStatistics> for UserStatisticsView {
    fn from(stats: UserStatistics) -> Self {
        Self {
            summary: StatisticsSummary {
                total_users: stats.total_users,
                active_users: stats.active_users,
                inactive_users: stats.inactive_users,
                new_users_last_30_days: stats.new_users_last_30_days,
            },
            top_divisions: stats
                .top_divisions
                .into_iter()
                .map(|(division_name, count)| TopDivision { division_name, count })
                .collect(),
            generated_at: stats.generated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserActivityView {
    pub user_id: i64,
    pub username: String,
    #[serde(serialize_with = "api_format::datetime")]
    #[schema(value_type = String)]
    pub account_created: DateTime<Utc>,
    pub account_age_days: i64,
    #[serde(serialize_with = "api_format::option_datetime")]
    #[schema(value_type = Option<String>)]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(serialize_with = "api_format::datetime")]
    #[schema(value_type = String)]
    pub last_updated: DateTime<Utc>,
    /// Ten points per day of account age, capped at 1000
    pub activity_score: i64,
    #[schema(example = "active")]
    pub status: String,
}

impl From<&UserActivity> for UserActivityView {
    fn from(activity: &UserActivity) -> Self {
        let u = &activity.user;
        Self {
            user_id: u.id,
            username: u.username.clone(),
            account_created: u.date_joined,
            account_age_days: activity.account_age_days,
            last_login: u.last_login,
            last_updated: u.updated_at,
            activity_score: activity.activity_score,
            status: if u.is_active { "active" } else { "inactive" }.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_divisions_keep_the_grouped_field_name() {
        let view = UserStatisticsView::from(UserStatistics {
            total_users: 3,
            active_users: 2,
            inactive_users: 1,
            new_users_last_30_days: 3,
            top_divisions: vec![("Finance".into(), 2)],
            generated_at: Utc::now(),
        });
        let body = serde_json::to_value(view).unwrap();
        assert_eq!(body["top_divisions"][0]["division__name"], "Finance");
        assert_eq!(body["summary"]["inactive_users"], 1);
    }

    #[test]
    fn list_params_parse_filters() {
        let params = UserListParams {
            is_active: Some("false".into()),
            division: Some("4".into()),
            ordering: Some("created_at".into()),
            ..UserListParams::default()
        };
        let query = params.to_query();
        assert_eq!(query.is_active, Some(false));
        assert_eq!(query.division, Some(4));
        assert_eq!(query.ordering.len(), 1);
    }
}

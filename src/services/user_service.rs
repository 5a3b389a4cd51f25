//! Read-only employee directory behind the v2 API.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

use crate::database::models::{Division, User};
use crate::database::Store;
use crate::filter::FilterData;
use crate::services::account_service::AccountError;
use crate::services::hierarchy::DivisionTree;
use crate::services::search_pattern;
use crate::utils::datetime::age_in_days;

const SEARCH_FIELDS: [&str; 5] = ["username", "email", "first_name", "last_name", "employee_id"];
const DEFAULT_ORDER: &str = "-date_joined";
const TOP_DIVISIONS: usize = 5;
const NEW_USER_WINDOW_DAYS: i64 = 30;

/// Sortable fields of the user listing. `created_at` is accepted as an alias of `date_joined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSort {
    Username,
    Email,
    DateJoined,
    EmployeeId,
}

impl UserSort {
    fn parse(field: &str) -> Option<Self> {
        match field {
            "username" => Some(UserSort::Username),
            "email" => Some(UserSort::Email),
            "created_at" | "date_joined" => Some(UserSort::DateJoined),
            "employee_id" => Some(UserSort::EmployeeId),
            _ => None,
        }
    }

    fn column(self) -> &'static str {
        match self {
            UserSort::Username => "username",
            UserSort::Email => "email",
            UserSort::DateJoined => "date_joined",
            UserSort::EmployeeId => "employee_id",
        }
    }
}

/// `-created_at,username` -> `[(DateJoined, desc), (Username, asc)]`; unknown fields are dropped
pub fn parse_ordering(raw: Option<&str>) -> Vec<(UserSort, bool)> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter_map(|field| match field.strip_prefix('-') {
            Some(name) => UserSort::parse(name).map(|s| (s, true)),
            None => UserSort::parse(field).map(|s| (s, false)),
        })
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub division: Option<i64>,
    pub ordering: Vec<(UserSort, bool)>,
}

impl UserQuery {
    fn to_filter(&self) -> FilterData {
        let mut filter = FilterData::new().with_where(json!({ "is_active": true }));
        if let Some(is_active) = self.is_active {
            filter = filter.and_where(json!({ "is_active": is_active }));
        }
        if let Some(division) = self.division {
            filter = filter.and_where(json!({ "division_id": division }));
        }
        if let Some(term) = self.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = search_pattern(term);
            let any: Vec<Value> = SEARCH_FIELDS
                .iter()
                .map(|field| json!({ *field: { "$ilike": pattern } }))
                .collect();
            filter = filter.and_where(json!({ "$or": any }));
        }
        filter
    }

    fn order_value(&self) -> Value {
        let mut order: Vec<String> = self
            .ordering
            .iter()
            .map(|(sort, desc)| format!("{}{}", if *desc { "-" } else { "" }, sort.column()))
            .collect();
        if order.is_empty() {
            order.push(DEFAULT_ORDER.to_string());
        }
        order.push("id".to_string());
        json!(order)
    }
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub user: User,
    pub division_name: Option<String>,
    pub account_age_days: i64,
}

#[derive(Debug, Clone)]
pub struct DivisionInfo {
    pub division: Division,
    pub hierarchy_path: String,
    pub employee_count: i64,
}

#[derive(Debug, Clone)]
pub struct UserDetail {
    pub user: User,
    pub division: Option<DivisionInfo>,
    pub account_age_days: i64,
}

#[derive(Debug, Clone)]
pub struct UserStatistics {
    pub total_users: i64,
    pub active_users: i64,
    pub inactive_users: i64,
    pub new_users_last_30_days: i64,
    /// (division name, active users), largest first
    pub top_divisions: Vec<(String, i64)>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UserActivity {
    pub user: User,
    pub account_age_days: i64,
    pub activity_score: i64,
}

pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn active(&self, id: i64) -> Result<User, AccountError> {
        match self.store.get_user(id).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(AccountError::NotFound(id)),
        }
    }

    async fn division_names(&self) -> Result<HashMap<i64, String>, AccountError> {
        let divisions = self.store.select_divisions(&FilterData::new()).await?;
        Ok(divisions.into_iter().map(|d| (d.id, d.name)).collect())
    }

    pub async fn list(&self, query: &UserQuery, limit: i64, offset: i64) -> Result<(i64, Vec<UserRow>), AccountError> {
        let filter = query.to_filter();
        let total = self.store.count_users(&filter).await?;
        let users = self
            .store
            .select_users(&filter.with_order(query.order_value()).paginate(limit, offset))
            .await?;

        let names = self.division_names().await?;
        let now = Utc::now();
        let rows = users
            .into_iter()
            .map(|user| UserRow {
                division_name: user.division_id.and_then(|id| names.get(&id).cloned()),
                account_age_days: age_in_days(user.date_joined, now),
                user,
            })
            .collect();
        Ok((total, rows))
    }

    pub async fn detail(&self, id: i64) -> Result<UserDetail, AccountError> {
        let user = self.active(id).await?;

        let division = match user.division_id {
            Some(division_id) => {
                let tree = DivisionTree::new(self.store.select_divisions(&FilterData::new()).await?);
                match tree.get(division_id) {
                    Some(division) => {
                        let members = FilterData::new().with_where(json!({ "division_id": division_id, "is_active": true }));
                        Some(DivisionInfo {
                            division: division.clone(),
                            hierarchy_path: tree.full_path(division_id),
                            employee_count: self.store.count_users(&members).await?,
                        })
                    }
                    None => None,
                }
            }
            None => None,
        };

        Ok(UserDetail {
            account_age_days: age_in_days(user.date_joined, Utc::now()),
            division,
            user,
        })
    }

    pub async fn statistics(&self) -> Result<UserStatistics, AccountError> {
        let now = Utc::now();
        let total_users = self.store.count_users(&FilterData::new()).await?;
        let active_users = self
            .store
            .count_users(&FilterData::new().with_where(json!({ "is_active": true })))
            .await?;
        let since = (now - Duration::days(NEW_USER_WINDOW_DAYS)).to_rfc3339();
        let new_users_last_30_days = self
            .store
            .count_users(&FilterData::new().with_where(json!({ "date_joined": { "$gte": since } })))
            .await?;

        let names = self.division_names().await?;
        let members = FilterData::new().with_where(json!({ "is_active": true, "division_id": { "$ne": null } }));
        let mut per_division: HashMap<String, i64> = HashMap::new();
        for user in self.store.select_users(&members).await? {
            if let Some(name) = user.division_id.and_then(|id| names.get(&id)) {
                *per_division.entry(name.clone()).or_insert(0) += 1;
            }
        }
        let mut top_divisions: Vec<(String, i64)> = per_division.into_iter().collect();
        top_divisions.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_divisions.truncate(TOP_DIVISIONS);

        Ok(UserStatistics {
            total_users,
            active_users,
            inactive_users: total_users - active_users,
            new_users_last_30_days,
            top_divisions,
            generated_at: now,
        })
    }

    pub async fn activity(&self, id: i64) -> Result<UserActivity, AccountError> {
        let user = self.active(id).await?;
        let account_age_days = age_in_days(user.date_joined, Utc::now());
        Ok(UserActivity {
            activity_score: (account_age_days * 10).min(1000),
            account_age_days,
            user,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{NewDivision, NewUser};
    use crate::database::MemoryStore;

    async fn seed() -> (UserService, Arc<dyn Store>) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let hr = store
            .insert_division(NewDivision { code: "HR".into(), name: "HR Department".into(), ..NewDivision::default() })
            .await
            .unwrap();
        let rec = store
            .insert_division(NewDivision {
                code: "HR-REC".into(),
                name: "Recruitment".into(),
                parent_id: Some(hr.id),
                level: 1,
                ..NewDivision::default()
            })
            .await
            .unwrap();

        for (username, first, division) in [
            ("ani", "Ani", Some(rec.id)),
            ("bayu", "Bayu", Some(rec.id)),
            ("cahya", "Cahya", Some(hr.id)),
            ("dodi", "Dodi", None),
        ] {
            store
                .insert_user(NewUser {
                    username: username.into(),
                    email: format!("{}@example.com", username),
                    employee_id: format!("EMP-{}", username.to_uppercase()),
                    first_name: first.into(),
                    division_id: division,
                    ..NewUser::default()
                })
                .await
                .unwrap();
        }

        let mut dodi = store.find_user_by("username", "dodi").await.unwrap().unwrap();
        dodi.is_active = false;
        store.update_user(&dodi).await.unwrap();

        (UserService::new(store.clone()), store)
    }

    #[test]
    fn created_at_orders_by_date_joined() {
        assert_eq!(
            parse_ordering(Some("-created_at, bogus,username")),
            vec![(UserSort::DateJoined, true), (UserSort::Username, false)]
        );
        assert_eq!(UserQuery::default().order_value(), json!(["-date_joined", "id"]));
    }

    #[tokio::test]
    async fn list_hides_inactive_users_and_searches() {
        let (users, _) = seed().await;

        let (total, rows) = users.list(&UserQuery::default(), 20, 0).await.unwrap();
        assert_eq!(total, 3);
        assert!(rows.iter().all(|r| r.user.is_active));

        let query = UserQuery { search: Some("BAY".into()), ..UserQuery::default() };
        let (total, rows) = users.list(&query, 20, 0).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].division_name.as_deref(), Some("Recruitment"));

        let query = UserQuery { is_active: Some(false), ..UserQuery::default() };
        assert_eq!(users.list(&query, 20, 0).await.unwrap().0, 0);

        let query = UserQuery { ordering: parse_ordering(Some("username")), ..UserQuery::default() };
        let (_, rows) = users.list(&query, 2, 1).await.unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r.user.username.as_str()).collect();
        assert_eq!(names, vec!["bayu", "cahya"]);
    }

    #[tokio::test]
    async fn detail_includes_hierarchy_path() {
        let (users, store) = seed().await;
        let ani = store.find_user_by("username", "ani").await.unwrap().unwrap();

        let detail = users.detail(ani.id).await.unwrap();
        let info = detail.division.unwrap();
        assert_eq!(info.hierarchy_path, "HR Department > Recruitment");
        assert_eq!(info.employee_count, 2);

        let dodi = store.find_user_by("username", "dodi").await.unwrap().unwrap();
        assert!(matches!(users.detail(dodi.id).await, Err(AccountError::NotFound(_))));
    }

    #[tokio::test]
    async fn statistics_and_activity() {
        let (users, store) = seed().await;
        let stats = users.statistics().await.unwrap();

        assert_eq!(stats.total_users, 4);
        assert_eq!(stats.active_users, 3);
        assert_eq!(stats.inactive_users, 1);
        assert_eq!(stats.new_users_last_30_days, 4);
        assert_eq!(
            stats.top_divisions,
            vec![("Recruitment".to_string(), 2), ("HR Department".to_string(), 1)]
        );

        let veteran = store
            .insert_user(NewUser {
                username: "eko".into(),
                email: "eko@example.com".into(),
                employee_id: "EMP-EKO".into(),
                date_joined: Some(Utc::now() - Duration::days(250)),
                ..NewUser::default()
            })
            .await
            .unwrap();
        let activity = users.activity(veteran.id).await.unwrap();
        assert_eq!(activity.account_age_days, 250);
        assert_eq!(activity.activity_score, 1000);

        let stats = users.statistics().await.unwrap();
        assert_eq!(stats.total_users, 5);
        assert_eq!(stats.new_users_last_30_days, 4);

        let ani = store.find_user_by("username", "ani").await.unwrap().unwrap();
        let activity = users.activity(ani.id).await.unwrap();
        assert_eq!(activity.account_age_days, 0);
        assert_eq!(activity.activity_score, 0);
    }
}

//! Request and response shapes for `/api/v1/accounts/divisions/`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::double_option;
use crate::database::models::Division;
use crate::services::division_service::{
    parse_ordering, DivisionDetail, DivisionEmployee, DivisionInput, DivisionNode, DivisionQuery, DivisionRow,
    ParentFilter,
};
use crate::utils::datetime::api_format;

/// Query string of the division listing. Values stay strings so a bad
/// filter is ignored instead of failing the whole request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DivisionListParams {
    /// Case-insensitive match on name, code or description
    pub search: Option<String>,
    pub level: Option<String>,
    /// Parent id, or `null` for top-level divisions
    pub parent: Option<String>,
    /// `true` to list top-level divisions only
    pub top_only: Option<String>,
    /// Comma list of `code`, `name`, `level`, `created_at`, `employee_count`; prefix with `-` to reverse
    pub ordering: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl DivisionListParams {
    pub fn to_query(&self) -> DivisionQuery {
        let parent = match self.parent.as_deref().map(str::trim) {
            Some("null") | Some("none") => ParentFilter::TopLevel,
            Some(raw) => raw.parse().map(ParentFilter::Id).unwrap_or(ParentFilter::Any),
            None => ParentFilter::Any,
        };
        DivisionQuery {
            search: self.search.clone(),
            level: self.level.as_deref().and_then(|l| l.trim().parse().ok()),
            parent,
            top_only: crate::api::parse_bool_param(self.top_only.as_deref()).unwrap_or(false),
            ordering: parse_ordering(self.ordering.as_deref()),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeesParams {
    /// Include employees of every sub-division
    pub include_children: Option<String>,
}

impl EmployeesParams {
    pub fn include_children(&self) -> bool {
        self.include_children
            .as_deref()
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
    }
}

/// Body of POST, PUT and PATCH
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct DivisionWrite {
    #[schema(example = "HR-REC")]
    pub code: Option<String>,
    #[schema(example = "Recruitment")]
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>)]
    pub parent: Option<Option<i64>>,
}

impl From<DivisionWrite> for DivisionInput {
    fn from(body: DivisionWrite) -> Self {
        DivisionInput {
            code: body.code,
            name: body.name,
            description: body.description,
            parent: body.parent,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DivisionListItem {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub parent: Option<i64>,
    pub parent_name: Option<String>,
    pub level: i32,
    pub employee_count: i64,
    #[serde(serialize_with = "api_format::datetime")]
    #[schema(value_type = String, example = "30/12/2025 15:30:00")]
    pub created_at: DateTime<Utc>,
}

impl From<&DivisionRow> for DivisionListItem {
    fn from(row: &DivisionRow) -> Self {
        let d = &row.division;
        Self {
            id: d.id,
            code: d.code.clone(),
            name: d.name.clone(),
            parent: d.parent_id,
            parent_name: row.parent_name.clone(),
            level: d.level,
            employee_count: row.employee_count,
            created_at: d.audit.created_at,
        }
    }
}

/// Returned by POST
#[derive(Debug, Serialize, ToSchema)]
pub struct DivisionCreated {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: String,
    pub parent: Option<i64>,
    pub level: i32,
    #[serde(serialize_with = "api_format::datetime")]
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl From<&Division> for DivisionCreated {
    fn from(d: &Division) -> Self {
        Self {
            id: d.id,
            code: d.code.clone(),
            name: d.name.clone(),
            description: d.description.clone(),
            parent: d.parent_id,
            level: d.level,
            created_at: d.audit.created_at,
        }
    }
}

/// Returned by PUT and PATCH
#[derive(Debug, Serialize, ToSchema)]
pub struct DivisionUpdated {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: String,
    pub parent: Option<i64>,
    pub level: i32,
    #[serde(serialize_with = "api_format::datetime")]
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl From<&Division> for DivisionUpdated {
    fn from(d: &Division) -> Self {
        Self {
            id: d.id,
            code: d.code.clone(),
            name: d.name.clone(),
            description: d.description.clone(),
            parent: d.parent_id,
            level: d.level,
            updated_at: d.audit.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AncestorItem {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub level: i32,
}

impl From<&Division> for AncestorItem {
    fn from(d: &Division) -> Self {
        Self { id: d.id, code: d.code.clone(), name: d.name.clone(), level: d.level }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DivisionDetailView {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub description: String,
    pub parent: Option<i64>,
    pub parent_name: Option<String>,
    pub level: i32,
    #[schema(example = "HR Department > HR Manager > Recruitment")]
    pub full_path: String,
    pub employee_count: i64,
    /// Including every active sub-division
    pub total_employee_count: i64,
    pub children: Vec<DivisionListItem>,
    /// Nearest parent first
    pub ancestors: Vec<AncestorItem>,
    #[serde(serialize_with = "api_format::datetime")]
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[serde(serialize_with = "api_format::datetime")]
    #[schema(value_type = String)]
    pub updated_at: DateTime<Utc>,
}

impl From<&DivisionDetail> for DivisionDetailView {
    fn from(detail: &DivisionDetail) -> Self {
        let d = &detail.row.division;
        Self {
            id: d.id,
            code: d.code.clone(),
            name: d.name.clone(),
            description: d.description.clone(),
            parent: d.parent_id,
            parent_name: detail.row.parent_name.clone(),
            level: d.level,
            full_path: detail.full_path.clone(),
            employee_count: detail.row.employee_count,
            total_employee_count: detail.total_employee_count,
            children: detail.children.iter().map(DivisionListItem::from).collect(),
            ancestors: detail.ancestors.iter().map(AncestorItem::from).collect(),
            created_at: d.audit.created_at,
            updated_at: d.audit.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DivisionTreeNode {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub parent: Option<i64>,
    pub parent_name: Option<String>,
    pub level: i32,
    pub employee_count: i64,
    #[serde(serialize_with = "api_format::datetime")]
    #[schema(value_type = String)]
    pub created_at: DateTime<Utc>,
    #[schema(no_recursion)]
    pub children: Vec<DivisionTreeNode>,
}

impl From<&DivisionNode> for DivisionTreeNode {
    fn from(node: &DivisionNode) -> Self {
        let item = DivisionListItem::from(&node.row);
        Self {
            id: item.id,
            code: item.code,
            name: item.name,
            parent: item.parent,
            parent_name: item.parent_name,
            level: item.level,
            employee_count: item.employee_count,
            created_at: item.created_at,
            children: node.children.iter().map(DivisionTreeNode::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DivisionTreeResponse {
    pub count: usize,
    pub tree: Vec<DivisionTreeNode>,
}

/// Unpaginated `{count, results}` list
#[derive(Debug, Serialize, ToSchema)]
pub struct CountedList<T> {
    pub count: usize,
    pub results: Vec<T>,
}

impl<T> From<Vec<T>> for CountedList<T> {
    fn from(results: Vec<T>) -> Self {
        Self { count: results.len(), results }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DivisionEmployeeItem {
    pub id: i64,
    pub employee_id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    /// Name of the employee's division
    pub division: Option<String>,
}

impl From<&DivisionEmployee> for DivisionEmployeeItem {
    fn from(e: &DivisionEmployee) -> Self {
        Self {
            id: e.user.id,
            employee_id: e.user.employee_id.clone(),
            username: e.user.username.clone(),
            full_name: e.user.full_name(),
            email: e.user.email.clone(),
            division: e.division_name.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DivisionEmployees {
    /// Division name
    pub division: String,
    pub include_children: bool,
    pub count: usize,
    pub results: Vec<DivisionEmployeeItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::division_service::DivisionSort;
    use serde_json::json;

    #[test]
    fn list_params_ignore_malformed_filters() {
        let params = DivisionListParams {
            level: Some("x".into()),
            parent: Some("null".into()),
            top_only: Some("true".into()),
            ordering: Some("-employee_count,bogus".into()),
            ..DivisionListParams::default()
        };
        let query = params.to_query();
        assert_eq!(query.level, None);
        assert_eq!(query.parent, ParentFilter::TopLevel);
        assert!(query.top_only);
        assert_eq!(query.ordering, vec![(DivisionSort::EmployeeCount, true)]);

        let params = DivisionListParams { parent: Some("7".into()), ..DivisionListParams::default() };
        assert_eq!(params.to_query().parent, ParentFilter::Id(7));
    }

    #[test]
    fn write_body_keeps_explicit_null_parent() {
        let body: DivisionWrite = serde_json::from_value(json!({ "name": "Ops", "parent": null })).unwrap();
        let input = DivisionInput::from(body);
        assert_eq!(input.parent, Some(None));
        assert_eq!(input.code, None);

        let body: DivisionWrite = serde_json::from_value(json!({ "name": "Ops" })).unwrap();
        assert_eq!(DivisionInput::from(body).parent, None);
    }

    #[test]
    fn include_children_flag() {
        let params = EmployeesParams { include_children: Some("True".into()) };
        assert!(params.include_children());
        assert!(!EmployeesParams::default().include_children());
    }
}

// handlers/v1/divisions.rs - division hierarchy CRUD and tree views

use axum::{
    extract::{OriginalUri, Query, State},
    Extension,
};

use crate::api::v1::{
    AncestorItem, CountedList, DivisionCreated, DivisionDetailView, DivisionEmployeeItem, DivisionEmployees,
    DivisionListItem, DivisionListParams, DivisionTreeNode, DivisionTreeResponse, DivisionUpdated, DivisionWrite,
    EmployeesParams,
};
use crate::api::{Page, PageRequest};
use crate::app::AppState;
use crate::handlers::paginate;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, PathId, ValidJson};

/// Active divisions, paginated
#[utoipa::path(
    get,
    path = "/api/v1/accounts/divisions/",
    tag = "Divisions",
    params(DivisionListParams),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "One page of divisions", body = Page<DivisionListItem>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Invalid page.")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<DivisionListParams>,
) -> ApiResult<Page<DivisionListItem>> {
    let request = PageRequest::parse(params.page.as_deref(), params.page_size.as_deref(), &state.config.api)?;
    let query = params.to_query();

    let (request, count, rows) =
        paginate(request, |limit, offset| state.divisions.list(&query, limit, offset)).await?;
    let items = rows.iter().map(DivisionListItem::from).collect();
    Ok(ApiResponse::success(Page::new(request, count, items, &uri)))
}

#[utoipa::path(
    post,
    path = "/api/v1/accounts/divisions/",
    tag = "Divisions",
    request_body = DivisionWrite,
    security(("bearerAuth" = [])),
    responses(
        (status = 201, description = "Division created", body = DivisionCreated),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn create(State(state): State<AppState>, ValidJson(body): ValidJson<DivisionWrite>) -> ApiResult<DivisionCreated> {
    let division = state.divisions.create(body.into()).await?;
    Ok(ApiResponse::created(DivisionCreated::from(&division)))
}

#[utoipa::path(
    get,
    path = "/api/v1/accounts/divisions/{id}/",
    tag = "Divisions",
    params(("id" = i64, Path, description = "Division id")),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Division with children, ancestors and head counts", body = DivisionDetailView),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Division not found")
    )
)]
pub async fn retrieve(State(state): State<AppState>, PathId(id): PathId) -> ApiResult<DivisionDetailView> {
    let detail = state.divisions.detail(id).await?;
    Ok(ApiResponse::success(DivisionDetailView::from(&detail)))
}

/// Full update; `code` and `name` are required
#[utoipa::path(
    put,
    path = "/api/v1/accounts/divisions/{id}/",
    tag = "Divisions",
    params(("id" = i64, Path, description = "Division id")),
    request_body = DivisionWrite,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Division updated", body = DivisionUpdated),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Division not found")
    )
)]
pub async fn update(
    State(state): State<AppState>,
    PathId(id): PathId,
    ValidJson(body): ValidJson<DivisionWrite>,
) -> ApiResult<DivisionUpdated> {
    let division = state.divisions.update(id, body.into(), false).await?;
    Ok(ApiResponse::success(DivisionUpdated::from(&division)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/accounts/divisions/{id}/",
    tag = "Divisions",
    params(("id" = i64, Path, description = "Division id")),
    request_body = DivisionWrite,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Division updated", body = DivisionUpdated),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Division not found")
    )
)]
pub async fn partial_update(
    State(state): State<AppState>,
    PathId(id): PathId,
    ValidJson(body): ValidJson<DivisionWrite>,
) -> ApiResult<DivisionUpdated> {
    let division = state.divisions.update(id, body.into(), true).await?;
    Ok(ApiResponse::success(DivisionUpdated::from(&division)))
}

/// Soft delete; refused while active sub-divisions or employees remain
#[utoipa::path(
    delete,
    path = "/api/v1/accounts/divisions/{id}/",
    tag = "Divisions",
    params(("id" = i64, Path, description = "Division id")),
    security(("bearerAuth" = [])),
    responses(
        (status = 204, description = "Division deleted"),
        (status = 400, description = "Division still has active sub-divisions or employees"),
        (status = 404, description = "Division not found")
    )
)]
pub async fn destroy(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    PathId(id): PathId,
) -> ApiResult<()> {
    state.divisions.soft_delete(id, current.id).await?;
    Ok(ApiResponse::no_content())
}

#[utoipa::path(
    get,
    path = "/api/v1/accounts/divisions/tree/",
    tag = "Divisions",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Active top-level divisions with nested children", body = DivisionTreeResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn tree(State(state): State<AppState>) -> ApiResult<DivisionTreeResponse> {
    let tree: Vec<DivisionTreeNode> = state.divisions.tree_view().await?.iter().map(DivisionTreeNode::from).collect();
    Ok(ApiResponse::success(DivisionTreeResponse { count: tree.len(), tree }))
}

#[utoipa::path(
    get,
    path = "/api/v1/accounts/divisions/{id}/children/",
    tag = "Divisions",
    params(("id" = i64, Path, description = "Division id")),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Active immediate children", body = CountedList<DivisionListItem>),
        (status = 404, description = "Division not found")
    )
)]
pub async fn children(State(state): State<AppState>, PathId(id): PathId) -> ApiResult<CountedList<DivisionListItem>> {
    let rows = state.divisions.children(id).await?;
    let items: Vec<DivisionListItem> = rows.iter().map(DivisionListItem::from).collect();
    Ok(ApiResponse::success(items.into()))
}

/// Parent chain from the nearest parent up to the root
#[utoipa::path(
    get,
    path = "/api/v1/accounts/divisions/{id}/ancestors/",
    tag = "Divisions",
    params(("id" = i64, Path, description = "Division id")),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Ancestors, nearest first", body = CountedList<AncestorItem>),
        (status = 404, description = "Division not found")
    )
)]
pub async fn ancestors(State(state): State<AppState>, PathId(id): PathId) -> ApiResult<CountedList<AncestorItem>> {
    let ancestors = state.divisions.ancestors(id).await?;
    let items: Vec<AncestorItem> = ancestors.iter().map(AncestorItem::from).collect();
    Ok(ApiResponse::success(items.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/accounts/divisions/{id}/employees/",
    tag = "Divisions",
    params(("id" = i64, Path, description = "Division id"), EmployeesParams),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Active employees of the division", body = DivisionEmployees),
        (status = 404, description = "Division not found")
    )
)]
pub async fn employees(
    State(state): State<AppState>,
    PathId(id): PathId,
    Query(params): Query<EmployeesParams>,
) -> ApiResult<DivisionEmployees> {
    let include_children = params.include_children();
    let (division, employees) = state.divisions.employees(id, include_children).await?;
    let results: Vec<DivisionEmployeeItem> = employees.iter().map(DivisionEmployeeItem::from).collect();
    Ok(ApiResponse::success(DivisionEmployees {
        division: division.name,
        include_children,
        count: results.len(),
        results,
    }))
}

// handlers/v2/users.rs - read-only user directory

use axum::extract::{OriginalUri, Query, State};

use crate::api::v2::{UserActivityView, UserDetailView, UserListItem, UserListParams, UserStatisticsView};
use crate::api::{Page, PageRequest};
use crate::app::AppState;
use crate::handlers::paginate;
use crate::middleware::{ApiResponse, ApiResult, PathId};

/// Active users only; `is_active` and `division` narrow further
#[utoipa::path(
    get,
    path = "/api/v2/accounts/users/",
    tag = "Users V2",
    params(UserListParams),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "One page of users", body = Page<UserListItem>),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Invalid page.")
    )
)]
pub async fn list(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<UserListParams>,
) -> ApiResult<Page<UserListItem>> {
    let request = PageRequest::parse(params.page.as_deref(), params.page_size.as_deref(), &state.config.api)?;
    let query = params.to_query();

    let (request, count, rows) = paginate(request, |limit, offset| state.users.list(&query, limit, offset)).await?;
    let items = rows.iter().map(UserListItem::from).collect();
    Ok(ApiResponse::success(Page::new(request, count, items, &uri)))
}

#[utoipa::path(
    get,
    path = "/api/v2/accounts/users/{id}/",
    tag = "Users V2",
    params(("id" = i64, Path, description = "User id")),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "User with division, account and permission summaries", body = UserDetailView),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User not found")
    )
)]
pub async fn retrieve(State(state): State<AppState>, PathId(id): PathId) -> ApiResult<UserDetailView> {
    let detail = state.users.detail(id).await?;
    Ok(ApiResponse::success(UserDetailView::from(&detail)))
}

#[utoipa::path(
    get,
    path = "/api/v2/accounts/users/statistics/",
    tag = "Users V2",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Head counts and the five largest divisions", body = UserStatisticsView),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn statistics(State(state): State<AppState>) -> ApiResult<UserStatisticsView> {
    let stats = state.users.statistics().await?;
    Ok(ApiResponse::success(stats.into()))
}

#[utoipa::path(
    get,
    path = "/api/v2/accounts/users/{id}/activity/",
    tag = "Users V2",
    params(("id" = i64, Path, description = "User id")),
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Account age and activity score", body = UserActivityView),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "User not found")
    )
)]
pub async fn activity(State(state): State<AppState>, PathId(id): PathId) -> ApiResult<UserActivityView> {
    let activity = state.users.activity(id).await?;
    Ok(ApiResponse::success(UserActivityView::from(&activity)))
}

// handlers/v1/profile.rs - the signed-in user's own account

use axum::{extract::State, Extension};

use crate::api::v1::{ChangePasswordRequest, MessageResponse, Profile, ProfileUpdate};
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, CurrentUser, ValidJson};

#[utoipa::path(
    get,
    path = "/api/v1/accounts/profile/",
    tag = "Users V1",
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Current user's profile", body = Profile),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_profile(State(state): State<AppState>, Extension(CurrentUser(user)): Extension<CurrentUser>) -> ApiResult<Profile> {
    let division_name = state.accounts.division_name(&user).await?;
    Ok(ApiResponse::success(Profile::new(&user, division_name)))
}

async fn save_profile(state: &AppState, current: CurrentUser, body: &ProfileUpdate, partial: bool) -> ApiResult<Profile> {
    let user = state.accounts.update_profile(current.0, body, partial).await?;
    let division_name = state.accounts.division_name(&user).await?;
    Ok(ApiResponse::success(Profile::new(&user, division_name)))
}

/// Replace the writable profile fields; `email` is required
#[utoipa::path(
    put,
    path = "/api/v1/accounts/profile/",
    tag = "Users V1",
    request_body = ProfileUpdate,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Updated profile", body = Profile),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn put_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ValidJson(body): ValidJson<ProfileUpdate>,
) -> ApiResult<Profile> {
    save_profile(&state, current, &body, false).await
}

#[utoipa::path(
    patch,
    path = "/api/v1/accounts/profile/",
    tag = "Users V1",
    request_body = ProfileUpdate,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Updated profile", body = Profile),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn patch_profile(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    ValidJson(body): ValidJson<ProfileUpdate>,
) -> ApiResult<Profile> {
    save_profile(&state, current, &body, true).await
}

#[utoipa::path(
    post,
    path = "/api/v1/accounts/change-password/",
    tag = "Users V1",
    request_body = ChangePasswordRequest,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Password changed successfully", body = MessageResponse),
        (status = 400, description = "Wrong old password, mismatch or weak new password"),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidJson(body): ValidJson<ChangePasswordRequest>,
) -> ApiResult<MessageResponse> {
    state.accounts.change_password(user, &body).await?;
    Ok(ApiResponse::success(MessageResponse::new("Password changed successfully")))
}

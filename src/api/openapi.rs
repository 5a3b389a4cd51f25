//! One OpenAPI document per API version.
//!
//! The documents are assembled from separate path lists, so a v2 operation
//! can never leak into the v1 document or the other way round.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::api::{v1, v2};
use crate::handlers::{v1 as v1_handlers, v2 as v2_handlers};
use crate::services::token_service::{RefreshedTokens, TokenPair};

pub const TITLE: &str = "HR Management System API";

/// Registers the `bearerAuth` scheme referenced by protected operations
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Management System API",
        description = "Authentication, employee profiles and the division hierarchy"
    ),
    paths(
        v1_handlers::auth::register,
        v1_handlers::auth::login,
        v1_handlers::auth::logout,
        v1_handlers::auth::refresh,
        v1_handlers::profile::get_profile,
        v1_handlers::profile::put_profile,
        v1_handlers::profile::patch_profile,
        v1_handlers::profile::change_password,
        v1_handlers::divisions::list,
        v1_handlers::divisions::create,
        v1_handlers::divisions::retrieve,
        v1_handlers::divisions::update,
        v1_handlers::divisions::partial_update,
        v1_handlers::divisions::destroy,
        v1_handlers::divisions::tree,
        v1_handlers::divisions::children,
        v1_handlers::divisions::ancestors,
        v1_handlers::divisions::employees,
    ),
    components(schemas(
        v1::RegisterRequest,
        v1::LoginRequest,
        v1::RefreshRequest,
        v1::ProfileUpdate,
        v1::ChangePasswordRequest,
        v1::UserBasic,
        v1::AuthResponse,
        v1::MessageResponse,
        v1::Profile,
        v1::DivisionWrite,
        v1::DivisionListItem,
        v1::DivisionCreated,
        v1::DivisionUpdated,
        v1::DivisionDetailView,
        v1::AncestorItem,
        v1::DivisionTreeNode,
        v1::DivisionTreeResponse,
        v1::DivisionEmployeeItem,
        v1::DivisionEmployees,
        TokenPair,
        RefreshedTokens,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration, login, logout and token refresh"),
        (name = "Users V1", description = "The authenticated user's own profile"),
        (name = "Divisions", description = "Division hierarchy management"),
    )
)]
pub struct ApiDocV1;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Management System API",
        description = "Read-only user directory with statistics"
    ),
    paths(
        v2_handlers::users::list,
        v2_handlers::users::retrieve,
        v2_handlers::users::statistics,
        v2_handlers::users::activity,
    ),
    components(schemas(
        v2::UserListItem,
        v2::UserDetailView,
        v2::DivisionInfoView,
        v2::AccountStatistics,
        v2::PermissionsSummary,
        v2::StatisticsSummary,
        v2::TopDivision,
        v2::UserStatisticsView,
        v2::UserActivityView,
    )),
    modifiers(&SecurityAddon),
    tags((name = "Users V2", description = "Read-only user directory"))
)]
pub struct ApiDocV2;

/// API version selector shared by the docs routes and `hrctl schema`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V1,
    V2,
}

impl ApiVersion {
    pub fn document(self) -> utoipa::openapi::OpenApi {
        match self {
            ApiVersion::V1 => ApiDocV1::openapi(),
            ApiVersion::V2 => ApiDocV2::openapi(),
        }
    }

    pub fn schema_path(self) -> &'static str {
        match self {
            ApiVersion::V1 => "/api/v1/schema/",
            ApiVersion::V2 => "/api/v2/schema/",
        }
    }
}

impl std::str::FromStr for ApiVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(ApiVersion::V1),
            "v2" | "2" => Ok(ApiVersion::V2),
            other => Err(format!("unknown API version '{}', expected v1 or v2", other)),
        }
    }
}

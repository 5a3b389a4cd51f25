// app.rs - shared state and router
//
// Public (no auth): root, health, docs, register/login/refresh
// Protected (JWT): logout, profile, divisions, v2 users

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::{JwtManager, TokenError};
use crate::config::{AppConfig, SecurityConfig};
use crate::database::Store;
use crate::handlers::{docs, v1, v2};
use crate::middleware::jwt_auth_middleware;
use crate::services::{AccountService, DivisionService, TokenService, UserService};

/// Everything a handler needs, cloned per request
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenService>,
    pub accounts: Arc<AccountService>,
    pub divisions: Arc<DivisionService>,
    pub users: Arc<UserService>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Result<Self, TokenError> {
        let jwt = JwtManager::from_config(&config.security)?;
        let tokens = Arc::new(TokenService::new(store.clone(), jwt, &config.security));
        let accounts = Arc::new(AccountService::new(store.clone(), tokens.clone(), &config.security));

        Ok(Self {
            divisions: Arc::new(DivisionService::new(store.clone())),
            users: Arc::new(UserService::new(store.clone())),
            config: Arc::new(config),
            store,
            tokens,
            accounts,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    let app = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(docs_routes())
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .layer(cors);

    let app = if state.config.api.enable_request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    };
    app.with_state(state)
}

fn docs_routes() -> Router<AppState> {
    Router::new()
        .route("/api/v1/schema/", get(docs::v1_schema))
        .route("/api/v1/schema/swagger-ui/", get(docs::v1_swagger_ui))
        .route("/api/v1/schema/redoc/", get(docs::v1_redoc))
        .route("/api/v2/schema/", get(docs::v2_schema))
        .route("/api/v2/schema/swagger-ui/", get(docs::v2_swagger_ui))
        .route("/api/v2/schema/redoc/", get(docs::v2_redoc))
}

fn public_routes() -> Router<AppState> {
    use v1::auth;

    Router::new()
        .route("/api/v1/accounts/register/", post(auth::register))
        .route("/api/v1/accounts/login/", post(auth::login))
        .route("/api/v1/accounts/token/refresh/", post(auth::refresh))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use v1::{auth, divisions, profile};
    use v2::users;

    Router::new()
        .route("/api/v1/accounts/logout/", post(auth::logout))
        .route(
            "/api/v1/accounts/profile/",
            get(profile::get_profile).put(profile::put_profile).patch(profile::patch_profile),
        )
        .route("/api/v1/accounts/change-password/", post(profile::change_password))
        .route("/api/v1/accounts/divisions/", get(divisions::list).post(divisions::create))
        // Static segments before :id
        .route("/api/v1/accounts/divisions/tree/", get(divisions::tree))
        .route(
            "/api/v1/accounts/divisions/:id/",
            get(divisions::retrieve)
                .put(divisions::update)
                .patch(divisions::partial_update)
                .delete(divisions::destroy),
        )
        .route("/api/v1/accounts/divisions/:id/children/", get(divisions::children))
        .route("/api/v1/accounts/divisions/:id/ancestors/", get(divisions::ancestors))
        .route("/api/v1/accounts/divisions/:id/employees/", get(divisions::employees))
        .route("/api/v2/accounts/users/", get(users::list))
        .route("/api/v2/accounts/users/statistics/", get(users::statistics))
        .route("/api/v2/accounts/users/:id/", get(users::retrieve))
        .route("/api/v2/accounts/users/:id/activity/", get(users::activity))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if security.cors_allow_all {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
}

async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "HR Admin API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Employee accounts and division hierarchy for HR administration",
            "endpoints": {
                "auth": "/api/v1/accounts/{register,login,logout,token/refresh}/ (public except logout)",
                "profile": "/api/v1/accounts/profile/, /api/v1/accounts/change-password/ (protected)",
                "divisions": "/api/v1/accounts/divisions/[:id/[children|ancestors|employees]/] (protected)",
                "users": "/api/v2/accounts/users/[:id/[activity]/|statistics/] (protected)",
                "health": "/health (public)",
            },
            "documentation": {
                "v1": ["/api/v1/schema/", "/api/v1/schema/swagger-ui/", "/api/v1/schema/redoc/"],
                "v2": ["/api/v2/schema/", "/api/v2/schema/swagger-ui/", "/api/v2/schema/redoc/"],
            }
        }
    }))
}

async fn health(axum::extract::State(state): axum::extract::State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "database_error": e.to_string()
                    }
                })),
            )
        }
    }
}

mod common;

use anyhow::Result;
use common::{TestServer, PASSWORD};
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn health_and_root_are_public() -> Result<()> {
    let server = TestServer::start().await?;

    let (status, body) = server.call(Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
    assert_eq!(body["data"]["database"], "ok");

    let (status, body) = server.call(Method::GET, "/", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    Ok(())
}

#[tokio::test]
async fn register_returns_user_and_tokens() -> Result<()> {
    let server = TestServer::start().await?;
    let data = server.register("andi", "EMP001").await?;

    assert_eq!(data["message"], "Registration successful");
    assert_eq!(data["user"]["username"], "andi");
    assert_eq!(data["user"]["role"], "Employee");
    assert!(data["user"].get("password").is_none());
    assert!(data["tokens"]["access"].is_string());
    assert!(data["tokens"]["refresh"].is_string());
    Ok(())
}

#[tokio::test]
async fn register_reports_field_errors() -> Result<()> {
    let server = TestServer::start().await?;
    server.register("andi", "EMP001").await?;

    let (status, body) = server
        .post(
            "/api/v1/accounts/register/",
            None,
            json!({
                "username": "andi",
                "employee_id": "EMP001",
                "email": "not-an-email",
                "password": PASSWORD,
                "password_confirm": "something-else",
            }),
        )
        .await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field_errors"]["username"], "A user with that username already exists.");
    assert_eq!(body["field_errors"]["employee_id"], "Employee ID is already in use");
    assert_eq!(body["field_errors"]["email"], "Enter a valid email address.");
    assert_eq!(body["field_errors"]["password"], "Passwords do not match");
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_rejected() -> Result<()> {
    let server = TestServer::start().await?;
    let resp = server
        .client
        .post(server.url("/api/v1/accounts/login/"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn login_updates_last_login_and_rejects_bad_credentials() -> Result<()> {
    let server = TestServer::start().await?;
    let registered = server.register("budi", "EMP002").await?;
    let id = registered["user"]["id"].as_i64().unwrap_or_default();

    let (status, body) = server
        .post("/api/v1/accounts/login/", None, json!({ "username": "budi", "password": "wrong" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["non_field_errors"], "Invalid username or password");

    let (status, body) = server
        .post("/api/v1/accounts/login/", None, json!({ "username": "budi", "password": PASSWORD }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Login successful");
    let stored = server.state.store.get_user(id).await?.expect("user exists");
    assert!(stored.last_login.is_some());

    server.modify_user(id, |u| u.is_active = false).await?;
    let (status, body) = server
        .post("/api/v1/accounts/login/", None, json!({ "username": "budi", "password": PASSWORD }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["non_field_errors"], "Account is inactive");
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_valid_access_token() -> Result<()> {
    let server = TestServer::start().await?;

    let (status, body) = server.call(Method::GET, "/api/v1/accounts/profile/", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authentication credentials were not provided");

    let (status, _) = server.get("/api/v1/accounts/profile/", "garbage").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // a refresh token is not an access token
    let data = server.register("citra", "EMP003").await?;
    let refresh = data["tokens"]["refresh"].as_str().unwrap_or_default();
    let (status, _) = server.get("/api/v1/accounts/profile/", refresh).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn refresh_rotates_and_logout_blacklists() -> Result<()> {
    let server = TestServer::start().await?;
    let data = server.register("dewi", "EMP004").await?;
    let access = data["tokens"]["access"].as_str().unwrap_or_default().to_string();
    let refresh = data["tokens"]["refresh"].as_str().unwrap_or_default().to_string();

    let (status, body) = server.post("/api/v1/accounts/token/refresh/", None, json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["refresh"], "This field is required.");

    let (status, body) = server
        .post("/api/v1/accounts/token/refresh/", None, json!({ "refresh": refresh }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    let rotated = body["data"]["refresh"].as_str().unwrap_or_default().to_string();
    assert!(body["data"]["access"].is_string());
    assert!(!rotated.is_empty());

    // the rotated-out token is blacklisted
    let (status, body) = server
        .post("/api/v1/accounts/token/refresh/", None, json!({ "refresh": refresh }))
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token is blacklisted");

    let (status, body) = server.post("/api/v1/accounts/logout/", Some(&access), json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Refresh token required");

    let (status, body) = server
        .post("/api/v1/accounts/logout/", Some(&access), json!({ "refresh": rotated }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Logout successful");

    let (status, _) = server
        .post("/api/v1/accounts/logout/", Some(&access), json!({ "refresh": rotated }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

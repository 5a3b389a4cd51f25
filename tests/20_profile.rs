mod common;

use anyhow::Result;
use common::{TestServer, PASSWORD};
use reqwest::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn profile_reflects_the_signed_in_user() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.access_token("eko", "EMP010").await?;

    let (status, body) = server.get("/api/v1/accounts/profile/", &token).await?;
    assert_eq!(status, StatusCode::OK);
    let profile = &body["data"];
    assert_eq!(profile["username"], "eko");
    assert_eq!(profile["employee_id"], "EMP010");
    assert_eq!(profile["has_complete_face_data"], false);
    assert_eq!(profile["division_name"], serde_json::Value::Null);
    assert!(profile.get("password").is_none());
    // dd/mm/yyyy hh:mm:ss
    let joined = profile["date_joined"].as_str().unwrap_or_default();
    assert_eq!(joined.len(), 19);
    assert_eq!(&joined[2..3], "/");
    Ok(())
}

#[tokio::test]
async fn patch_updates_only_supplied_fields() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.access_token("fajar", "EMP011").await?;
    let finance = server.division("FIN", "Finance", None, 0).await?;

    let (status, body) = server
        .call(
            Method::PATCH,
            "/api/v1/accounts/profile/",
            Some(&token),
            Some(json!({
                "first_name": "Fajar",
                "division": finance,
                "hire_date": "2024-01-15",
                "type_of_employment": "contract",
                "username": "ignored",
                "is_active": false,
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let profile = &body["data"];
    assert_eq!(profile["first_name"], "Fajar");
    assert_eq!(profile["division"], finance);
    assert_eq!(profile["division_name"], "Finance");
    assert_eq!(profile["hire_date"], "15/01/2024");
    assert_eq!(profile["type_of_employment"], "contract");
    assert_eq!(profile["username"], "fajar");
    assert_eq!(profile["is_active"], true);
    assert_eq!(profile["email"], "fajar@example.com");

    // explicit null clears the division
    let (status, body) = server
        .call(Method::PATCH, "/api/v1/accounts/profile/", Some(&token), Some(json!({ "division": null })))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["division"], serde_json::Value::Null);
    Ok(())
}

#[tokio::test]
async fn profile_validation_errors() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.access_token("gita", "EMP012").await?;
    server.register("hadi", "EMP013").await?;

    let (status, body) = server
        .call(
            Method::PATCH,
            "/api/v1/accounts/profile/",
            Some(&token),
            Some(json!({
                "email": "HADI@example.com",
                "phone": "12345",
                "division": 404,
                "status": "retired",
                "hire_date": "15-01-2024",
            })),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = &body["field_errors"];
    assert_eq!(errors["email"], "user with this email already exists.");
    assert_eq!(errors["division"], "Invalid pk \"404\" - object does not exist.");
    assert_eq!(errors["status"], "\"retired\" is not a valid choice.");
    assert_eq!(
        errors["hire_date"],
        "Date has wrong format. Use one of these formats instead: YYYY-MM-DD."
    );
    assert!(errors["phone"].is_string());

    // PUT requires email
    let (status, body) = server
        .call(Method::PUT, "/api/v1/accounts/profile/", Some(&token), Some(json!({ "first_name": "Gita" })))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["email"], "This field is required.");
    Ok(())
}

#[tokio::test]
async fn change_password_then_login_with_the_new_one() -> Result<()> {
    let server = TestServer::start().await?;
    let token = server.access_token("indra", "EMP014").await?;

    let (status, body) = server
        .post(
            "/api/v1/accounts/change-password/",
            Some(&token),
            json!({
                "old_password": "nope",
                "new_password": "Teh-Manis-2024",
                "new_password_confirm": "Teh-Manis-2024",
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["old_password"], "Old password is incorrect");

    let (status, body) = server
        .post(
            "/api/v1/accounts/change-password/",
            Some(&token),
            json!({
                "old_password": PASSWORD,
                "new_password": "Teh-Manis-2024",
                "new_password_confirm": "Teh-Manis-2024",
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Password changed successfully");

    let (status, _) = server
        .post("/api/v1/accounts/login/", None, json!({ "username": "indra", "password": PASSWORD }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = server
        .post("/api/v1/accounts/login/", None, json!({ "username": "indra", "password": "Teh-Manis-2024" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

mod common;

use anyhow::Result;
use chrono::{Duration, Utc};
use common::TestServer;
use reqwest::{Method, StatusCode};
use serde_json::Value;

const USERS: &str = "/api/v2/accounts/users/";

/// Five users: two in Recruitment, two in Finance (one inactive) and eka, who joined 45 days ago; returns (token, ids)
async fn seed(server: &TestServer) -> Result<(String, Vec<i64>)> {
    let hr = server.division("HR", "HR Department", None, 0).await?;
    let rec = server.division("HR-REC", "Recruitment", Some(hr), 1).await?;
    let fin = server.division("FIN", "Finance", None, 0).await?;

    let mut ids = Vec::new();
    for (username, employee_id) in [("ani", "EMP001"), ("bayu", "EMP002"), ("cahya", "EMP003"), ("dimas", "EMP004")] {
        ids.push(server.register(username, employee_id).await?["user"]["id"].as_i64().unwrap_or_default());
    }
    ids.push(server.employee("eka", "EMP005", Some(Utc::now() - Duration::days(45))).await?);
    server.modify_user(ids[0], |u| u.division_id = Some(rec)).await?;
    server.modify_user(ids[1], |u| u.division_id = Some(rec)).await?;
    server.modify_user(ids[2], |u| u.division_id = Some(fin)).await?;
    server
        .modify_user(ids[3], |u| {
            u.division_id = Some(fin);
            u.is_active = false;
        })
        .await?;
    server
        .modify_user(ids[4], |u| {
            u.is_superuser = true;
            u.groups = vec!["HR Admin".to_string()];
            u.user_permissions = vec!["core.view_analytics".to_string()];
        })
        .await?;

    let token = server.access_token("viewer", "EMP999").await?;
    Ok((token, ids))
}

fn usernames(page: &Value) -> Vec<String> {
    page["results"]
        .as_array()
        .map(|rows| rows.iter().filter_map(|r| r["username"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn list_shows_active_users_newest_first() -> Result<()> {
    let server = TestServer::start().await?;
    let (token, _) = seed(&server).await?;

    let (status, body) = server.get(USERS, &token).await?;
    assert_eq!(status, StatusCode::OK);
    let page = &body["data"];
    assert_eq!(page["count"], 5);
    assert!(!usernames(page).contains(&"dimas".to_string()));
    // eka joined 45 days ago, so comes last
    assert_eq!(usernames(page).last().map(String::as_str), Some("eka"));
    assert_eq!(page["results"][4]["account_age_days"], 45);

    let (_, body) = server.get(&format!("{}?is_active=false", USERS), &token).await?;
    assert_eq!(body["data"]["count"], 0);

    let (_, body) = server.get(&format!("{}?ordering=username&page_size=2", USERS), &token).await?;
    assert_eq!(usernames(&body["data"]), vec!["ani", "bayu"]);
    assert_eq!(body["data"]["next"], "/api/v2/accounts/users/?ordering=username&page_size=2&page=2");

    let (_, body) = server.get(&format!("{}?search=EMP00", USERS), &token).await?;
    assert_eq!(body["data"]["count"], 4);
    Ok(())
}

#[tokio::test]
async fn list_filters_by_division() -> Result<()> {
    let server = TestServer::start().await?;
    let (token, ids) = seed(&server).await?;
    let rec = server.state.store.get_user(ids[0]).await?.and_then(|u| u.division_id).unwrap_or_default();

    let (_, body) = server.get(&format!("{}?division={}&ordering=employee_id", USERS, rec), &token).await?;
    assert_eq!(usernames(&body["data"]), vec!["ani", "bayu"]);
    assert_eq!(body["data"]["results"][0]["division_name"], "Recruitment");
    assert_eq!(body["data"]["results"][0]["is_online"], true);
    Ok(())
}

#[tokio::test]
async fn detail_includes_division_and_permission_summaries() -> Result<()> {
    let server = TestServer::start().await?;
    let (token, ids) = seed(&server).await?;

    let (status, body) = server.get(&format!("{}{}/", USERS, ids[0]), &token).await?;
    assert_eq!(status, StatusCode::OK);
    let info = &body["data"]["division_info"];
    assert_eq!(info["hierarchy_path"], "HR Department > Recruitment");
    assert_eq!(info["employee_count"], 2);
    assert_eq!(body["data"]["permissions_summary"]["is_admin"], false);

    let (_, body) = server.get(&format!("{}{}/", USERS, ids[4]), &token).await?;
    assert_eq!(body["data"]["division_info"], Value::Null);
    let summary = &body["data"]["permissions_summary"];
    assert_eq!(summary["total_permissions"], 1);
    assert_eq!(summary["groups"][0], "HR Admin");
    assert_eq!(summary["is_admin"], true);
    assert_eq!(body["data"]["account_statistics"]["is_superuser"], true);

    // inactive and unknown users are hidden
    let (status, body) = server.get(&format!("{}{}/", USERS, ids[3]), &token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
    let (status, _) = server.get(&format!("{}424242/", USERS), &token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn statistics_summarize_head_counts() -> Result<()> {
    let server = TestServer::start().await?;
    let (token, _) = seed(&server).await?;

    let (status, body) = server.get(&format!("{}statistics/", USERS), &token).await?;
    assert_eq!(status, StatusCode::OK);
    let summary = &body["data"]["summary"];
    assert_eq!(summary["total_users"], 6);
    assert_eq!(summary["active_users"], 5);
    assert_eq!(summary["inactive_users"], 1);
    assert_eq!(summary["new_users_last_30_days"], 5);

    let top = &body["data"]["top_divisions"];
    assert_eq!(top[0]["division__name"], "Recruitment");
    assert_eq!(top[0]["count"], 2);
    assert_eq!(top[1]["division__name"], "Finance");
    assert_eq!(top[1]["count"], 1);
    Ok(())
}

#[tokio::test]
async fn activity_score_grows_with_account_age() -> Result<()> {
    let server = TestServer::start().await?;
    let (token, ids) = seed(&server).await?;

    let (status, body) = server.get(&format!("{}{}/activity/", USERS, ids[4]), &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["account_age_days"], 45);
    assert_eq!(body["data"]["activity_score"], 450);
    assert_eq!(body["data"]["status"], "active");

    let (_, body) = server.get(&format!("{}{}/activity/", USERS, ids[0]), &token).await?;
    assert_eq!(body["data"]["activity_score"], 0);
    Ok(())
}

#[tokio::test]
async fn v2_requires_authentication() -> Result<()> {
    let server = TestServer::start().await?;
    let (status, _) = server.call(Method::GET, USERS, None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

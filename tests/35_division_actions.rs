mod common;

use anyhow::Result;
use common::TestServer;
use reqwest::{Method, StatusCode};
use serde_json::json;

const DIVISIONS: &str = "/api/v1/accounts/divisions/";

/// HR > HR-REC > HR-REC-IT, plus FIN; returns (token, hr, rec, rec_it)
async fn seed(server: &TestServer) -> Result<(String, i64, i64, i64)> {
    let token = server.access_token("admin", "EMP100").await?;
    let hr = server.division("HR", "HR Department", None, 0).await?;
    let rec = server.division("HR-REC", "Recruitment", Some(hr), 1).await?;
    let rec_it = server.division("HR-REC-IT", "IT Recruitment", Some(rec), 2).await?;
    server.division("FIN", "Finance", None, 0).await?;
    Ok((token, hr, rec, rec_it))
}

#[tokio::test]
async fn tree_nests_active_divisions() -> Result<()> {
    let server = TestServer::start().await?;
    let (token, _, _, rec_it) = seed(&server).await?;
    server
        .call(Method::DELETE, &format!("{}{}/", DIVISIONS, rec_it), Some(&token), None)
        .await?;

    let (status, body) = server.get(&format!("{}tree/", DIVISIONS), &token).await?;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["count"], 2);
    // roots are ordered by code
    assert_eq!(data["tree"][0]["code"], "FIN");
    assert_eq!(data["tree"][1]["code"], "HR");
    assert_eq!(data["tree"][1]["children"][0]["code"], "HR-REC");
    assert_eq!(data["tree"][1]["children"][0]["children"].as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn children_and_ancestors() -> Result<()> {
    let server = TestServer::start().await?;
    let (token, hr, rec, rec_it) = seed(&server).await?;

    let (status, body) = server.get(&format!("{}{}/children/", DIVISIONS, hr), &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["results"][0]["id"], rec);

    let (_, body) = server.get(&format!("{}{}/ancestors/", DIVISIONS, rec_it), &token).await?;
    assert_eq!(body["data"]["count"], 2);
    assert_eq!(body["data"]["results"][0]["code"], "HR-REC");
    assert_eq!(body["data"]["results"][1]["code"], "HR");

    let (status, _) = server.get(&format!("{}999/children/", DIVISIONS), &token).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn employees_optionally_include_sub_divisions() -> Result<()> {
    let server = TestServer::start().await?;
    let (token, hr, rec, _) = seed(&server).await?;

    let a = server.register("ani", "EMP201").await?["user"]["id"].as_i64().unwrap_or_default();
    let b = server.register("bayu", "EMP202").await?["user"]["id"].as_i64().unwrap_or_default();
    let c = server.register("cahya", "EMP203").await?["user"]["id"].as_i64().unwrap_or_default();
    server.modify_user(a, |u| u.division_id = Some(hr)).await?;
    server.modify_user(b, |u| u.division_id = Some(rec)).await?;
    server
        .modify_user(c, |u| {
            u.division_id = Some(rec);
            u.is_active = false;
        })
        .await?;

    let (status, body) = server.get(&format!("{}{}/employees/", DIVISIONS, hr), &token).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["division"], "HR Department");
    assert_eq!(body["data"]["include_children"], false);
    assert_eq!(body["data"]["count"], 1);

    let (_, body) = server
        .get(&format!("{}{}/employees/?include_children=true", DIVISIONS, hr), &token)
        .await?;
    assert_eq!(body["data"]["count"], 2);
    assert_eq!(body["data"]["results"][0]["employee_id"], "EMP201");
    assert_eq!(body["data"]["results"][1]["division"], "Recruitment");

    let (_, body) = server.get(&format!("{}{}/", DIVISIONS, hr), &token).await?;
    assert_eq!(body["data"]["employee_count"], 1);
    assert_eq!(body["data"]["total_employee_count"], 2);
    Ok(())
}

async fn move_under(server: &TestServer, token: &str, id: i64, parent: i64) -> Result<(StatusCode, serde_json::Value)> {
    let path = format!("{}{}/", DIVISIONS, id);
    server.call(Method::PATCH, &path, Some(token), Some(json!({ "parent": parent }))).await
}

#[tokio::test]
async fn moves_are_checked_for_cycles_and_depth() -> Result<()> {
    let server = TestServer::start().await?;
    let (token, hr, rec, rec_it) = seed(&server).await?;

    let (status, body) = move_under(&server, &token, hr, hr).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["parent"], "A division cannot be its own parent");

    let (status, body) = move_under(&server, &token, hr, rec_it).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["parent"], "A sub-division cannot become the parent of its ancestor");

    // a chain of five levels (0..=4) is the deepest allowed
    let l3 = server.division("L3", "Level 3", Some(rec_it), 3).await?;
    let l4 = server.division("L4", "Level 4", Some(l3), 4).await?;
    let (status, body) = server
        .post(DIVISIONS, Some(&token), json!({ "code": "L5", "name": "Level 5", "parent": l4 }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["parent"], "Maximum hierarchy depth is 5 levels");

    // moving IT Recruitment up under HR re-levels its subtree
    let (status, body) = move_under(&server, &token, rec_it, hr).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["level"], 1);
    let moved = server.state.store.get_division(l4).await?.expect("exists");
    assert_eq!(moved.level, 3);
    assert_eq!(server.state.store.get_division(rec).await?.map(|d| d.level), Some(1));
    Ok(())
}

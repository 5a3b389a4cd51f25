#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::{json, Value};

use hr_admin_api::config::AppConfig;
use hr_admin_api::database::models::{NewDivision, NewUser, User};
use hr_admin_api::database::{MemoryStore, Store};
use hr_admin_api::{router, AppState};

pub const PASSWORD: &str = "Kopi-Tubruk-88";

/// One server per test: its own port, its own in-memory store
pub struct TestServer {
    pub base_url: String,
    pub client: Client,
    pub state: AppState,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        Self::start_with(AppConfig::testing()).await
    }

    pub async fn start_with(config: AppConfig) -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store)?;

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        let app = router(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let server = Self {
            base_url: format!("http://127.0.0.1:{}", port),
            client: Client::new(),
            state,
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn request(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Result<Response> {
        let mut req = self.client.request(method, self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        Ok(req.send().await?)
    }

    /// Sends the request and returns status plus JSON body (`Null` when empty)
    pub async fn call(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let resp = self.request(method, path, token, body).await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
        Ok((status, body))
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.call(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::POST, path, token, Some(body)).await
    }

    /// Registers `username` and returns the response `data`
    pub async fn register(&self, username: &str, employee_id: &str) -> Result<Value> {
        let (status, body) = self
            .post(
                "/api/v1/accounts/register/",
                None,
                json!({
                    "username": username,
                    "employee_id": employee_id,
                    "email": format!("{}@example.com", username),
                    "first_name": "Test",
                    "last_name": username,
                    "phone": "081234567890",
                    "password": PASSWORD,
                    "password_confirm": PASSWORD,
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register {} failed: {} {}", username, status, body);
        Ok(body["data"].clone())
    }

    /// Registers a user and returns their access token
    pub async fn access_token(&self, username: &str, employee_id: &str) -> Result<String> {
        let data = self.register(username, employee_id).await?;
        data["tokens"]["access"]
            .as_str()
            .map(str::to_string)
            .context("no access token in register response")
    }

    pub async fn division(&self, code: &str, name: &str, parent: Option<i64>, level: i32) -> Result<i64> {
        let division = self
            .state
            .store
            .insert_division(NewDivision {
                code: code.to_string(),
                name: name.to_string(),
                description: String::new(),
                parent_id: parent,
                level,
            })
            .await?;
        Ok(division.id)
    }

    /// Stores an employee directly, with `date_joined` in the past when given
    pub async fn employee(&self, username: &str, employee_id: &str, joined: Option<DateTime<Utc>>) -> Result<i64> {
        let user = self
            .state
            .store
            .insert_user(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                employee_id: employee_id.to_string(),
                first_name: "Test".to_string(),
                last_name: username.to_string(),
                date_joined: joined,
                ..NewUser::default()
            })
            .await?;
        Ok(user.id)
    }

    /// Applies `change` to a stored user, bypassing the API
    pub async fn modify_user(&self, id: i64, change: impl FnOnce(&mut User)) -> Result<User> {
        let mut user = self.state.store.get_user(id).await?.context("user not found")?;
        change(&mut user);
        Ok(self.state.store.update_user(&user).await?)
    }
}

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use expense_tracker::api;
use expense_tracker::auth::{generate_jwt, Claims};
use expense_tracker::config::AppConfig;
use expense_tracker::state::AppState;
use expense_tracker::store::MemoryStore;

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = TEST_SECRET.to_string();
    config
}

/// Application router over a fresh in-memory store
pub fn test_app() -> Router {
    api::app(AppState::new(Arc::new(MemoryStore::new()), test_config()))
}

pub fn token_for(user: Uuid) -> String {
    generate_jwt(&Claims::new(user, 1).expect("failed to build test claims"), TEST_SECRET).expect("failed to sign test token")
}

/// Send one request through the router; returns the status and the parsed body
/// (`Value::Null` for an empty body)
pub async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(raw) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(raw.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("failed to build request");

    let response = app.clone().oneshot(request).await.expect("router call failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is not JSON")
    };
    (status, json)
}

pub async fn create_expense(app: &Router, token: &str, title: &str, category: &str, value: f64) -> Value {
    let body = serde_json::json!({ "title": title, "category": category, "value": value }).to_string();
    let (status, json) = send(app, Method::POST, "/api/expenses", Some(token), Some(&body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", json);
    json["data"].clone()
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
}

impl TestServer {
    /// Serve the app on an unused port inside the current test runtime
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, test_app()).await;
        });

        let server = Self { port, base_url };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

#![allow(dead_code)]

use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use supermart_api::config::AppConfig;
use supermart_api::database::models::{Tenant, User};
use supermart_api::services::SignupRequest;
use supermart_api::{app, AppState};

pub const BASE_DOMAIN: &str = "example.com";
pub const PASSWORD: &str = "Secret123";

/// Development config served on `example.com`.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.api.base_domain = BASE_DOMAIN.to_string();
    config
}

/// Router over a fresh in-memory store, driven request by request.
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub raw: String,
}

impl TestResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

impl TestApp {
    pub fn new() -> Result<Self> {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Result<Self> {
        let state = AppState::in_memory(config).context("failed to build app state")?;
        let router = app(state.clone());
        Ok(Self { state, router })
    }

    pub fn tenant_host(schema: &str) -> String {
        format!("{}.{}", schema, BASE_DOMAIN)
    }

    pub async fn request(
        &self,
        method: Method,
        host: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<TestResponse> {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(header::HOST, host);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let raw = String::from_utf8_lossy(&bytes).into_owned();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        Ok(TestResponse { status, body, raw })
    }

    pub async fn get(&self, host: &str, path: &str, token: Option<&str>) -> Result<TestResponse> {
        self.request(Method::GET, host, path, token, None).await
    }

    pub async fn post(&self, host: &str, path: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.request(Method::POST, host, path, token, Some(body)).await
    }

    pub async fn patch(&self, host: &str, path: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.request(Method::PATCH, host, path, token, Some(body)).await
    }

    /// Provision a tenant whose schema is `schema`, owned by `username`.
    pub async fn seed_tenant(&self, schema: &str, username: &str) -> Result<(Tenant, User)> {
        let request = SignupRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: format!("{}@{}.test", username, schema),
            username: username.into(),
            password: PASSWORD.into(),
            company_name: format!("{} Ltd", schema),
            company_size: "1-10".into(),
            phone_number: "+254700000000".into(),
            schema_name: Some(schema.into()),
        };
        Ok(self.state.tenants.signup(request).await?)
    }

    pub async fn seed_superuser(&self, username: &str) -> Result<User> {
        let email = format!("{}@{}", username, BASE_DOMAIN);
        Ok(self.state.tenants.create_superuser(username, &email, PASSWORD).await?)
    }

    /// Log in on `host` and return the whole `data` object.
    pub async fn login(&self, host: &str, username: &str) -> Result<Value> {
        let response = self
            .post(host, "/api/auth/login", None, json!({ "username": username, "password": PASSWORD }))
            .await?;
        anyhow::ensure!(
            response.status == StatusCode::OK,
            "login for {} on {} failed: {} {}",
            username,
            host,
            response.status,
            response.raw
        );
        Ok(response.data().clone())
    }

    pub async fn access_token(&self, host: &str, username: &str) -> Result<String> {
        let data = self.login(host, username).await?;
        data["access"]
            .as_str()
            .map(str::to_string)
            .context("login response has no access token")
    }
}

/// Serve the router on a loopback port for tests that go over real HTTP.
pub async fn spawn_server(state: AppState) -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, app(state)).await;
    });

    Ok(format!("http://{}", addr))
}

use anyhow::Result;
use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;

use supermart_api::auth::TokenCodec;

mod common;
use common::{TestApp, BASE_DOMAIN, PASSWORD};

#[tokio::test]
async fn login_returns_pair_and_profile() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_tenant("acme", "ada").await?;

    let data = app.login(&TestApp::tenant_host("acme"), "ada").await?;
    assert!(data["access"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(data["refresh"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(data["expires_in"], json!(3600));
    assert_eq!(data["user"]["username"], "ada");
    assert!(data["user"].get("password_hash").is_none());
    Ok(())
}

#[tokio::test]
async fn login_accepts_email() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_tenant("acme", "ada").await?;

    let response = app
        .post(
            BASE_DOMAIN,
            "/api/auth/login",
            None,
            json!({ "email": "ada@acme.test", "password": PASSWORD }),
        )
        .await?;
    assert_eq!(response.status, StatusCode::OK, "{}", response.raw);
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_tenant("acme", "ada").await?;
    let host = TestApp::tenant_host("acme");

    let wrong_password = app
        .post(&host, "/api/auth/login", None, json!({ "username": "ada", "password": "Wrong1234" }))
        .await?;
    let unknown_user = app
        .post(&host, "/api/auth/login", None, json!({ "username": "nobody", "password": PASSWORD }))
        .await?;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.raw, unknown_user.raw);
    assert_eq!(wrong_password.body["success"], json!(false));
    Ok(())
}

#[tokio::test]
async fn login_on_a_foreign_tenant_host_fails() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_tenant("acme", "ada").await?;
    app.seed_tenant("other", "bob").await?;

    let response = app
        .post(
            &TestApp::tenant_host("other"),
            "/api/auth/login",
            None,
            json!({ "username": "ada", "password": PASSWORD }),
        )
        .await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn protected_route_requires_bearer_token() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_tenant("acme", "ada").await?;
    let host = TestApp::tenant_host("acme");

    let missing = app.get(&host, "/api/auth/whoami", None).await?;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let garbage = app.get(&host, "/api/auth/whoami", Some("not-a-jwt")).await?;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.raw, garbage.raw);
    Ok(())
}

#[tokio::test]
async fn refresh_token_is_not_an_access_token() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_tenant("acme", "ada").await?;
    let host = TestApp::tenant_host("acme");

    let data = app.login(&host, "ada").await?;
    let refresh = data["refresh"].as_str().unwrap_or_default();

    let response = app.get(&host, "/api/auth/whoami", Some(refresh)).await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn expired_and_forged_tokens_are_rejected() -> Result<()> {
    let app = TestApp::new()?;
    let (tenant, owner) = app.seed_tenant("acme", "ada").await?;
    let host = TestApp::tenant_host("acme");
    let security = &app.state.config.security;

    let expired = TokenCodec::new(
        security.jwt_secret.as_bytes(),
        security.jwt_issuer.clone(),
        Duration::minutes(-5),
        Duration::days(1),
    )?
    .issue_pair(&owner, Some(&tenant.schema_name))?;
    let response = app.get(&host, "/api/auth/whoami", Some(&expired.access)).await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let forged = TokenCodec::new(
        b"some-other-secret-some-other-secret",
        security.jwt_issuer.clone(),
        Duration::minutes(5),
        Duration::days(1),
    )?
    .issue_pair(&owner, Some(&tenant.schema_name))?;
    let response = app.get(&host, "/api/auth/whoami", Some(&forged.access)).await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn refresh_keeps_the_tenant_claim() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_tenant("acme", "ada").await?;
    app.seed_tenant("other", "bob").await?;
    let host = TestApp::tenant_host("acme");

    let data = app.login(&host, "ada").await?;
    let response = app
        .post(&host, "/api/auth/refresh", None, json!({ "refresh": data["refresh"] }))
        .await?;
    assert_eq!(response.status, StatusCode::OK, "{}", response.raw);
    let access = response.data()["access"].as_str().unwrap_or_default().to_string();

    let whoami = app.get(&host, "/api/auth/whoami", Some(&access)).await?;
    assert_eq!(whoami.status, StatusCode::OK);
    assert_eq!(whoami.data()["token"]["schema"], "acme");

    let elsewhere = app
        .get(&TestApp::tenant_host("other"), "/api/auth/whoami", Some(&access))
        .await?;
    assert_eq!(elsewhere.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn refresh_on_a_foreign_host_fails() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_tenant("acme", "ada").await?;
    app.seed_tenant("other", "bob").await?;

    let data = app.login(&TestApp::tenant_host("acme"), "ada").await?;
    let response = app
        .post(
            &TestApp::tenant_host("other"),
            "/api/auth/refresh",
            None,
            json!({ "refresh": data["refresh"] }),
        )
        .await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn logout_revokes_the_refresh_token() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_tenant("acme", "ada").await?;
    let host = TestApp::tenant_host("acme");

    let data = app.login(&host, "ada").await?;
    let refresh = data["refresh"].clone();

    let response = app
        .post(&host, "/api/auth/logout", None, json!({ "refresh_token": refresh }))
        .await?;
    assert_eq!(response.status, StatusCode::OK, "{}", response.raw);
    assert_eq!(response.data()["message"], "Successfully logged out.");

    let response = app
        .post(&host, "/api/auth/refresh", None, json!({ "refresh": refresh }))
        .await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // Access tokens already issued stay valid until they expire
    let access = data["access"].as_str().unwrap_or_default();
    let whoami = app.get(&host, "/api/auth/whoami", Some(access)).await?;
    assert_eq!(whoami.status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn logout_with_an_unusable_token_is_a_bad_request() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_tenant("acme", "ada").await?;
    let host = TestApp::tenant_host("acme");

    let response = app
        .post(&host, "/api/auth/logout", None, json!({ "refresh_token": "garbage" }))
        .await?;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let data = app.login(&host, "ada").await?;
    let response = app
        .post(&host, "/api/auth/logout", None, json!({ "refresh_token": data["access"] }))
        .await?;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    Ok(())
}

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

mod common;
use common::{TestApp, BASE_DOMAIN};

#[tokio::test]
async fn tenant_token_is_served_only_by_its_own_schema() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_tenant("acme", "ada").await?;
    app.seed_tenant("other", "bob").await?;
    let acme = TestApp::tenant_host("acme");
    let other = TestApp::tenant_host("other");

    let token = app.access_token(&acme, "ada").await?;

    let home = app.get(&acme, "/api/auth/whoami", Some(&token)).await?;
    assert_eq!(home.status, StatusCode::OK, "{}", home.raw);
    assert_eq!(home.data()["schema"], "acme");
    assert_eq!(home.data()["token"], json!({ "scope": "tenant", "schema": "acme" }));

    let away = app.get(&other, "/api/auth/whoami", Some(&token)).await?;
    assert_eq!(away.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn mismatch_does_not_reveal_either_schema() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_tenant("acme", "ada").await?;
    app.seed_tenant("other", "bob").await?;

    let token = app.access_token(&TestApp::tenant_host("acme"), "ada").await?;
    let response = app
        .get(&TestApp::tenant_host("other"), "/api/auth/whoami", Some(&token))
        .await?;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(!response.raw.contains("acme"), "{}", response.raw);
    assert!(!response.raw.contains("other"), "{}", response.raw);

    // Same body as a request with no credentials at all
    let anonymous = app
        .get(&TestApp::tenant_host("other"), "/api/auth/whoami", None)
        .await?;
    assert_eq!(response.raw, anonymous.raw);
    Ok(())
}

#[tokio::test]
async fn tenant_token_is_refused_on_the_platform_host() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_tenant("acme", "ada").await?;

    let token = app.access_token(&TestApp::tenant_host("acme"), "ada").await?;
    let response = app.get(BASE_DOMAIN, "/api/auth/whoami", Some(&token)).await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn reassignment_does_not_move_issued_tokens() -> Result<()> {
    let app = TestApp::new()?;
    let (_, ada) = app.seed_tenant("acme", "ada").await?;
    let (other_tenant, _) = app.seed_tenant("other", "bob").await?;
    let acme = TestApp::tenant_host("acme");
    let other = TestApp::tenant_host("other");

    let old_token = app.access_token(&acme, "ada").await?;
    app.state.tenants.reassign_user(ada.id, Some(other_tenant.id)).await?;

    let response = app.get(&other, "/api/auth/whoami", Some(&old_token)).await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // Nor does the old tenant keep serving a user who left it
    let response = app.get(&acme, "/api/auth/whoami", Some(&old_token)).await?;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let new_token = app.access_token(&other, "ada").await?;
    let response = app.get(&other, "/api/auth/whoami", Some(&new_token)).await?;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.data()["token"]["schema"], "other");
    Ok(())
}

#[tokio::test]
async fn platform_token_is_accepted_on_every_host() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_tenant("acme", "ada").await?;
    app.seed_tenant("other", "bob").await?;
    app.seed_superuser("root").await?;

    let token = app.access_token(BASE_DOMAIN, "root").await?;

    for host in [
        BASE_DOMAIN.to_string(),
        TestApp::tenant_host("acme"),
        TestApp::tenant_host("other"),
    ] {
        let response = app.get(&host, "/api/auth/whoami", Some(&token)).await?;
        assert_eq!(response.status, StatusCode::OK, "{}: {}", host, response.raw);
        assert_eq!(response.data()["token"], json!({ "scope": "platform" }));
    }

    let response = app
        .get(&TestApp::tenant_host("acme"), "/api/auth/whoami", Some(&token))
        .await?;
    assert_eq!(response.data()["schema"], "acme");
    assert_eq!(response.data()["tenant"]["schema_name"], "acme");
    Ok(())
}

#[tokio::test]
async fn unknown_host_is_not_found() -> Result<()> {
    let app = TestApp::new()?;
    let response = app
        .post(
            "nowhere.example.com",
            "/api/auth/login",
            None,
            json!({ "username": "ada", "password": "Secret123" }),
        )
        .await?;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn inactive_tenant_host_is_forbidden() -> Result<()> {
    let app = TestApp::new()?;
    let (tenant, _) = app.seed_tenant("acme", "ada").await?;
    let acme = TestApp::tenant_host("acme");
    let token = app.access_token(&acme, "ada").await?;

    app.state
        .tenants
        .update_tenant(
            tenant.id,
            serde_json::from_value(json!({ "is_active": false }))?,
        )
        .await?;

    let response = app.get(&acme, "/api/auth/whoami", Some(&token)).await?;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn host_port_is_ignored() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_tenant("acme", "ada").await?;

    let host = format!("{}:8000", TestApp::tenant_host("acme"));
    let token = app.access_token(&host, "ada").await?;
    let response = app.get(&host, "/api/auth/whoami", Some(&token)).await?;
    assert_eq!(response.status, StatusCode::OK);
    Ok(())
}

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};
use supermart_api::services::RegisterUserRequest;

mod common;
use common::{test_config, TestApp, BASE_DOMAIN, PASSWORD};

fn signup_body(company: &str, username: &str) -> Value {
    json!({
        "first_name": "Grace",
        "last_name": "Hopper",
        "email": format!("{}@acme.test", username),
        "username": username,
        "password": PASSWORD,
        "company_name": company,
        "company_size": "11-50",
        "phone_number": "+254711000000"
    })
}

#[tokio::test]
async fn signup_creates_a_resolvable_tenant() -> Result<()> {
    let app = TestApp::new()?;

    let response = app
        .post(BASE_DOMAIN, "/api/auth/signup", None, signup_body("Acme Foods", "grace"))
        .await?;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.raw);

    let data = response.data();
    assert_eq!(data["tenant"]["schema_name"], "acme_foods");
    assert_eq!(data["tenant"]["is_active"], json!(true));
    assert_eq!(data["tenant"]["on_trial"], json!(true));
    assert_eq!(data["domain"], "acme-foods.example.com");
    assert_eq!(data["user"]["username"], "grace");
    assert_eq!(data["user"]["company_size"], "11-50");
    assert_eq!(data["user"]["tenant_id"], data["tenant"]["id"]);

    let host = data["domain"].as_str().unwrap_or_default().to_string();
    let token = app.access_token(&host, "grace").await?;
    let whoami = app.get(&host, "/api/auth/whoami", Some(&token)).await?;
    assert_eq!(whoami.status, StatusCode::OK);
    assert_eq!(whoami.data()["token"]["schema"], "acme_foods");
    Ok(())
}

#[tokio::test]
async fn signup_honours_an_explicit_schema_name() -> Result<()> {
    let app = TestApp::new()?;

    let mut body = signup_body("Acme Foods", "grace");
    body["schema_name"] = json!("acme");
    let response = app.post(BASE_DOMAIN, "/api/auth/signup", None, body).await?;

    assert_eq!(response.status, StatusCode::CREATED, "{}", response.raw);
    assert_eq!(response.data()["domain"], "acme.example.com");
    Ok(())
}

#[tokio::test]
async fn duplicate_signup_conflicts() -> Result<()> {
    let app = TestApp::new()?;

    let first = app
        .post(BASE_DOMAIN, "/api/auth/signup", None, signup_body("Acme Foods", "grace"))
        .await?;
    assert_eq!(first.status, StatusCode::CREATED);

    let second = app
        .post(BASE_DOMAIN, "/api/auth/signup", None, signup_body("Acme Foods", "linus"))
        .await?;
    assert_eq!(second.status, StatusCode::CONFLICT);
    assert_eq!(second.body["code"], "CONFLICT");
    Ok(())
}

#[tokio::test]
async fn signup_reports_every_invalid_field() -> Result<()> {
    let app = TestApp::new()?;

    let mut body = signup_body("Acme Foods", "grace");
    body["email"] = json!("not-an-email");
    body["password"] = json!("short");
    body["company_size"] = json!("huge");
    body["schema_name"] = json!("public");
    let response = app.post(BASE_DOMAIN, "/api/auth/signup", None, body).await?;

    assert_eq!(response.status, StatusCode::BAD_REQUEST, "{}", response.raw);
    assert_eq!(response.body["code"], "VALIDATION_ERROR");
    let fields = &response.body["field_errors"];
    for field in ["email", "password", "company_size", "schema_name"] {
        assert!(fields.get(field).is_some(), "missing {} in {}", field, fields);
    }
    assert!(fields.get("username").is_none());
    Ok(())
}

#[tokio::test]
async fn signup_is_refused_on_tenant_hosts() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_tenant("acme", "ada").await?;

    let response = app
        .post(&TestApp::tenant_host("acme"), "/api/auth/signup", None, signup_body("Globex", "hank"))
        .await?;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn signup_can_be_disabled() -> Result<()> {
    let mut config = test_config();
    config.security.allow_signup = false;
    let app = TestApp::with_config(config)?;

    let response = app
        .post(BASE_DOMAIN, "/api/auth/signup", None, signup_body("Acme Foods", "grace"))
        .await?;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn owner_registers_users_up_to_the_limit() -> Result<()> {
    let app = TestApp::new()?;
    let (tenant, _) = app.seed_tenant("acme", "ada").await?;
    let host = TestApp::tenant_host("acme");
    let token = app.access_token(&host, "ada").await?;

    app.state
        .tenants
        .update_tenant(tenant.id, serde_json::from_value(json!({ "max_users": 2 }))?)
        .await?;

    let response = app
        .post(
            &host,
            "/api/auth/users",
            Some(&token),
            json!({ "username": "clerk", "email": "clerk@acme.test", "password": PASSWORD }),
        )
        .await?;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.raw);
    assert_eq!(response.data()["tenant_id"], json!(tenant.id));

    // The new user lands in the owner's tenant
    let clerk = app.access_token(&host, "clerk").await?;
    let whoami = app.get(&host, "/api/auth/whoami", Some(&clerk)).await?;
    assert_eq!(whoami.data()["token"]["schema"], "acme");

    let response = app
        .post(
            &host,
            "/api/auth/users",
            Some(&token),
            json!({ "username": "intern", "email": "intern@acme.test", "password": PASSWORD }),
        )
        .await?;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn only_the_owner_registers_users() -> Result<()> {
    let app = TestApp::new()?;
    app.seed_tenant("acme", "ada").await?;
    let host = TestApp::tenant_host("acme");
    let owner = app.access_token(&host, "ada").await?;

    let response = app
        .post(
            &host,
            "/api/auth/users",
            Some(&owner),
            json!({ "username": "clerk", "email": "clerk@acme.test", "password": PASSWORD }),
        )
        .await?;
    assert_eq!(response.status, StatusCode::CREATED);

    let clerk = app.access_token(&host, "clerk").await?;
    let response = app
        .post(
            &host,
            "/api/auth/users",
            Some(&clerk),
            json!({ "username": "intern", "email": "intern@acme.test", "password": PASSWORD }),
        )
        .await?;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_respect_the_limit() -> Result<()> {
    let app = TestApp::new()?;
    let (tenant, owner) = app.seed_tenant("acme", "ada").await?;
    let tenant = app
        .state
        .tenants
        .update_tenant(tenant.id, serde_json::from_value(json!({ "max_users": 2 }))?)
        .await?;

    let mut handles = Vec::new();
    for i in 0..4 {
        let service = app.state.tenants.clone();
        let tenant = tenant.clone();
        let owner = owner.clone();
        let request: RegisterUserRequest = serde_json::from_value(json!({
            "username": format!("clerk{}", i),
            "email": format!("clerk{}@acme.test", i),
            "password": PASSWORD
        }))?;
        handles.push(tokio::spawn(async move {
            service.register_user(&tenant, &owner, request).await
        }));
    }

    let mut created = 0;
    for handle in handles {
        if handle.await?.is_ok() {
            created += 1;
        }
    }
    // The owner already holds one of the two seats
    assert_eq!(created, 1);
    Ok(())
}

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json},
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{AuthError, TokenCodec};
use crate::config::{AppConfig, Environment};
use crate::database::memory::MemoryStore;
use crate::database::repository::{TenantRepository, TokenBlacklist, UserRepository};
use crate::handlers;
use crate::middleware::{jwt_auth_middleware, root_access_middleware, validate_tenant_middleware};
use crate::services::{AuthService, TenantService};

/// Shared handles cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
    pub tenants: Arc<TenantService>,
    pub tenant_repo: Arc<dyn TenantRepository>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        tenant_repo: Arc<dyn TenantRepository>,
        users: Arc<dyn UserRepository>,
        blacklist: Arc<dyn TokenBlacklist>,
    ) -> Result<Self, AuthError> {
        let codec = Arc::new(TokenCodec::from_config(&config.security)?);
        let auth = AuthService::new(codec, tenant_repo.clone(), users.clone(), blacklist);
        let tenants = Arc::new(TenantService::new(tenant_repo.clone(), users, config.api.base_domain.clone()));
        Ok(Self {
            config: Arc::new(config),
            auth,
            tenants,
            tenant_repo,
        })
    }

    /// State backed by a fresh process-local store.
    pub fn in_memory(config: AppConfig) -> Result<Self, AuthError> {
        let store = MemoryStore::new();
        Self::new(
            config,
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store),
        )
    }
}

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(auth_public_routes())
        .merge(auth_routes(state.clone()))
        .merge(root_routes(state.clone()))
        // Every /api request is bound to a schema before anything else runs
        .layer(from_fn_with_state(state.clone(), validate_tenant_middleware));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(api)
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/api/auth/signup", post(auth::signup_post))
        .route("/api/auth/login", post(auth::login_post))
        .route("/api/auth/refresh", post(auth::refresh_post))
        .route("/api/auth/logout", post(auth::logout_post))
}

fn auth_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::auth;

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami_get))
        .route("/api/auth/users", post(auth::users_post))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn root_routes(state: AppState) -> Router<AppState> {
    use handlers::elevated::root;

    Router::new()
        .route("/api/root/tenants", get(root::tenant_list))
        .route("/api/root/tenants/:id", get(root::tenant_show).patch(root::tenant_update))
        .route("/api/root/users/:id/tenant", patch(root::user_tenant_update))
        // Layers run bottom-up: JWT first, then the root check
        .route_layer(from_fn(root_access_middleware))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }
    if config.environment == Environment::Development {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Supermart API",
            "version": version,
            "description": "Multi-tenant ERP backend with tenant-scoped authentication",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/api/auth/signup, /api/auth/login, /api/auth/refresh, /api/auth/logout (public - token acquisition)",
                "auth": "/api/auth/whoami, /api/auth/users (protected)",
                "root": "/api/root/* (restricted, platform superusers on the platform host)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.tenant_repo.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}

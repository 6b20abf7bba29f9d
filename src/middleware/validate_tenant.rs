use axum::{
    extract::{Request, State},
    http::{header::HOST, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::app::AppState;
use crate::database::models::Tenant;
use crate::error::ApiError;
use crate::types::SchemaName;

/// Schema a request is bound to, resolved from its host before any
/// authentication runs. Read-only for everything downstream.
#[derive(Clone, Debug, Serialize)]
pub struct TenantContext {
    pub schema: SchemaName,
    /// `None` on the platform host
    #[serde(skip)]
    pub tenant: Option<Tenant>,
}

impl TenantContext {
    /// Platform host bound to `public`.
    pub fn public() -> Self {
        Self {
            schema: SchemaName::public(),
            tenant: None,
        }
    }

    pub fn for_tenant(tenant: Tenant) -> Self {
        Self {
            schema: tenant.schema_name.clone(),
            tenant: Some(tenant),
        }
    }

    pub fn is_platform(&self) -> bool {
        self.tenant.is_none()
    }
}

/// Host without port, lowercased.
pub fn request_host(request: &Request) -> Option<String> {
    let raw = request
        .uri()
        .host()
        .map(str::to_string)
        .or_else(|| header_host(request.headers()))?;
    Some(strip_port(&raw).to_ascii_lowercase())
}

fn header_host(headers: &HeaderMap) -> Option<String> {
    headers.get(HOST)?.to_str().ok().map(str::to_string)
}

fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        // [::1]:8000
        return rest.split(']').next().unwrap_or(rest);
    }
    host.rsplit_once(':').map(|(h, _)| h).unwrap_or(host)
}

fn is_platform_host(host: &str, base_domain: &str) -> bool {
    host == base_domain || matches!(host, "localhost" | "127.0.0.1" | "::1")
}

/// Binds each request to a schema by its host and injects a `TenantContext`.
///
/// The base domain and loopback hosts bind `public`; any other host must be
/// a registered domain of an active tenant whose schema exists.
pub async fn validate_tenant_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let host = request_host(&request).ok_or_else(|| ApiError::bad_request("Missing Host header"))?;

    let context = if is_platform_host(&host, &state.config.api.base_domain) {
        TenantContext::public()
    } else {
        let tenant = state.tenant_repo.tenant_by_domain(&host).await?.ok_or_else(|| {
            tracing::warn!("No tenant routed for host '{}'", host);
            ApiError::not_found("Tenant not found")
        })?;

        if !tenant.is_active {
            tracing::warn!("Tenant {} is inactive", tenant.schema_name);
            return Err(ApiError::forbidden("Tenant is not active"));
        }
        if !state.tenant_repo.schema_ready(&tenant.schema_name).await? {
            tracing::error!("Schema {} is not addressable", tenant.schema_name);
            return Err(ApiError::service_unavailable("Tenant is not available"));
        }
        TenantContext::for_tenant(tenant)
    };

    tracing::debug!("Host {} bound to schema {}", host, context.schema);
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}

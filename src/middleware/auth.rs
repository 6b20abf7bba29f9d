use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{Claims, TenantScope};
use crate::database::models::User;
use crate::error::ApiError;

use super::validate_tenant::TenantContext;

/// Authenticated user context extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user: User,
    pub scope: TenantScope,
    pub claims: Claims,
}

/// JWT authentication middleware: verifies the token, runs the tenant guard
/// against the bound schema and loads the user.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_jwt_from_headers(&headers).map_err(|msg| {
        tracing::warn!("Rejected request: {}", msg);
        ApiError::authentication_failed()
    })?;

    let context = request
        .extensions()
        .get::<TenantContext>()
        .cloned()
        .ok_or_else(|| ApiError::internal_server_error("Tenant resolution required before authentication"))?;

    let auth_user = state.auth.authenticate(&token, &context).await?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Extract JWT token from Authorization header
pub fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty JWT token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

use axum::{extract::Request, middleware::Next, response::Response};

use crate::error::ApiError;

use super::auth::AuthUser;
use super::validate_tenant::TenantContext;

/// Gate for `/api/root/*`: a superuser holding a platform-scoped token on the
/// platform host. Runs after `jwt_auth_middleware`.
pub async fn root_access_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or_else(ApiError::authentication_failed)?;

    let on_platform = request
        .extensions()
        .get::<TenantContext>()
        .map(TenantContext::is_platform)
        .unwrap_or(false);

    if !auth_user.user.is_superuser || !auth_user.scope.is_platform() || !on_platform {
        tracing::warn!("Root access denied for user {}", auth_user.user.id);
        return Err(ApiError::forbidden("Root access required"));
    }

    Ok(next.run(request).await)
}

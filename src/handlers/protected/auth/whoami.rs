// handlers/protected/auth/whoami.rs - GET /api/auth/whoami handler

use axum::Extension;
use serde::Serialize;

use crate::auth::TenantScope;
use crate::database::models::{Tenant, UserProfile};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantContext};
use crate::types::SchemaName;

#[derive(Debug, Serialize)]
pub struct WhoamiResponse {
    pub user: UserProfile,
    /// Schema this request was served against
    pub schema: SchemaName,
    pub token: TenantScope,
    pub tenant: Option<Tenant>,
}

/// GET /api/auth/whoami - Current user and the schema the request is bound to
pub async fn whoami_get(
    Extension(auth_user): Extension<AuthUser>,
    Extension(context): Extension<TenantContext>,
) -> ApiResult<WhoamiResponse> {
    Ok(ApiResponse::success(WhoamiResponse {
        user: UserProfile::from(&auth_user.user),
        schema: context.schema,
        token: auth_user.scope,
        tenant: context.tenant,
    }))
}

// handlers/protected/auth/users.rs - POST /api/auth/users handler

use axum::{extract::State, Extension, Json};

use crate::app::AppState;
use crate::database::models::UserProfile;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, TenantContext};
use crate::services::RegisterUserRequest;

/// POST /api/auth/users - Tenant owner adds a user to the bound tenant
///
/// Fails with 403 for non-owners and once the tenant reaches `max_users`.
pub async fn users_post(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Extension(context): Extension<TenantContext>,
    Json(request): Json<RegisterUserRequest>,
) -> ApiResult<UserProfile> {
    let tenant = context
        .tenant
        .as_ref()
        .ok_or_else(|| ApiError::bad_request("Users are registered on a tenant domain"))?;

    let user = state
        .tenants
        .register_user(tenant, &auth_user.user, request)
        .await?;

    Ok(ApiResponse::created(UserProfile::from(&user)))
}

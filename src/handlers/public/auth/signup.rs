// handlers/public/auth/signup.rs - POST /api/auth/signup handler

use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::app::AppState;
use crate::database::models::{Tenant, UserProfile};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, TenantContext};
use crate::services::{SignupRequest, TenantError};

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub tenant: Tenant,
    pub domain: String,
    pub user: UserProfile,
}

/// POST /api/auth/signup - Register a company and its owner
///
/// Input:
/// ```json
/// {
///   "first_name": "Ada", "last_name": "Lovelace",
///   "email": "ada@acme.com", "username": "ada", "password": "Secret123",
///   "company_name": "Acme Foods", "company_size": "1-10",
///   "phone_number": "+254700000000",
///   "schema_name": "acme"            // optional, defaults to a slug of company_name
/// }
/// ```
///
/// Only served on the platform host. Returns 201 with the tenant, its
/// primary domain and the owner.
pub async fn signup_post(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    Json(request): Json<SignupRequest>,
) -> ApiResult<SignupResponse> {
    if !state.config.security.allow_signup {
        return Err(TenantError::SignupDisabled.into());
    }
    if !context.is_platform() {
        return Err(ApiError::forbidden("Signup is only available on the platform domain"));
    }

    let (tenant, owner) = state.tenants.signup(request).await?;
    let domain = state.tenants.domain_for(&tenant.schema_name);

    Ok(ApiResponse::created(SignupResponse {
        user: UserProfile::from(&owner),
        domain,
        tenant,
    }))
}

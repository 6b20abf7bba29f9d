// handlers/elevated/root/user.rs - PATCH /api/root/users/:id/tenant handler

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::UserProfile;
use crate::middleware::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct TenantAssignment {
    pub tenant_id: Option<Uuid>,
}

/// PATCH /api/root/users/:id/tenant - Move a user to another tenant
///
/// Tokens issued before the move keep their original tenant claim.
pub async fn user_tenant_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(assignment): Json<TenantAssignment>,
) -> ApiResult<UserProfile> {
    let user = state.tenants.reassign_user(id, assignment.tenant_id).await?;
    Ok(ApiResponse::success(UserProfile::from(&user)))
}

// handlers/elevated/root/tenant/update.rs - PATCH /api/root/tenants/:id handler

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::database::models::{Tenant, TenantUpdate};
use crate::middleware::{ApiResponse, ApiResult};

/// PATCH /api/root/tenants/:id - Activation, trial and billing fields
///
/// `schema_name` is not updatable; a tenant's schema is fixed at signup.
pub async fn tenant_update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<TenantUpdate>,
) -> ApiResult<Tenant> {
    Ok(ApiResponse::success(state.tenants.update_tenant(id, update).await?))
}

// handlers/elevated/root/tenant/list.rs - GET /api/root/tenants handler

use axum::extract::State;

use crate::app::AppState;
use crate::database::models::Tenant;
use crate::middleware::{ApiResponse, ApiResult};

pub async fn tenant_list(State(state): State<AppState>) -> ApiResult<Vec<Tenant>> {
    Ok(ApiResponse::success(state.tenants.list_tenants().await?))
}

// handlers/public/auth/refresh.rs - POST /api/auth/refresh handler

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, TenantContext};

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
    pub expires_in: i64,
}

/// POST /api/auth/refresh - Trade a refresh token for a new access token
///
/// The refresh token goes through the same tenant guard as an access token;
/// the new access token carries the refresh token's tenant claim unchanged.
pub async fn refresh_post(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    Json(request): Json<RefreshRequest>,
) -> ApiResult<RefreshResponse> {
    let access = state.auth.refresh(&request.refresh, &context).await?;

    Ok(ApiResponse::success(RefreshResponse {
        access,
        expires_in: state.auth.codec().access_ttl().num_seconds(),
    }))
}

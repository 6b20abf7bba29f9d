// handlers/public/auth/logout.rs - POST /api/auth/logout handler

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::SessionError;

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    #[serde(alias = "refresh")]
    pub refresh_token: String,
}

/// POST /api/auth/logout - Blacklist a refresh token
///
/// A token that does not decode as a valid refresh token is a 400.
pub async fn logout_post(
    State(state): State<AppState>,
    Json(request): Json<LogoutRequest>,
) -> ApiResult<Value> {
    match state.auth.logout(&request.refresh_token).await {
        Ok(_) => Ok(ApiResponse::success(json!({
            "message": "Successfully logged out."
        }))),
        Err(SessionError::Auth(e)) => {
            tracing::warn!("Logout with unusable token: {}", e);
            Err(ApiError::bad_request("Invalid or expired refresh token"))
        }
        Err(e) => Err(e.into()),
    }
}

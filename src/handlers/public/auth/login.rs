// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::auth::TokenPair;
use crate::database::models::UserProfile;
use crate::middleware::{ApiResponse, ApiResult, TenantContext};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    #[serde(alias = "email")]
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: UserProfile,
}

/// POST /api/auth/login - Exchange credentials for an access/refresh pair
///
/// Input:
/// ```json
/// { "username": "ada", "password": "Secret123" }
/// ```
///
/// Output:
/// ```json
/// {
///   "success": true,
///   "data": {
///     "access": "eyJ...",
///     "refresh": "eyJ...",
///     "expires_in": 3600,
///     "user": { "id": "...", "username": "ada", ... }
///   }
/// }
/// ```
///
/// Both tokens carry the user's tenant schema at the moment of login. Every
/// credential failure returns the same 401 body.
pub async fn login_post(
    State(state): State<AppState>,
    Extension(context): Extension<TenantContext>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let (tokens, user) = state
        .auth
        .login(&request.username, &request.password, &context)
        .await?;

    Ok(ApiResponse::success(LoginResponse {
        tokens,
        user: UserProfile::from(&user),
    }))
}

//! Authentication handlers.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use super::AppState;
use crate::auth::{self, RegistrationRequest};
use crate::db::UserRepository;
use crate::web::dto::{
    ApiResponse, LoginRequest, RegisterRequest, TokenResponse, UserResponse, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::middleware::AuthUser;

/// POST /api/auth/register - Create a regular account.
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    let request = RegistrationRequest::new(req.username, req.email, req.password);
    let user = auth::register(state.db.pool(), request).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::new(user.into()))))
}

/// POST /api/auth/login - Exchange credentials for an access token.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenResponse>>, ApiError> {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let user = auth::authenticate(state.db.pool(), &req.username, &req.password).await?;
    let access_token = state.generate_access_token(&user)?;

    tracing::info!(user_id = user.id, username = %user.username, "User logged in");

    Ok(Json(ApiResponse::new(TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in: state.access_token_expiry,
        user: user.into(),
    })))
}

/// GET /api/auth/me - Current user.
pub async fn me(
    State(state): State<Arc<AppState>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = UserRepository::new(state.db.pool())
        .get_by_id(claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    Ok(Json(ApiResponse::new(user.into())))
}

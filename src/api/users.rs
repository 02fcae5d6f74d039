use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, UserDto};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,

    /// Role names for the new account; defaults to USER when omitted.
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Deserialize)]
pub struct PasswordQuery {
    pub password: String,
}

#[derive(Deserialize)]
pub struct ResetQuery {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    pub username: String,

    #[serde(alias = "pass")]
    pub password: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api
/// Public greeting
pub async fn home() -> &'static str {
    "Hello World!"
}

/// GET /users
/// All accounts; reachable only by ADMIN callers (policy gate)
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<UserDto>>>, ApiError> {
    let users = state.accounts().list_all().await?;

    Ok(Json(ApiResponse::success(
        users.into_iter().map(UserDto::from).collect(),
    )))
}

/// POST /register
/// Create an account from a plaintext password; public
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let roles = if payload.roles.is_empty() {
        vec!["USER".to_string()]
    } else {
        payload.roles
    };

    let user = state
        .accounts()
        .register(&payload.username, &payload.password, &roles)
        .await?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// PUT /changePassword?password=...
/// Change the caller's own password; identity comes from the verified
/// basic-auth credentials, never from the request body
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(current): Extension<CurrentUser>,
    Query(query): Query<PasswordQuery>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if query.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .accounts()
        .change_password(&current.username, &query.password)
        .await?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// PUT /forgetPassword?username=...&password=...
/// Unauthenticated password reset. Open by design in the original system;
/// anyone who knows a username can reset its password.
pub async fn forget_password(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ResetQuery>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if query.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .accounts()
        .forget_password(&query.username, &query.password)
        .await?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// PUT /admin/reset/{username}?password=...
/// Reset any account's password; ADMIN only (policy gate)
pub async fn admin_reset(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(query): Query<PasswordQuery>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if query.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let user = state
        .accounts()
        .admin_reset(&username, &query.password)
        .await?;

    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// DELETE /delete?username=...&password=...
/// Delete an account after re-verifying its current password. A wrong
/// password leaves the account in place and yields 401.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeleteQuery>,
) -> Result<String, ApiError> {
    let deleted = state
        .accounts()
        .remove(&query.username, &query.password)
        .await?;

    Ok(format!("User {} deleted.", deleted.username))
}

//! Axum route handlers for registration, login, logout and the profile.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::{hash_password, issue_session, verify_password, AuthUser};
use crate::errors::AppError;
use crate::extract::AppJson;
use crate::models::user::User;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

/// POST /api/register
pub async fn handle_register(
    State(state): State<AppState>,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }
    if req.password != req.confirm_password {
        return Err(AppError::Validation("Passwords do not match".to_string()));
    }
    if state.users.email_exists(email).await? {
        return Err(AppError::Validation("Email already exists".to_string()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = state.users.create_user(email, &password_hash).await?;
    let token = issue_session(&state, user.id).await?;

    info!("Registered user {} on the {} plan", user.id, user.plan_type);
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

/// POST /api/login
pub async fn handle_login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let creds = state
        .users
        .find_credentials(req.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&req.password, &creds.password_hash)? {
        return Err(invalid());
    }

    let token = issue_session(&state, creds.user.id).await?;
    Ok(Json(AuthResponse {
        token,
        user: creds.user,
    }))
}

/// POST /api/logout
pub async fn handle_logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    state.users.delete_session(&auth.token).await?;
    Ok(Json(json!({ "message": "Logged out successfully" })))
}

/// GET /api/me
pub async fn handle_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<User>, AppError> {
    let user = state
        .users
        .find_user(auth.user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(user))
}

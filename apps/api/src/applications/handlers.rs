//! Axum route handlers for the Application API.
//!
//! Every query is scoped by the caller's id; another user's row reads as 404.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath};
use crate::models::application::{ApplicationPatch, ApplicationRow, NewApplication};
use crate::state::AppState;

fn application_not_found() -> AppError {
    AppError::NotFound("Application not found".to_string())
}

/// The linked resume must belong to the caller. Checked before the write,
/// outside any transaction.
async fn ensure_resume_owned(state: &AppState, auth: &AuthUser, resume_id: Uuid) -> Result<(), AppError> {
    state
        .resumes
        .find_resume(auth.user.id, resume_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound("Resume not found".to_string()))
}

/// GET /api/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    Ok(Json(state.applications.list_applications(auth.user.id).await?))
}

/// GET /api/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApplicationRow>, AppError> {
    state
        .applications
        .find_application(auth.user.id, id)
        .await?
        .map(Json)
        .ok_or_else(application_not_found)
}

/// POST /api/applications
pub async fn handle_create_application(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<NewApplication>,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    let row = req.into_row(Uuid::new_v4(), auth.user.id, Utc::now())?;
    if let Some(resume_id) = row.resume_id {
        ensure_resume_owned(&state, &auth, resume_id).await?;
    }

    let created = state.applications.insert_application(&row).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/applications/:id
pub async fn handle_update_application(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(patch): AppJson<ApplicationPatch>,
) -> Result<Json<ApplicationRow>, AppError> {
    patch.validate()?;
    state
        .applications
        .find_application(auth.user.id, id)
        .await?
        .ok_or_else(application_not_found)?;
    if let Some(resume_id) = patch.linked_resume() {
        ensure_resume_owned(&state, &auth, resume_id).await?;
    }

    let updated = state
        .applications
        .update_application(auth.user.id, id, &patch, Utc::now())
        .await?;
    Ok(Json(updated))
}

/// DELETE /api/applications/:id
pub async fn handle_delete_application(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    state
        .applications
        .find_application(auth.user.id, id)
        .await?
        .ok_or_else(application_not_found)?;
    state.applications.delete_application(auth.user.id, id).await?;
    Ok(Json(json!({ "message": "Application deleted successfully" })))
}

//! Axum route handlers for the Resume API.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath};
use crate::models::resume::ResumeRow;
use crate::state::AppState;
use crate::store::blob::DEFAULT_CONTENT_TYPE;

#[derive(Debug, Deserialize)]
pub struct ResumeNameRequest {
    pub resume_name: String,
}

#[derive(Debug, Serialize)]
pub struct CreateResumeResponse {
    pub id: Uuid,
    pub file_name: String,
    pub message: String,
}

fn resume_not_found() -> AppError {
    AppError::NotFound("Resume not found".to_string())
}

fn validated_name(name: &str) -> Result<&str, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("resume_name is required".to_string()));
    }
    Ok(name)
}

async fn owned_resume(state: &AppState, auth: &AuthUser, id: Uuid) -> Result<ResumeRow, AppError> {
    state
        .resumes
        .find_resume(auth.user.id, id)
        .await?
        .ok_or_else(resume_not_found)
}

/// GET /api/resumes
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<ResumeRow>>, AppError> {
    Ok(Json(state.resumes.list_resumes(auth.user.id).await?))
}

/// POST /api/resumes
///
/// Creates the record only; the file follows via `PUT /api/resumes/:id/file`.
pub async fn handle_create_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(req): AppJson<ResumeNameRequest>,
) -> Result<(StatusCode, Json<CreateResumeResponse>), AppError> {
    let name = validated_name(&req.resume_name)?;
    let id = Uuid::new_v4();
    let now = Utc::now();
    let resume = ResumeRow {
        id,
        user_id: auth.user.id,
        resume_name: name.to_string(),
        file_url: ResumeRow::object_key(auth.user.id, id),
        created_at: now,
        updated_at: now,
    };
    state.resumes.insert_resume(&resume).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateResumeResponse {
            id,
            file_name: resume.file_url,
            message: format!("Upload the file with PUT /api/resumes/{id}/file"),
        }),
    ))
}

/// PATCH /api/resumes/:id
pub async fn handle_rename_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(req): AppJson<ResumeNameRequest>,
) -> Result<Json<Value>, AppError> {
    let name = validated_name(&req.resume_name)?;
    owned_resume(&state, &auth, id).await?;
    state.resumes.rename_resume(id, name, Utc::now()).await?;
    Ok(Json(json!({ "message": "Resume updated successfully" })))
}

/// DELETE /api/resumes/:id
///
/// Removes the blob first, then the row.
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    let resume = owned_resume(&state, &auth, id).await?;
    state.blobs.delete(&resume.file_url).await?;
    state.resumes.delete_resume(id).await?;
    info!("Deleted resume {id} for user {}", auth.user.id);
    Ok(Json(json!({ "message": "Resume deleted successfully" })))
}

/// PUT /api/resumes/:id/file
pub async fn handle_upload_resume_file(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let resume = owned_resume(&state, &auth, id).await?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE);

    state.blobs.put(&resume.file_url, body, content_type).await?;
    state.resumes.touch_resume(id, Utc::now()).await?;
    Ok(Json(json!({ "message": "File uploaded successfully" })))
}

/// GET /api/resumes/:id/download
pub async fn handle_download_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Response, AppError> {
    let resume = owned_resume(&state, &auth, id).await?;
    let object = state
        .blobs
        .get(&resume.file_url)
        .await?
        .ok_or_else(|| AppError::NotFound("Resume file has not been uploaded".to_string()))?;

    let content_type = HeaderValue::from_str(&object.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{id}.pdf\""))
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        object.bytes,
    )
        .into_response())
}

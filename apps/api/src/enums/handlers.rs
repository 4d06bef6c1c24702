//! Axum route handlers for enumerated lookup values.
//!
//! Reads go through `EnumCache`. Writes are limited to pro/team users and
//! always follow the sequence: mutate the table, evict the type, respond.

use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::extract::{AppJson, AppPath};
use crate::models::enums::EnumItem;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateEnumRequest {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEnumRequest {
    pub label: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchEnumRequest {
    pub types: Vec<String>,
}

fn require_enum_admin(auth: &AuthUser) -> Result<(), AppError> {
    if auth.user.plan_type.can_manage_enums() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

fn require_text<'a>(value: &'a str, field: &str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(value)
}

fn enum_not_found() -> AppError {
    AppError::NotFound("Enum value not found".to_string())
}

/// GET /api/enums
pub async fn handle_list_types(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<String>>, AppError> {
    Ok(Json(state.enum_store.list_enum_types().await?))
}

/// GET /api/enums/:type
pub async fn handle_get_enums(
    State(state): State<AppState>,
    _auth: AuthUser,
    AppPath(kind): AppPath<String>,
) -> Result<Json<Vec<EnumItem>>, AppError> {
    Ok(Json(state.enums.get(&kind).await?))
}

/// POST /api/enums/batch
pub async fn handle_batch_get(
    State(state): State<AppState>,
    _auth: AuthUser,
    AppJson(req): AppJson<BatchEnumRequest>,
) -> Result<Json<BTreeMap<String, Vec<EnumItem>>>, AppError> {
    Ok(Json(state.enums.batch_get(&req.types).await?))
}

/// POST /api/enums/:type
pub async fn handle_create_enum(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(kind): AppPath<String>,
    AppJson(req): AppJson<CreateEnumRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    require_enum_admin(&auth)?;
    let item = EnumItem {
        kind: kind.clone(),
        value: require_text(&req.value, "value")?.to_string(),
        label: require_text(&req.label, "label")?.to_string(),
    };

    if state.enum_store.enum_exists(&kind, &item.value).await? {
        return Err(AppError::Validation("Enum value already exists".to_string()));
    }
    state.enum_store.insert_enum(&item).await?;
    state.enums.invalidate(&kind).await;

    info!("User {} added enum {}:{}", auth.user.id, kind, item.value);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Enum value added successfully" })),
    ))
}

/// PATCH /api/enums/:type/:value
pub async fn handle_update_enum(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath((kind, value)): AppPath<(String, String)>,
    AppJson(req): AppJson<UpdateEnumRequest>,
) -> Result<Json<Value>, AppError> {
    require_enum_admin(&auth)?;
    let label = require_text(&req.label, "label")?;

    if !state.enum_store.update_enum_label(&kind, &value, label).await? {
        return Err(enum_not_found());
    }
    state.enums.invalidate(&kind).await;

    Ok(Json(json!({ "message": "Enum value updated successfully" })))
}

/// DELETE /api/enums/:type/:value
pub async fn handle_delete_enum(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath((kind, value)): AppPath<(String, String)>,
) -> Result<Json<Value>, AppError> {
    require_enum_admin(&auth)?;

    if !state.enum_store.delete_enum(&kind, &value).await? {
        return Err(enum_not_found());
    }
    state.enums.invalidate(&kind).await;

    Ok(Json(json!({ "message": "Enum value deleted successfully" })))
}

//! Axum route handlers for the Dashboard API.

use axum::{extract::State, Json};

use crate::auth::AuthUser;
use crate::dashboard::aggregate::{
    insights, summarize, timeline, DashboardInsights, DashboardSummary, TimelineEntry,
    TIMELINE_LIMIT,
};
use crate::errors::AppError;
use crate::state::AppState;

/// GET /api/dashboard/summary
pub async fn handle_summary(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<DashboardSummary>, AppError> {
    let rows = state.applications.list_applications(auth.user.id).await?;
    Ok(Json(summarize(&rows)))
}

/// GET /api/dashboard/timeline
pub async fn handle_timeline(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<TimelineEntry>>, AppError> {
    let rows = state
        .applications
        .recent_applications(auth.user.id, TIMELINE_LIMIT)
        .await?;
    Ok(Json(timeline(&rows)))
}

/// GET /api/dashboard/insights
pub async fn handle_insights(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<DashboardInsights>, AppError> {
    let rows = state.applications.list_applications(auth.user.id).await?;
    Ok(Json(insights(&rows)))
}

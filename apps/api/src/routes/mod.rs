pub mod health;


use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};

use crate::applications::handlers as applications;
use crate::auth::handlers as auth;
use crate::dashboard::handlers as dashboard;
use crate::enums::handlers as enums;
use crate::errors::AppError;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes);

    let api = Router::new()
        // Auth
        .route("/register", post(auth::handle_register))
        .route("/login", post(auth::handle_login))
        .route("/logout", post(auth::handle_logout))
        .route("/me", get(auth::handle_me))
        // Resumes
        .route(
            "/resumes",
            get(resumes::handle_list_resumes).post(resumes::handle_create_resume),
        )
        .route(
            "/resumes/:id",
            patch(resumes::handle_rename_resume).delete(resumes::handle_delete_resume),
        )
        .route(
            "/resumes/:id/file",
            put(resumes::handle_upload_resume_file).layer(upload_limit),
        )
        .route("/resumes/:id/download", get(resumes::handle_download_resume))
        // Applications
        .route(
            "/applications",
            get(applications::handle_list_applications).post(applications::handle_create_application),
        )
        .route(
            "/applications/:id",
            get(applications::handle_get_application)
                .patch(applications::handle_update_application)
                .delete(applications::handle_delete_application),
        )
        // Dashboard
        .route("/dashboard/summary", get(dashboard::handle_summary))
        .route("/dashboard/timeline", get(dashboard::handle_timeline))
        .route("/dashboard/insights", get(dashboard::handle_insights))
        // Enums
        .route("/enums", get(enums::handle_list_types))
        .route("/enums/batch", post(enums::handle_batch_get))
        .route(
            "/enums/:type",
            get(enums::handle_get_enums).post(enums::handle_create_enum),
        )
        .route(
            "/enums/:type/:value",
            patch(enums::handle_update_enum).delete(enums::handle_delete_enum),
        );

    Router::new()
        .route("/health", get(health::health_handler))
        .nest("/api", api)
        .fallback(not_found)
        .with_state(state)
}

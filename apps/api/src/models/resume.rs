use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_name: String,
    /// Object-store key. The row exists before the bytes are uploaded.
    pub file_url: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

impl ResumeRow {
    pub fn object_key(user_id: Uuid, resume_id: Uuid) -> String {
        format!("resumes/{user_id}/{resume_id}.pdf")
    }
}

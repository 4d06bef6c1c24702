//! Persistence seams.
//!
//! Every external system sits behind an `async_trait` so handlers can be
//! driven against in-memory fakes. `AppState` carries them as `Arc<dyn …>`.

pub mod blob;
pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{ApplicationPatch, ApplicationRow};
use crate::models::enums::EnumItem;
use crate::models::resume::ResumeRow;
use crate::models::user::{User, UserCredentials};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AppError>;

    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AppError>;

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError>;

    /// Stores a new session and drops the user's expired ones.
    async fn create_session(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError>;

    /// Resolves an unexpired session token to its user.
    async fn resolve_session(&self, token: &str) -> Result<Option<User>, AppError>;

    async fn delete_session(&self, token: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait ResumeStore: Send + Sync {
    /// Newest first.
    async fn list_resumes(&self, user_id: Uuid) -> Result<Vec<ResumeRow>, AppError>;

    async fn find_resume(&self, user_id: Uuid, resume_id: Uuid) -> Result<Option<ResumeRow>, AppError>;

    async fn insert_resume(&self, resume: &ResumeRow) -> Result<(), AppError>;

    async fn rename_resume(
        &self,
        resume_id: Uuid,
        resume_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError>;

    async fn touch_resume(&self, resume_id: Uuid, now: DateTime<Utc>) -> Result<(), AppError>;

    async fn delete_resume(&self, resume_id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Ordered by `application_date` descending, then `id` descending.
    async fn list_applications(&self, user_id: Uuid) -> Result<Vec<ApplicationRow>, AppError>;

    /// The newest `limit` applications, in `list_applications` order.
    async fn recent_applications(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ApplicationRow>, AppError>;

    async fn find_application(
        &self,
        user_id: Uuid,
        application_id: Uuid,
    ) -> Result<Option<ApplicationRow>, AppError>;

    async fn insert_application(&self, row: &ApplicationRow) -> Result<ApplicationRow, AppError>;

    /// Applies only the fields present in `patch`; always bumps `last_update`.
    async fn update_application(
        &self,
        user_id: Uuid,
        application_id: Uuid,
        patch: &ApplicationPatch,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRow, AppError>;

    async fn delete_application(&self, user_id: Uuid, application_id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait EnumStore: Send + Sync {
    /// Distinct types, ascending.
    async fn list_enum_types(&self) -> Result<Vec<String>, AppError>;

    /// All items of one type, ordered by value.
    async fn list_enum_items(&self, kind: &str) -> Result<Vec<EnumItem>, AppError>;

    async fn enum_exists(&self, kind: &str, value: &str) -> Result<bool, AppError>;

    async fn insert_enum(&self, item: &EnumItem) -> Result<(), AppError>;

    /// Returns false when no row matched.
    async fn update_enum_label(&self, kind: &str, value: &str, label: &str) -> Result<bool, AppError>;

    /// Returns false when no row matched.
    async fn delete_enum(&self, kind: &str, value: &str) -> Result<bool, AppError>;
}

/// A stored object together with its content type.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), AppError>;

    /// `None` when nothing was ever uploaded under `key`.
    async fn get(&self, key: &str) -> Result<Option<StoredObject>, AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

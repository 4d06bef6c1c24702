//! In-memory fakes for every store seam, used by unit and router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::time::{Duration, Instant};
use uuid::Uuid;

use crate::cache::KvCache;
use crate::errors::AppError;
use crate::models::application::{ApplicationPatch, ApplicationRow};
use crate::models::enums::EnumItem;
use crate::models::resume::ResumeRow;
use crate::models::user::{PlanTier, User, UserCredentials};
use crate::store::{
    ApplicationStore, BlobStore, EnumStore, ResumeStore, StoredObject, UserStore,
};

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    resumes: Vec<ResumeRow>,
    applications: Vec<ApplicationRow>,
    enums: Vec<EnumItem>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    enum_queries: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn seed_enum(&self, item: EnumItem) {
        self.tables.lock().unwrap().enums.push(item);
    }

    pub fn set_plan(&self, user_id: Uuid, plan: PlanTier) {
        let mut tables = self.tables.lock().unwrap();
        if let Some(creds) = tables.users.iter_mut().find(|c| c.user.id == user_id) {
            creds.user.plan_type = plan;
        }
    }

    pub fn session_count(&self) -> usize {
        self.tables.lock().unwrap().sessions.len()
    }

    pub fn application_count(&self) -> usize {
        self.tables.lock().unwrap().applications.len()
    }

    /// Number of `list_enum_items` calls that reached the table.
    pub fn enum_queries(&self) -> usize {
        self.enum_queries.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal(anyhow::anyhow!("memory store offline")));
        }
        Ok(())
    }

    fn with_resume_name(tables: &Tables, mut row: ApplicationRow) -> ApplicationRow {
        row.resume_name = row.resume_id.and_then(|rid| {
            tables
                .resumes
                .iter()
                .find(|r| r.id == rid)
                .map(|r| r.resume_name.clone())
        });
        row
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        self.check()?;
        Ok(self.tables.lock().unwrap().users.iter().any(|c| c.user.email == email))
    }

    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|c| c.user.email == email) {
            return Err(AppError::Validation("Email already exists".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            plan_type: PlanTier::Free,
            created_at: Utc::now(),
        };
        tables.users.push(UserCredentials {
            user: user.clone(),
            password_hash: password_hash.to_string(),
        });
        Ok(user)
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        self.check()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|c| c.user.email == email)
            .cloned())
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        self.check()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|c| c.user.id == user_id)
            .map(|c| c.user.clone()))
    }

    async fn create_session(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.check()?;
        let now = Utc::now();
        let mut tables = self.tables.lock().unwrap();
        tables
            .sessions
            .retain(|_, (owner, expires)| *owner != user_id || *expires > now);
        tables
            .sessions
            .insert(token.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<User>, AppError> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        let Some((user_id, expires_at)) = tables.sessions.get(token) else {
            return Ok(None);
        };
        if *expires_at <= Utc::now() {
            return Ok(None);
        }
        Ok(tables
            .users
            .iter()
            .find(|c| c.user.id == *user_id)
            .map(|c| c.user.clone()))
    }

    async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        self.check()?;
        self.tables.lock().unwrap().sessions.remove(token);
        Ok(())
    }
}

#[async_trait]
impl ResumeStore for MemoryStore {
    async fn list_resumes(&self, user_id: Uuid) -> Result<Vec<ResumeRow>, AppError> {
        self.check()?;
        let mut rows: Vec<_> = self
            .tables
            .lock()
            .unwrap()
            .resumes
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find_resume(&self, user_id: Uuid, resume_id: Uuid) -> Result<Option<ResumeRow>, AppError> {
        self.check()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .resumes
            .iter()
            .find(|r| r.id == resume_id && r.user_id == user_id)
            .cloned())
    }

    async fn insert_resume(&self, resume: &ResumeRow) -> Result<(), AppError> {
        self.check()?;
        self.tables.lock().unwrap().resumes.push(resume.clone());
        Ok(())
    }

    async fn rename_resume(
        &self,
        resume_id: Uuid,
        resume_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        if let Some(r) = tables.resumes.iter_mut().find(|r| r.id == resume_id) {
            r.resume_name = resume_name.to_string();
            r.updated_at = now;
        }
        Ok(())
    }

    async fn touch_resume(&self, resume_id: Uuid, now: DateTime<Utc>) -> Result<(), AppError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        if let Some(r) = tables.resumes.iter_mut().find(|r| r.id == resume_id) {
            r.updated_at = now;
        }
        Ok(())
    }

    async fn delete_resume(&self, resume_id: Uuid) -> Result<(), AppError> {
        self.check()?;
        self.tables.lock().unwrap().resumes.retain(|r| r.id != resume_id);
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn list_applications(&self, user_id: Uuid) -> Result<Vec<ApplicationRow>, AppError> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<_> = tables
            .applications
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .map(|row| Self::with_resume_name(&tables, row))
            .collect();
        rows.sort_by(|a, b| {
            b.application_date
                .cmp(&a.application_date)
                .then(b.id.cmp(&a.id))
        });
        Ok(rows)
    }

    async fn recent_applications(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ApplicationRow>, AppError> {
        let mut rows = self.list_applications(user_id).await?;
        rows.truncate(limit);
        Ok(rows)
    }

    async fn find_application(
        &self,
        user_id: Uuid,
        application_id: Uuid,
    ) -> Result<Option<ApplicationRow>, AppError> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .applications
            .iter()
            .find(|a| a.id == application_id && a.user_id == user_id)
            .cloned()
            .map(|row| Self::with_resume_name(&tables, row)))
    }

    async fn insert_application(&self, row: &ApplicationRow) -> Result<ApplicationRow, AppError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let mut stored = row.clone();
        stored.resume_name = None;
        tables.applications.push(stored.clone());
        Ok(Self::with_resume_name(&tables, stored))
    }

    async fn update_application(
        &self,
        user_id: Uuid,
        application_id: Uuid,
        patch: &ApplicationPatch,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRow, AppError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .applications
            .iter_mut()
            .find(|a| a.id == application_id && a.user_id == user_id)
            .ok_or_else(|| AppError::NotFound("Application not found".to_string()))?;
        patch.apply(row, now);
        let updated = row.clone();
        Ok(Self::with_resume_name(&tables, updated))
    }

    async fn delete_application(&self, user_id: Uuid, application_id: Uuid) -> Result<(), AppError> {
        self.check()?;
        self.tables
            .lock()
            .unwrap()
            .applications
            .retain(|a| !(a.id == application_id && a.user_id == user_id));
        Ok(())
    }
}

#[async_trait]
impl EnumStore for MemoryStore {
    async fn list_enum_types(&self) -> Result<Vec<String>, AppError> {
        self.check()?;
        let mut kinds: Vec<String> = self
            .tables
            .lock()
            .unwrap()
            .enums
            .iter()
            .map(|e| e.kind.clone())
            .collect();
        kinds.sort();
        kinds.dedup();
        Ok(kinds)
    }

    async fn list_enum_items(&self, kind: &str) -> Result<Vec<EnumItem>, AppError> {
        self.enum_queries.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let mut items: Vec<_> = self
            .tables
            .lock()
            .unwrap()
            .enums
            .iter()
            .filter(|e| e.kind == kind)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.value.cmp(&b.value));
        Ok(items)
    }

    async fn enum_exists(&self, kind: &str, value: &str) -> Result<bool, AppError> {
        self.check()?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .enums
            .iter()
            .any(|e| e.kind == kind && e.value == value))
    }

    async fn insert_enum(&self, item: &EnumItem) -> Result<(), AppError> {
        self.check()?;
        self.tables.lock().unwrap().enums.push(item.clone());
        Ok(())
    }

    async fn update_enum_label(&self, kind: &str, value: &str, label: &str) -> Result<bool, AppError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        match tables
            .enums
            .iter_mut()
            .find(|e| e.kind == kind && e.value == value)
        {
            Some(item) => {
                item.label = label.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_enum(&self, kind: &str, value: &str) -> Result<bool, AppError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.enums.len();
        tables.enums.retain(|e| !(e.kind == kind && e.value == value));
        Ok(tables.enums.len() < before)
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl MemoryBlobStore {
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<(), AppError> {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<StoredObject>, AppError> {
        Ok(self.objects.lock().unwrap().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}

/// TTL-aware cache driven by tokio's clock so tests can pause and advance it.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
    failing: AtomicBool,
}

impl MemoryCache {
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap()
            .get(key)
            .is_some_and(|(_, expires)| *expires > Instant::now())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal(anyhow::anyhow!("memory cache offline")));
        }
        Ok(())
    }
}

#[async_trait]
impl KvCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some((value, expires)) if *expires > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl_secs: u64) -> Result<(), AppError> {
        self.check()?;
        self.entries.lock().unwrap().insert(
            key.to_string(),
            (value.to_string(), Instant::now() + Duration::from_secs(ttl_secs)),
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.check()?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

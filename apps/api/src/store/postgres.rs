use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{ApplicationPatch, ApplicationRow};
use crate::models::enums::EnumItem;
use crate::models::resume::ResumeRow;
use crate::models::user::{User, UserCredentials};
use crate::store::{ApplicationStore, EnumStore, ResumeStore, UserStore};

const APPLICATION_SELECT: &str = r#"
    SELECT a.*, r.resume_name
    FROM applications a
    LEFT JOIN resumes r ON a.resume_id = r.id
"#;

/// PostgreSQL implementation of every record-store seam.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    password_hash: String,
    plan_type: String,
    created_at: DateTime<Utc>,
}

impl UserRecord {
    fn into_credentials(self) -> Result<UserCredentials, AppError> {
        Ok(UserCredentials {
            user: User {
                id: self.id,
                email: self.email,
                plan_type: self.plan_type.parse()?,
                created_at: self.created_at,
            },
            password_hash: self.password_hash,
        })
    }
}

fn unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl UserStore for PgStore {
    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, AppError> {
        let record: UserRecord = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, password_hash, plan_type, created_at)
            VALUES ($1, $2, $3, 'free', now())
            RETURNING id, email, password_hash, plan_type, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if unique_violation(&e) {
                AppError::Validation("Email already exists".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(record.into_credentials()?.user)
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        let record: Option<UserRecord> = sqlx::query_as(
            "SELECT id, email, password_hash, plan_type, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        record.map(UserRecord::into_credentials).transpose()
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let record: Option<UserRecord> = sqlx::query_as(
            "SELECT id, email, password_hash, plan_type, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record
            .map(UserRecord::into_credentials)
            .transpose()?
            .map(|c| c.user))
    }

    async fn create_session(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE user_id = $1 AND expires_at <= now()")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        sqlx::query("INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn resolve_session(&self, token: &str) -> Result<Option<User>, AppError> {
        let record: Option<UserRecord> = sqlx::query_as(
            r#"
            SELECT u.id, u.email, u.password_hash, u.plan_type, u.created_at
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1 AND s.expires_at > now()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record
            .map(UserRecord::into_credentials)
            .transpose()?
            .map(|c| c.user))
    }

    async fn delete_session(&self, token: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ResumeStore for PgStore {
    async fn list_resumes(&self, user_id: Uuid) -> Result<Vec<ResumeRow>, AppError> {
        Ok(sqlx::query_as::<_, ResumeRow>(
            "SELECT * FROM resumes WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn find_resume(&self, user_id: Uuid, resume_id: Uuid) -> Result<Option<ResumeRow>, AppError> {
        Ok(
            sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
                .bind(resume_id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn insert_resume(&self, resume: &ResumeRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO resumes (id, user_id, resume_name, file_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(resume.id)
        .bind(resume.user_id)
        .bind(&resume.resume_name)
        .bind(&resume.file_url)
        .bind(resume.created_at)
        .bind(resume.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn rename_resume(
        &self,
        resume_id: Uuid,
        resume_name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE resumes SET resume_name = $1, updated_at = $2 WHERE id = $3")
            .bind(resume_name)
            .bind(now)
            .bind(resume_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn touch_resume(&self, resume_id: Uuid, now: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("UPDATE resumes SET updated_at = $1 WHERE id = $2")
            .bind(now)
            .bind(resume_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_resume(&self, resume_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM resumes WHERE id = $1")
            .bind(resume_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ApplicationStore for PgStore {
    async fn list_applications(&self, user_id: Uuid) -> Result<Vec<ApplicationRow>, AppError> {
        let sql = format!(
            "{APPLICATION_SELECT} WHERE a.user_id = $1 ORDER BY a.application_date DESC, a.id DESC"
        );
        Ok(sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn recent_applications(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<ApplicationRow>, AppError> {
        let sql = format!(
            "{APPLICATION_SELECT} WHERE a.user_id = $1 \
             ORDER BY a.application_date DESC, a.id DESC LIMIT $2"
        );
        Ok(sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_application(
        &self,
        user_id: Uuid,
        application_id: Uuid,
    ) -> Result<Option<ApplicationRow>, AppError> {
        let sql = format!("{APPLICATION_SELECT} WHERE a.id = $1 AND a.user_id = $2");
        Ok(sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(application_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_application(&self, row: &ApplicationRow) -> Result<ApplicationRow, AppError> {
        sqlx::query(
            r#"
            INSERT INTO applications (
                id, user_id, resume_id, company_name, position_title, status,
                city, salary_range, channel, contact_name, contact_email,
                application_date, last_update, interview_date, offer_status,
                rejection_reason, notes, custom_fields
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(row.id)
        .bind(row.user_id)
        .bind(row.resume_id)
        .bind(&row.company_name)
        .bind(&row.position_title)
        .bind(&row.status)
        .bind(&row.city)
        .bind(&row.salary_range)
        .bind(&row.channel)
        .bind(&row.contact_name)
        .bind(&row.contact_email)
        .bind(row.application_date)
        .bind(row.last_update)
        .bind(row.interview_date)
        .bind(&row.offer_status)
        .bind(&row.rejection_reason)
        .bind(&row.notes)
        .bind(&row.custom_fields)
        .execute(&self.pool)
        .await?;

        self.find_application(row.user_id, row.id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("application {} vanished after insert", row.id)))
    }

    async fn update_application(
        &self,
        user_id: Uuid,
        application_id: Uuid,
        patch: &ApplicationPatch,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRow, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE applications SET ");
        push_assignments(&mut builder, patch, now);
        builder
            .push(" WHERE id = ")
            .push_bind(application_id)
            .push(" AND user_id = ")
            .push_bind(user_id);

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Application not found".to_string()));
        }

        self.find_application(user_id, application_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Application not found".to_string()))
    }

    async fn delete_application(&self, user_id: Uuid, application_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM applications WHERE id = $1 AND user_id = $2")
            .bind(application_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Appends `column = $n` for every field present in the patch, then `last_update`.
fn push_assignments(builder: &mut QueryBuilder<'_, Postgres>, patch: &ApplicationPatch, now: DateTime<Utc>) {
    let mut set = builder.separated(", ");

    macro_rules! assign {
        ($field:ident) => {
            if let Some(value) = &patch.$field {
                set.push(concat!(stringify!($field), " = "));
                set.push_bind_unseparated(value.clone());
            }
        };
    }

    assign!(resume_id);
    assign!(company_name);
    assign!(position_title);
    assign!(status);
    assign!(city);
    assign!(salary_range);
    assign!(channel);
    assign!(contact_name);
    assign!(contact_email);
    assign!(application_date);
    assign!(interview_date);
    assign!(offer_status);
    assign!(rejection_reason);
    assign!(notes);
    assign!(custom_fields);

    set.push("last_update = ");
    set.push_bind_unseparated(now);
}

#[async_trait]
impl EnumStore for PgStore {
    async fn list_enum_types(&self) -> Result<Vec<String>, AppError> {
        Ok(sqlx::query_scalar("SELECT DISTINCT type FROM enums ORDER BY type")
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_enum_items(&self, kind: &str) -> Result<Vec<EnumItem>, AppError> {
        Ok(sqlx::query_as::<_, EnumItem>(
            "SELECT type, value, label FROM enums WHERE type = $1 ORDER BY value",
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn enum_exists(&self, kind: &str, value: &str) -> Result<bool, AppError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM enums WHERE type = $1 AND value = $2)")
                .bind(kind)
                .bind(value)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert_enum(&self, item: &EnumItem) -> Result<(), AppError> {
        sqlx::query("INSERT INTO enums (type, value, label) VALUES ($1, $2, $3)")
            .bind(&item.kind)
            .bind(&item.value)
            .bind(&item.label)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if unique_violation(&e) {
                    AppError::Validation("Enum value already exists".to_string())
                } else {
                    AppError::Database(e)
                }
            })?;
        Ok(())
    }

    async fn update_enum_label(&self, kind: &str, value: &str, label: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE enums SET label = $1 WHERE type = $2 AND value = $3")
            .bind(label)
            .bind(kind)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_enum(&self, kind: &str, value: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM enums WHERE type = $1 AND value = $2")
            .bind(kind)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

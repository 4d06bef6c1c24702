use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

pub const DEFAULT_STATUS: &str = "applied";

/// An application as stored, plus the display name of the linked resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub resume_id: Option<Uuid>,
    pub company_name: String,
    pub position_title: String,
    pub status: String,
    pub city: Option<String>,
    pub salary_range: Option<String>,
    pub channel: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub application_date: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_update: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub interview_date: Option<DateTime<Utc>>,
    pub offer_status: Option<String>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
    pub custom_fields: Option<Value>,
    pub resume_name: Option<String>,
}

/// Body of `POST /api/applications`.
#[derive(Debug, Default, Deserialize)]
pub struct NewApplication {
    pub resume_id: Option<Uuid>,
    pub company_name: Option<String>,
    pub position_title: Option<String>,
    pub status: Option<String>,
    pub city: Option<String>,
    pub salary_range: Option<String>,
    pub channel: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub application_date: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub interview_date: Option<DateTime<Utc>>,
    pub offer_status: Option<String>,
    pub rejection_reason: Option<String>,
    pub notes: Option<String>,
    pub custom_fields: Option<Value>,
}

impl NewApplication {
    /// Validates the body and builds the row to insert.
    /// Blank optional strings are stored as NULL.
    pub fn into_row(self, id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> Result<ApplicationRow, AppError> {
        let company_name = required(self.company_name, "company_name")?;
        let position_title = required(self.position_title, "position_title")?;

        Ok(ApplicationRow {
            id,
            user_id,
            resume_id: self.resume_id,
            company_name,
            position_title,
            status: non_blank(self.status).unwrap_or_else(|| DEFAULT_STATUS.to_string()),
            city: non_blank(self.city),
            salary_range: non_blank(self.salary_range),
            channel: non_blank(self.channel),
            contact_name: non_blank(self.contact_name),
            contact_email: non_blank(self.contact_email),
            application_date: self.application_date.unwrap_or(now),
            last_update: now,
            interview_date: self.interview_date,
            offer_status: non_blank(self.offer_status),
            rejection_reason: non_blank(self.rejection_reason),
            notes: non_blank(self.notes),
            custom_fields: self.custom_fields.filter(|v| !v.is_null()),
            resume_name: None,
        })
    }
}

/// Body of `PATCH /api/applications/:id`.
///
/// Outer `None` means the field was absent and stays untouched.
/// `Some(None)` means an explicit `null` and clears a nullable column.
/// A blank optional string clears it too, matching creation.
/// A `null` on a required column is treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApplicationPatch {
    #[serde(default, deserialize_with = "present")]
    pub resume_id: Option<Option<Uuid>>,
    pub company_name: Option<String>,
    pub position_title: Option<String>,
    pub status: Option<String>,
    #[serde(default, deserialize_with = "present_text")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_text")]
    pub salary_range: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_text")]
    pub channel: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_text")]
    pub contact_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_text")]
    pub contact_email: Option<Option<String>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub application_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "present_timestamp")]
    pub interview_date: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "present_text")]
    pub offer_status: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_text")]
    pub rejection_reason: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_text")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub custom_fields: Option<Option<Value>>,
}

impl ApplicationPatch {
    pub fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [
            ("company_name", &self.company_name),
            ("position_title", &self.position_title),
            ("status", &self.status),
        ] {
            if matches!(value, Some(v) if v.trim().is_empty()) {
                return Err(AppError::Validation(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }

    /// The resume the patch links to, if it links one.
    pub fn linked_resume(&self) -> Option<Uuid> {
        self.resume_id.flatten()
    }

    /// Applies present fields to `row` and bumps `last_update`.
    pub fn apply(&self, row: &mut ApplicationRow, now: DateTime<Utc>) {
        if let Some(v) = self.resume_id {
            row.resume_id = v;
        }
        if let Some(v) = &self.company_name {
            row.company_name = v.clone();
        }
        if let Some(v) = &self.position_title {
            row.position_title = v.clone();
        }
        if let Some(v) = &self.status {
            row.status = v.clone();
        }
        if let Some(v) = &self.city {
            row.city = v.clone();
        }
        if let Some(v) = &self.salary_range {
            row.salary_range = v.clone();
        }
        if let Some(v) = &self.channel {
            row.channel = v.clone();
        }
        if let Some(v) = &self.contact_name {
            row.contact_name = v.clone();
        }
        if let Some(v) = &self.contact_email {
            row.contact_email = v.clone();
        }
        if let Some(v) = self.application_date {
            row.application_date = v;
        }
        if let Some(v) = self.interview_date {
            row.interview_date = v;
        }
        if let Some(v) = &self.offer_status {
            row.offer_status = v.clone();
        }
        if let Some(v) = &self.rejection_reason {
            row.rejection_reason = v.clone();
        }
        if let Some(v) = &self.notes {
            row.notes = v.clone();
        }
        if let Some(v) = &self.custom_fields {
            row.custom_fields = v.clone();
        }
        row.last_update = now;
    }
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn present_text<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|v| Some(non_blank(v)))
}

fn present_timestamp<'de, D>(deserializer: D) -> Result<Option<Option<DateTime<Utc>>>, D::Error>
where
    D: Deserializer<'de>,
{
    chrono::serde::ts_seconds_option::deserialize(deserializer).map(Some)
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    non_blank(value).ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

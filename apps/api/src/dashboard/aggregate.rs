use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::application::ApplicationRow;

pub const TIMELINE_LIMIT: usize = 50;
pub const ACCEPTED_OFFER: &str = "accepted";
const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardSummary {
    pub status_distribution: BTreeMap<String, u64>,
    pub city_distribution: BTreeMap<String, u64>,
    pub channel_distribution: BTreeMap<String, u64>,
    pub total_applications: u64,
    /// Percentage 0–100.
    pub success_rate: f64,
    /// Mean days between application and last update.
    pub average_response_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEntry {
    pub id: Uuid,
    pub company_name: String,
    pub position_title: String,
    pub status: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub application_date: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_update: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    pub interview_date: Option<DateTime<Utc>>,
    pub offer_status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyCount {
    pub month: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusProcessingTime {
    pub status: String,
    pub average_response_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelSuccessRate {
    pub channel: String,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardInsights {
    pub monthly_trend: Vec<MonthlyCount>,
    pub status_processing_time: Vec<StatusProcessingTime>,
    pub channel_success_rate: Vec<ChannelSuccessRate>,
}

/// Running mean that reports 0 when nothing was added.
#[derive(Default)]
struct Mean {
    sum: f64,
    count: u64,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Accepted offers over decided offers, as a percentage.
#[derive(Default)]
struct OfferRatio {
    decided: u64,
    accepted: u64,
}

impl OfferRatio {
    fn add(&mut self, offer_status: &str) {
        self.decided += 1;
        if offer_status == ACCEPTED_OFFER {
            self.accepted += 1;
        }
    }

    fn percentage(&self) -> f64 {
        if self.decided == 0 {
            0.0
        } else {
            self.accepted as f64 / self.decided as f64 * 100.0
        }
    }
}

/// Days from application to last update, only when the application was
/// touched after it was filed.
fn response_days(row: &ApplicationRow) -> Option<f64> {
    (row.last_update > row.application_date)
        .then(|| (row.last_update - row.application_date).num_seconds() as f64 / SECONDS_PER_DAY)
}

fn bump(map: &mut BTreeMap<String, u64>, key: &str) {
    *map.entry(key.to_string()).or_insert(0) += 1;
}

pub fn summarize(rows: &[ApplicationRow]) -> DashboardSummary {
    let mut status_distribution = BTreeMap::new();
    let mut city_distribution = BTreeMap::new();
    let mut channel_distribution = BTreeMap::new();
    let mut offers = OfferRatio::default();
    let mut response = Mean::default();

    for row in rows {
        bump(&mut status_distribution, &row.status);
        if let Some(city) = &row.city {
            bump(&mut city_distribution, city);
        }
        if let Some(channel) = &row.channel {
            bump(&mut channel_distribution, channel);
        }
        if let Some(offer) = &row.offer_status {
            offers.add(offer);
        }
        if let Some(days) = response_days(row) {
            response.add(days);
        }
    }

    DashboardSummary {
        status_distribution,
        city_distribution,
        channel_distribution,
        total_applications: rows.len() as u64,
        success_rate: offers.percentage(),
        average_response_time: response.value(),
    }
}

/// The most recent applications, newest first, ties broken by id descending.
pub fn timeline(rows: &[ApplicationRow]) -> Vec<TimelineEntry> {
    let mut recent: Vec<&ApplicationRow> = rows.iter().collect();
    recent.sort_by(|a, b| {
        b.application_date
            .cmp(&a.application_date)
            .then(b.id.cmp(&a.id))
    });

    recent
        .into_iter()
        .take(TIMELINE_LIMIT)
        .map(|row| TimelineEntry {
            id: row.id,
            company_name: row.company_name.clone(),
            position_title: row.position_title.clone(),
            status: row.status.clone(),
            application_date: row.application_date,
            last_update: row.last_update,
            interview_date: row.interview_date,
            offer_status: row.offer_status.clone(),
        })
        .collect()
}

pub fn insights(rows: &[ApplicationRow]) -> DashboardInsights {
    let mut months: BTreeMap<String, u64> = BTreeMap::new();
    let mut per_status: BTreeMap<String, Mean> = BTreeMap::new();
    let mut per_channel: BTreeMap<String, OfferRatio> = BTreeMap::new();

    for row in rows {
        bump(&mut months, &row.application_date.format("%Y-%m").to_string());

        if let Some(days) = response_days(row) {
            per_status.entry(row.status.clone()).or_default().add(days);
        }

        if let (Some(channel), Some(offer)) = (&row.channel, &row.offer_status) {
            per_channel.entry(channel.clone()).or_default().add(offer);
        }
    }

    DashboardInsights {
        monthly_trend: months
            .into_iter()
            .map(|(month, count)| MonthlyCount { month, count })
            .collect(),
        status_processing_time: per_status
            .into_iter()
            .map(|(status, mean)| StatusProcessingTime {
                status,
                average_response_time: mean.value(),
            })
            .collect(),
        channel_success_rate: per_channel
            .into_iter()
            .map(|(channel, ratio)| ChannelSuccessRate {
                channel,
                success_rate: ratio.percentage(),
            })
            .collect(),
    }
}

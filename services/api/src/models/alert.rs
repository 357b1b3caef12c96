//! Alert models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, postgres::PgRow};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::promotion::Promotion;

/// Alert entity: a promotion delivered to a user on a channel
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: Uuid,
    pub user_id: Uuid,
    pub promotion_id: Uuid,
    pub channel: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub sent_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    pub const COLUMNS: &'static str =
        "id, user_id, promotion_id, channel, is_read, read_at, sent_at, created_at";

    pub fn from_row(row: &PgRow) -> Self {
        Self {
            id: row.get("id"),
            user_id: row.get("user_id"),
            promotion_id: row.get("promotion_id"),
            channel: row.get("channel"),
            is_read: row.get("is_read"),
            read_at: row.get("read_at"),
            sent_at: row.get("sent_at"),
            created_at: row.get("created_at"),
        }
    }
}

/// Alert joined with its promotion (absent if the promotion is gone)
#[derive(Debug, Clone, Serialize)]
pub struct AlertWithPromotion {
    #[serde(flatten)]
    pub alert: Alert,
    pub promotion: Option<Promotion>,
}

/// Alert creation payload used by the notification process
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub user_id: Uuid,
    pub promotion_id: Uuid,
    pub channel: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertListQuery {
    pub limit: Option<i64>,
    pub unread_only: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    pub date: String,
    pub count: usize,
}

/// Per-user alert statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStats {
    pub total_alerts: usize,
    pub unread_alerts: usize,
    pub read_alerts: usize,
    pub channel_counts: BTreeMap<String, usize>,
    pub daily_alerts: Vec<DailyCount>,
}

//! Alert repository for database operations

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::alert::{Alert, AlertStats, DailyCount, NewAlert};

/// Alert repository for database operations
#[derive(Clone)]
pub struct AlertRepository {
    pool: PgPool,
}

impl AlertRepository {
    /// Create a new alert repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Alerts of a user, newest first
    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        limit: i64,
        unread_only: bool,
    ) -> Result<Vec<Alert>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM user_alerts
            WHERE user_id = $1 AND (NOT $2 OR NOT is_read)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
            Alert::COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(unread_only)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(Alert::from_row).collect())
    }

    pub async fn count_unread(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_alerts WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Mark one alert as read; only the owner can
    pub async fn mark_read(&self, alert_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE user_alerts
            SET is_read = TRUE, read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(alert_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark every unread alert of a user as read; returns how many changed
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE user_alerts SET is_read = TRUE, read_at = NOW() WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn create(&self, alert: &NewAlert) -> Result<Alert> {
        let sql = format!(
            r#"
            INSERT INTO user_alerts (user_id, promotion_id, channel)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            Alert::COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(alert.user_id)
            .bind(alert.promotion_id)
            .bind(&alert.channel)
            .fetch_one(&self.pool)
            .await?;

        Ok(Alert::from_row(&row))
    }

    pub async fn stats(&self, user_id: Uuid) -> Result<AlertStats> {
        let rows = sqlx::query(
            "SELECT channel, is_read, created_at FROM user_alerts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let entries: Vec<(String, bool, DateTime<Utc>)> = rows
            .iter()
            .map(|row| (row.get("channel"), row.get("is_read"), row.get("created_at")))
            .collect();

        Ok(compute_stats(&entries, Utc::now()))
    }
}

/// Totals, per-channel counts and per-day counts over the last 30 days
pub fn compute_stats(entries: &[(String, bool, DateTime<Utc>)], now: DateTime<Utc>) -> AlertStats {
    let total_alerts = entries.len();
    let unread_alerts = entries.iter().filter(|(_, is_read, _)| !is_read).count();

    let mut channel_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut daily: BTreeMap<String, usize> = BTreeMap::new();
    let since = now - Duration::days(30);

    for (channel, _, created_at) in entries {
        *channel_counts.entry(channel.clone()).or_default() += 1;
        if *created_at >= since {
            *daily
                .entry(created_at.format("%Y-%m-%d").to_string())
                .or_default() += 1;
        }
    }

    AlertStats {
        total_alerts,
        unread_alerts,
        read_alerts: total_alerts - unread_alerts,
        channel_counts,
        daily_alerts: daily
            .into_iter()
            .map(|(date, count)| DailyCount { date, count })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stats() {
        let now = Utc.with_ymd_and_hms(2025, 3, 31, 12, 0, 0).unwrap();
        let entries = vec![
            ("email".to_string(), true, now - Duration::hours(1)),
            ("email".to_string(), false, now - Duration::days(1)),
            ("telegram".to_string(), false, now - Duration::hours(2)),
            ("email".to_string(), true, now - Duration::days(45)),
        ];

        let stats = compute_stats(&entries, now);
        assert_eq!(stats.total_alerts, 4);
        assert_eq!(stats.unread_alerts, 2);
        assert_eq!(stats.read_alerts, 2);
        assert_eq!(stats.channel_counts.get("email"), Some(&3));
        assert_eq!(stats.channel_counts.get("telegram"), Some(&1));
        assert_eq!(
            stats.daily_alerts,
            vec![
                DailyCount { date: "2025-03-30".to_string(), count: 1 },
                DailyCount { date: "2025-03-31".to_string(), count: 2 },
            ]
        );
    }

    #[test]
    fn test_stats_of_nothing() {
        let stats = compute_stats(&[], Utc::now());
        assert_eq!(stats.total_alerts, 0);
        assert!(stats.daily_alerts.is_empty());
    }
}

//! User preference record and its allow-list filter semantics
//!
//! Each list (origins, destinations, airlines) is a deduplicated set kept in
//! insertion order. An empty list means "no filter", not "match nothing".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, Row, postgres::PgRow};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{DatabaseError, DatabaseResult};

/// Origins every new account starts with
pub const DEFAULT_ORIGINS: [&str; 2] = ["GRU", "GYN"];

/// Price ceiling every new account starts with
pub const DEFAULT_MAX_PRICE: f64 = 5000.0;

/// Delivery channel for alerts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
    Telegram,
    Whatsapp,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Email => "email",
            NotificationChannel::Telegram => "telegram",
            NotificationChannel::Whatsapp => "whatsapp",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(NotificationChannel::Email),
            "telegram" => Ok(NotificationChannel::Telegram),
            "whatsapp" => Ok(NotificationChannel::Whatsapp),
            other => Err(format!("Unknown notification channel: {}", other)),
        }
    }
}

/// How often alerts are batched for delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationFrequency {
    Instant,
    Daily,
    Weekly,
}

impl NotificationFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationFrequency::Instant => "instant",
            NotificationFrequency::Daily => "daily",
            NotificationFrequency::Weekly => "weekly",
        }
    }
}

impl FromStr for NotificationFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instant" => Ok(NotificationFrequency::Instant),
            "daily" => Ok(NotificationFrequency::Daily),
            "weekly" => Ok(NotificationFrequency::Weekly),
            other => Err(format!("Unknown notification frequency: {}", other)),
        }
    }
}

/// Preferences entity, one per user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub id: Uuid,
    pub user_id: Uuid,
    pub preferred_origins: Vec<String>,
    pub preferred_destinations: Vec<String>,
    pub max_price: f64,
    pub preferred_airlines: Vec<String>,
    pub notification_channels: Vec<NotificationChannel>,
    pub notification_frequency: NotificationFrequency,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Preferences {
    /// Column list matching [`Preferences::from_row`]
    pub const COLUMNS: &'static str = "id, user_id, preferred_origins, preferred_destinations, \
        max_price, preferred_airlines, notification_channels, notification_frequency, \
        created_at, updated_at";

    pub fn from_row(row: &PgRow) -> DatabaseResult<Self> {
        let corrupt = |reason: String| DatabaseError::CorruptRow {
            table: "user_preferences",
            reason,
        };

        let channels: Vec<String> = row.get("notification_channels");
        let notification_channels = channels
            .iter()
            .map(|c| c.parse())
            .collect::<Result<Vec<NotificationChannel>, String>>()
            .map_err(corrupt)?;

        let frequency: String = row.get("notification_frequency");
        let notification_frequency = frequency.parse().map_err(corrupt)?;

        Ok(Self {
            id: row.get("id"),
            user_id: row.get("user_id"),
            preferred_origins: row.get("preferred_origins"),
            preferred_destinations: row.get("preferred_destinations"),
            max_price: row.get("max_price"),
            preferred_airlines: row.get("preferred_airlines"),
            notification_channels,
            notification_frequency,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    /// The route filter these preferences describe
    pub fn filter(&self) -> PreferenceFilter<'_> {
        PreferenceFilter {
            origins: &self.preferred_origins,
            destinations: &self.preferred_destinations,
            airlines: &self.preferred_airlines,
        }
    }
}

/// Allow-list view over the three preference lists
#[derive(Debug, Clone, Copy)]
pub struct PreferenceFilter<'a> {
    pub origins: &'a [String],
    pub destinations: &'a [String],
    pub airlines: &'a [String],
}

impl PreferenceFilter<'_> {
    pub fn matches(&self, origin: &str, destination: &str, airline: &str) -> bool {
        allows(self.origins, origin)
            && allows(self.destinations, destination)
            && allows(self.airlines, airline)
    }
}

/// Empty list allows everything; otherwise the value must be listed
pub fn allows(list: &[String], value: &str) -> bool {
    list.is_empty() || list.iter().any(|v| v == value)
}

/// Append `value` unless already present; returns whether the list changed
pub fn add_unique(list: &mut Vec<String>, value: &str) -> bool {
    if list.iter().any(|v| v == value) {
        return false;
    }
    list.push(value.to_string());
    true
}

/// Remove every occurrence of `value`; returns whether the list changed
pub fn remove_value(list: &mut Vec<String>, value: &str) -> bool {
    let before = list.len();
    list.retain(|v| v != value);
    list.len() != before
}

/// Deduplicate preserving the first occurrence of each value
pub fn dedup_ordered<T: PartialEq + Clone>(values: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(value) {
            out.push(value.clone());
        }
    }
    out
}

/// Insert the default preferences for a freshly registered user
///
/// Takes an executor so registration can run it in the same transaction as
/// the user insert.
pub async fn insert_defaults<'e, E>(executor: E, user_id: Uuid) -> DatabaseResult<Preferences>
where
    E: PgExecutor<'e>,
{
    let origins: Vec<String> = DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect();
    let channels = vec![NotificationChannel::Email.as_str().to_string()];

    let sql = format!(
        r#"
        INSERT INTO user_preferences (
            user_id, preferred_origins, preferred_destinations, max_price,
            preferred_airlines, notification_channels, notification_frequency
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {}
        "#,
        Preferences::COLUMNS
    );

    let row = sqlx::query(&sql)
        .bind(user_id)
        .bind(&origins)
        .bind(Vec::<String>::new())
        .bind(DEFAULT_MAX_PRICE)
        .bind(Vec::<String>::new())
        .bind(&channels)
        .bind(NotificationFrequency::Daily.as_str())
        .fetch_one(executor)
        .await
        .map_err(DatabaseError::Query)?;

    Preferences::from_row(&row)
}

/// Load the preferences row of a user
pub async fn find_by_user<'e, E>(executor: E, user_id: Uuid) -> DatabaseResult<Option<Preferences>>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        "SELECT {} FROM user_preferences WHERE user_id = $1",
        Preferences::COLUMNS
    );

    let row = sqlx::query(&sql)
        .bind(user_id)
        .fetch_optional(executor)
        .await
        .map_err(DatabaseError::Query)?;

    row.as_ref().map(Preferences::from_row).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_empty_list_matches_everything() {
        let empty = Vec::new();
        let filter = PreferenceFilter {
            origins: &empty,
            destinations: &empty,
            airlines: &empty,
        };

        assert!(filter.matches("GYN", "LIS", "TAP"));
        assert!(filter.matches("GRU", "MIA", "LATAM"));
    }

    #[test]
    fn test_non_empty_list_is_an_allow_list() {
        let origins = codes(&["GRU"]);
        let empty = Vec::new();
        let filter = PreferenceFilter {
            origins: &origins,
            destinations: &empty,
            airlines: &empty,
        };

        assert!(filter.matches("GRU", "MIA", "LATAM"));
        assert!(!filter.matches("GYN", "MIA", "LATAM"));
    }

    #[test]
    fn test_every_list_must_allow() {
        let origins = codes(&["GRU", "GYN"]);
        let destinations = codes(&["LIS"]);
        let airlines = codes(&["TAP"]);
        let filter = PreferenceFilter {
            origins: &origins,
            destinations: &destinations,
            airlines: &airlines,
        };

        assert!(filter.matches("GYN", "LIS", "TAP"));
        assert!(!filter.matches("GYN", "LIS", "GOL"));
        assert!(!filter.matches("GYN", "MIA", "TAP"));
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut list = codes(&["GRU"]);
        assert!(add_unique(&mut list, "GYN"));
        assert!(!add_unique(&mut list, "GYN"));
        assert_eq!(list, codes(&["GRU", "GYN"]));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut list = codes(&["GRU", "GYN"]);
        assert!(remove_value(&mut list, "GRU"));
        assert!(!remove_value(&mut list, "GRU"));
        assert!(!remove_value(&mut list, "CNF"));
        assert_eq!(list, codes(&["GYN"]));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let deduped = dedup_ordered(&codes(&["GYN", "GRU", "GYN", "CNF", "GRU"]));
        assert_eq!(deduped, codes(&["GYN", "GRU", "CNF"]));
    }

    #[test]
    fn test_channel_and_frequency_parsing() {
        assert_eq!("telegram".parse::<NotificationChannel>(), Ok(NotificationChannel::Telegram));
        assert!("sms".parse::<NotificationChannel>().is_err());
        assert_eq!("weekly".parse::<NotificationFrequency>(), Ok(NotificationFrequency::Weekly));
        assert!("hourly".parse::<NotificationFrequency>().is_err());
    }

    #[test]
    fn test_channel_serializes_lowercase() {
        let json = serde_json::to_string(&vec![
            NotificationChannel::Email,
            NotificationChannel::Whatsapp,
        ])
        .unwrap();
        assert_eq!(json, r#"["email","whatsapp"]"#);
    }
}

//! Preference update payloads

use common::preferences::{NotificationChannel, NotificationFrequency, dedup_ordered};
use serde::Deserialize;

/// Partial whole-field update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesUpdate {
    pub preferred_origins: Option<Vec<String>>,
    pub preferred_destinations: Option<Vec<String>>,
    pub max_price: Option<f64>,
    pub preferred_airlines: Option<Vec<String>>,
    pub notification_channels: Option<Vec<String>>,
    pub notification_frequency: Option<String>,
}

/// An update that passed validation, lists deduplicated
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedUpdate {
    pub preferred_origins: Option<Vec<String>>,
    pub preferred_destinations: Option<Vec<String>>,
    pub max_price: Option<f64>,
    pub preferred_airlines: Option<Vec<String>>,
    pub notification_channels: Option<Vec<NotificationChannel>>,
    pub notification_frequency: Option<NotificationFrequency>,
}

impl ValidatedUpdate {
    pub fn channel_names(&self) -> Option<Vec<String>> {
        self.notification_channels
            .as_ref()
            .map(|channels| channels.iter().map(|c| c.as_str().to_string()).collect())
    }
}

impl PreferencesUpdate {
    pub fn validate(self) -> Result<ValidatedUpdate, String> {
        if let Some(max_price) = self.max_price {
            if !max_price.is_finite() || max_price < 0.0 {
                return Err("maxPrice must be a non-negative number".to_string());
            }
        }

        let notification_channels = match self.notification_channels {
            Some(channels) if channels.is_empty() => {
                return Err("At least one notification channel is required".to_string());
            }
            Some(channels) => Some(dedup_ordered(
                &channels
                    .iter()
                    .map(|c| c.parse::<NotificationChannel>())
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            None => None,
        };

        let notification_frequency = self
            .notification_frequency
            .map(|f| f.parse::<NotificationFrequency>())
            .transpose()?;

        Ok(ValidatedUpdate {
            preferred_origins: self.preferred_origins.as_deref().map(clean_list),
            preferred_destinations: self.preferred_destinations.as_deref().map(clean_list),
            max_price: self.max_price,
            preferred_airlines: self.preferred_airlines.as_deref().map(clean_list),
            notification_channels,
            notification_frequency,
        })
    }
}

/// Trim, drop blanks and deduplicate preserving first occurrence
fn clean_list(values: &[String]) -> Vec<String> {
    let trimmed: Vec<String> = values
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    dedup_ordered(&trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(value: serde_json::Value) -> PreferencesUpdate {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_lists_are_deduplicated_in_order() {
        let validated = update(json!({
            "preferredOrigins": ["GYN", "GRU", "GYN", " "],
            "preferredAirlines": []
        }))
        .validate()
        .unwrap();

        assert_eq!(
            validated.preferred_origins,
            Some(vec!["GYN".to_string(), "GRU".to_string()])
        );
        assert_eq!(validated.preferred_airlines, Some(vec![]));
        assert!(validated.preferred_destinations.is_none());
    }

    #[test]
    fn test_channels_and_frequency() {
        let validated = update(json!({
            "notificationChannels": ["telegram", "email", "telegram"],
            "notificationFrequency": "weekly"
        }))
        .validate()
        .unwrap();

        assert_eq!(
            validated.channel_names(),
            Some(vec!["telegram".to_string(), "email".to_string()])
        );
        assert_eq!(
            validated.notification_frequency,
            Some(NotificationFrequency::Weekly)
        );
    }

    #[test]
    fn test_rejections() {
        assert!(update(json!({ "notificationChannels": [] })).validate().is_err());
        assert!(update(json!({ "notificationChannels": ["sms"] })).validate().is_err());
        assert!(update(json!({ "notificationFrequency": "hourly" })).validate().is_err());
        assert!(update(json!({ "maxPrice": -1.0 })).validate().is_err());
        assert!(update(json!({})).validate().is_ok());
    }
}

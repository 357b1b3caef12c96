//! Promotion models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

/// Promotion entity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: Uuid,
    pub origin: String,
    pub destination: String,
    pub airline: String,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    pub price_total: f64,
    pub price_per_person: Option<f64>,
    pub original_price: Option<f64>,
    pub discount_percentage: f64,
    pub currency: String,
    pub is_round_trip: bool,
    pub source: String,
    pub source_url: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Promotion {
    pub const COLUMNS: &'static str = "id, origin, destination, airline, departure_date, \
        return_date, price_total, price_per_person, original_price, discount_percentage, \
        currency, is_round_trip, source, source_url, title, description, image_url, is_active, \
        expires_at, created_at, updated_at";

    pub fn from_row(row: &PgRow) -> Self {
        Self {
            id: row.get("id"),
            origin: row.get("origin"),
            destination: row.get("destination"),
            airline: row.get("airline"),
            departure_date: row.get("departure_date"),
            return_date: row.get("return_date"),
            price_total: row.get("price_total"),
            price_per_person: row.get("price_per_person"),
            original_price: row.get("original_price"),
            discount_percentage: row.get("discount_percentage"),
            currency: row.get("currency"),
            is_round_trip: row.get("is_round_trip"),
            source: row.get("source"),
            source_url: row.get("source_url"),
            title: row.get("title"),
            description: row.get("description"),
            image_url: row.get("image_url"),
            is_active: row.get("is_active"),
            expires_at: row.get("expires_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

fn default_currency() -> String {
    "BRL".to_string()
}

fn default_round_trip() -> bool {
    true
}

/// A promotion candidate as sent by the aggregation service
///
/// `expiresAt` is epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPromotion {
    pub origin: String,
    pub destination: String,
    pub airline: String,
    pub departure_date: Option<String>,
    pub return_date: Option<String>,
    pub price_total: f64,
    pub price_per_person: Option<f64>,
    pub original_price: Option<f64>,
    pub discount_percentage: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_round_trip")]
    pub is_round_trip: bool,
    pub source: String,
    pub source_url: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl NewPromotion {
    /// Identity of an active listing
    pub fn dedup_key(&self) -> (&str, &str, &str) {
        (&self.origin, &self.destination, &self.source_url)
    }
}

/// Filters for listing active promotions
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub max_price: Option<f64>,
    pub min_discount: Option<f64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighDiscountQuery {
    pub min_discount: Option<f64>,
    pub limit: Option<i64>,
}

/// A code or name with its number of active promotions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCode {
    pub code: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedName {
    pub name: String,
    pub count: usize,
}

/// Aggregates over the active promotions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionStats {
    pub total_promotions: usize,
    pub avg_discount: f64,
    pub avg_price: f64,
    pub top_origins: Vec<RankedCode>,
    pub top_destinations: Vec<RankedCode>,
    pub top_airlines: Vec<RankedName>,
}

impl PromotionStats {
    /// Aggregate a set of active promotions
    pub fn from_promotions(promotions: &[Promotion]) -> Self {
        let total = promotions.len();
        if total == 0 {
            return Self {
                total_promotions: 0,
                avg_discount: 0.0,
                avg_price: 0.0,
                top_origins: Vec::new(),
                top_destinations: Vec::new(),
                top_airlines: Vec::new(),
            };
        }

        let avg_discount =
            promotions.iter().map(|p| p.discount_percentage).sum::<f64>() / total as f64;
        let avg_price = promotions.iter().map(|p| p.price_total).sum::<f64>() / total as f64;

        Self {
            total_promotions: total,
            avg_discount: (avg_discount * 10.0).round() / 10.0,
            avg_price: avg_price.round(),
            top_origins: top_five(promotions.iter().map(|p| p.origin.as_str()))
                .into_iter()
                .map(|(code, count)| RankedCode { code, count })
                .collect(),
            top_destinations: top_five(promotions.iter().map(|p| p.destination.as_str()))
                .into_iter()
                .map(|(code, count)| RankedCode { code, count })
                .collect(),
            top_airlines: top_five(promotions.iter().map(|p| p.airline.as_str()))
                .into_iter()
                .map(|(name, count)| RankedName { name, count })
                .collect(),
        }
    }
}

/// Five most frequent values; ties keep first-seen order
fn top_five<'a>(values: impl Iterator<Item = &'a str>) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(seen, _)| seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value.to_string(), 1)),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(5);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn promotion(
        origin: &str,
        destination: &str,
        airline: &str,
        price: f64,
        discount: f64,
    ) -> Promotion {
        let now = Utc::now();
        Promotion {
            id: Uuid::new_v4(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            airline: airline.to_string(),
            departure_date: None,
            return_date: None,
            price_total: price,
            price_per_person: None,
            original_price: None,
            discount_percentage: discount,
            currency: "BRL".to_string(),
            is_round_trip: true,
            source: "Melhores Destinos".to_string(),
            source_url: format!("https://melhoresdestinos.com.br/{}-{}", origin, destination),
            title: format!("{} para {}", origin, destination),
            description: None,
            image_url: None,
            is_active: true,
            expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_stats_of_nothing() {
        let stats = PromotionStats::from_promotions(&[]);
        assert_eq!(stats.total_promotions, 0);
        assert_eq!(stats.avg_discount, 0.0);
        assert!(stats.top_airlines.is_empty());
    }

    #[test]
    fn test_stats_rounding_and_ranking() {
        let promotions = vec![
            promotion("GRU", "MIA", "LATAM", 2450.0, 45.0),
            promotion("GRU", "LIS", "TAP", 2890.0, 44.0),
            promotion("GYN", "GRU", "GOL", 320.0, 45.0),
        ];

        let stats = PromotionStats::from_promotions(&promotions);
        assert_eq!(stats.total_promotions, 3);
        assert_eq!(stats.avg_discount, 44.7);
        assert_eq!(stats.avg_price, 1887.0);
        assert_eq!(
            stats.top_origins,
            vec![
                RankedCode { code: "GRU".to_string(), count: 2 },
                RankedCode { code: "GYN".to_string(), count: 1 },
            ]
        );
        assert_eq!(stats.top_airlines[0].name, "LATAM");
    }

    #[test]
    fn test_top_five_truncates() {
        let codes = ["A", "B", "C", "D", "E", "F", "F"];
        let top = top_five(codes.into_iter());
        assert_eq!(top.len(), 5);
        assert_eq!(top[0], ("F".to_string(), 2));
        assert_eq!(top[1].0, "A");
    }

    #[test]
    fn test_new_promotion_defaults() {
        let promotion: NewPromotion = serde_json::from_value(json!({
            "origin": "GRU",
            "destination": "MIA",
            "airline": "LATAM",
            "priceTotal": 2450.0,
            "discountPercentage": 45.0,
            "source": "Melhores Destinos",
            "sourceUrl": "https://melhoresdestinos.com.br/promocao-miami",
            "title": "Voos para Miami"
        }))
        .unwrap();

        assert_eq!(promotion.currency, "BRL");
        assert!(promotion.is_round_trip);
        assert!(promotion.expires_at.is_none());
        assert_eq!(
            promotion.dedup_key(),
            ("GRU", "MIA", "https://melhoresdestinos.com.br/promocao-miami")
        );
    }

    #[test]
    fn test_expires_at_is_epoch_millis() {
        let promotion: NewPromotion = serde_json::from_value(json!({
            "origin": "GYN",
            "destination": "GRU",
            "airline": "GOL",
            "priceTotal": 320,
            "discountPercentage": 45,
            "currency": "USD",
            "isRoundTrip": false,
            "source": "GOL",
            "sourceUrl": "https://voegol.com.br",
            "title": "Goiania para Sao Paulo",
            "expiresAt": 1767225600000i64
        }))
        .unwrap();

        assert_eq!(promotion.currency, "USD");
        assert!(!promotion.is_round_trip);
        assert_eq!(
            promotion.expires_at.map(|at| at.timestamp()),
            Some(1767225600)
        );
    }
}

//! Proxy to the external flight-price aggregation service
//!
//! Upstream payloads mix snake_case and camelCase; both are accepted and
//! normalized to the camelCase shapes in [`crate::models::voyager`].
//! Failures never surface as errors to clients: the handlers answer with
//! an empty envelope carrying an advisory `error` string.

use anyhow::Result;
use chrono::Utc;
use common::cache::RedisPool;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::{
    config::Settings,
    models::voyager::{
        FlightOffer, FlightsQuery, FlightsResponse, ProxyPromotion, ProxyPromotionQuery,
        ProxyPromotionsResponse,
    },
};

const DEFAULT_AIRLINE: &str = "Varias companhias";
const DEFAULT_CLASSIFICATION: &str = "NORMAL";
const FLIGHTS_UNAVAILABLE: &str = "API do Voyager indisponivel";
const PROMOTIONS_UNAVAILABLE: &str = "Falha ao buscar promocoes";

/// The aggregation service could not produce a usable answer
#[derive(Error, Debug)]
pub enum UpstreamUnavailable {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream answered {0}")]
    Status(StatusCode),
}

/// HTTP client for the aggregation service with a response cache
#[derive(Clone)]
pub struct VoyagerClient {
    http: reqwest::Client,
    base_url: String,
    cache: RedisPool,
    cache_ttl_secs: u64,
}

impl VoyagerClient {
    pub fn new(settings: &Settings, cache: RedisPool) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.voyager_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: settings.voyager_api_url.clone(),
            cache,
            cache_ttl_secs: settings.voyager_cache_ttl_secs,
        })
    }

    /// GET a JSON document, going through the cache
    async fn fetch(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Value, UpstreamUnavailable> {
        let cache_key = cache_key(path, params);

        match self.cache.get_json::<Value>(&cache_key).await {
            Ok(Some(cached)) => {
                debug!("Cache hit for {}", cache_key);
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => warn!("Cache read failed for {}: {}", cache_key, e),
        }

        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamUnavailable::Status(response.status()));
        }

        let body: Value = response.json().await?;

        if let Err(e) = self
            .cache
            .set_json(&cache_key, &body, Some(self.cache_ttl_secs))
            .await
        {
            warn!("Cache write failed for {}: {}", cache_key, e);
        }

        Ok(body)
    }

    pub async fn flights(&self, query: &FlightsQuery) -> FlightsResponse {
        let route_type = query
            .route_type
            .clone()
            .unwrap_or_else(|| "domestic".to_string());

        let mut params = vec![("type", route_type.clone())];
        if let Some(origin) = query.origin.as_ref().filter(|o| !o.is_empty()) {
            params.push(("origin", origin.clone()));
        }
        params.push(("limit", query.limit.unwrap_or(50).to_string()));

        match self.fetch("/api/offers/by-route", &params).await {
            Ok(body) => flights_from_body(&body, route_type),
            Err(e) => {
                error!("Failed to fetch flights: {}", e);
                FlightsResponse {
                    offers: Vec::new(),
                    total: 0,
                    route_type,
                    last_updated: Utc::now().to_rfc3339(),
                    error: Some(FLIGHTS_UNAVAILABLE.to_string()),
                }
            }
        }
    }

    pub async fn promotions(&self, query: &ProxyPromotionQuery) -> ProxyPromotionsResponse {
        let limit = query.limit.unwrap_or(20);

        let mut params = Vec::new();
        let text_params = [
            ("origin", &query.origin),
            ("destination", &query.destination),
            ("airline", &query.airline),
        ];
        for (name, value) in text_params {
            if let Some(value) = value.as_ref().filter(|v| !v.is_empty()) {
                params.push((name, value.clone()));
            }
        }
        if let Some(min_discount) = query.min_discount {
            params.push(("min_discount", min_discount.to_string()));
        }
        if let Some(max_price) = query.max_price {
            params.push(("max_price", max_price.to_string()));
        }
        params.push(("limit", limit.to_string()));

        match self.fetch("/api/promotions", &params).await {
            Ok(body) => {
                let promotions = items(&body, "promotions")
                    .iter()
                    .map(normalize_promotion)
                    .collect();
                let filtered = filter_promotions(promotions, query);

                ProxyPromotionsResponse {
                    total: filtered.len(),
                    promotions: filtered.into_iter().take(limit).collect(),
                    source: "voyager",
                    error: None,
                }
            }
            Err(e) => {
                error!("Failed to fetch promotions: {}", e);
                ProxyPromotionsResponse {
                    promotions: Vec::new(),
                    total: 0,
                    source: "voyager",
                    error: Some(PROMOTIONS_UNAVAILABLE.to_string()),
                }
            }
        }
    }
}

fn cache_key(path: &str, params: &[(&str, String)]) -> String {
    let query: Vec<String> = params
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    format!("voyager:{}?{}", path, query.join("&"))
}

/// The list under `field`, or the body itself when it is an array
fn items<'a>(body: &'a Value, field: &str) -> &'a [Value] {
    body.get(field)
        .and_then(Value::as_array)
        .or_else(|| body.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// First non-empty string among `keys`
fn text(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// First non-zero number among `keys`
fn number(value: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_f64))
        .find(|n| *n != 0.0)
}

fn flag(value: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter()
        .find_map(|key| value.get(*key).and_then(Value::as_bool))
}

pub fn normalize_offer(offer: &Value, now: &str) -> FlightOffer {
    FlightOffer {
        id: offer.get("id").cloned().unwrap_or(Value::Null),
        origin: text(offer, &["origin"]).unwrap_or_default(),
        destination: text(offer, &["destination"]).unwrap_or_default(),
        destination_city: text(offer, &["destination_city", "destinationCity"]),
        airline: text(offer, &["airline"]).unwrap_or_else(|| DEFAULT_AIRLINE.to_string()),
        price_total: number(offer, &["price_total", "priceTotal"]).unwrap_or_default(),
        discount_percentage: number(offer, &["discount_percentage", "discountPercentage"])
            .unwrap_or_default(),
        discount_classification: text(
            offer,
            &["discount_classification", "discountClassification"],
        )
        .unwrap_or_else(|| DEFAULT_CLASSIFICATION.to_string()),
        source_url: text(offer, &["source_url", "sourceUrl"]).unwrap_or_default(),
        created_at: text(offer, &["created_at", "createdAt"]).unwrap_or_else(|| now.to_string()),
    }
}

/// Best discount first, then cheapest
pub fn sort_offers(offers: &mut [FlightOffer]) {
    offers.sort_by(|a, b| {
        b.discount_percentage
            .total_cmp(&a.discount_percentage)
            .then(a.price_total.total_cmp(&b.price_total))
    });
}

fn flights_from_body(body: &Value, route_type: String) -> FlightsResponse {
    let now = Utc::now().to_rfc3339();
    let mut offers: Vec<FlightOffer> = items(body, "offers")
        .iter()
        .map(|offer| normalize_offer(offer, &now))
        .collect();
    sort_offers(&mut offers);

    FlightsResponse {
        total: offers.len(),
        offers,
        route_type,
        last_updated: text(body, &["lastUpdated", "last_updated"]).unwrap_or(now),
        error: None,
    }
}

pub fn normalize_promotion(promotion: &Value) -> ProxyPromotion {
    ProxyPromotion {
        id: promotion.get("id").cloned().unwrap_or(Value::Null),
        origin: text(promotion, &["origin"]).unwrap_or_default(),
        destination: text(promotion, &["destination"]).unwrap_or_default(),
        airline: text(promotion, &["airline"]).unwrap_or_else(|| DEFAULT_AIRLINE.to_string()),
        price_total: number(promotion, &["price_total", "priceTotal"]).unwrap_or_default(),
        original_price: number(promotion, &["original_price", "originalPrice"]),
        discount_percentage: number(promotion, &["discount_percentage", "discountPercentage"])
            .unwrap_or_default(),
        currency: text(promotion, &["currency"]).unwrap_or_else(|| "BRL".to_string()),
        is_round_trip: flag(promotion, &["is_round_trip", "isRoundTrip"]).unwrap_or(true),
        source: text(promotion, &["source"]).unwrap_or_default(),
        source_url: text(promotion, &["source_url", "sourceUrl"]).unwrap_or_default(),
        title: text(promotion, &["title"]).unwrap_or_default(),
        created_at: promotion
            .get("created_at")
            .or_else(|| promotion.get("createdAt"))
            .cloned()
            .unwrap_or(Value::Null),
        is_active: flag(promotion, &["is_active", "isActive"]).unwrap_or(true),
    }
}

/// Server-side filters: exact route, case-insensitive airline substring,
/// discount floor and price ceiling
pub fn filter_promotions(
    promotions: Vec<ProxyPromotion>,
    query: &ProxyPromotionQuery,
) -> Vec<ProxyPromotion> {
    let airline = query
        .airline
        .as_ref()
        .filter(|a| !a.is_empty())
        .map(|a| a.to_lowercase());
    let origin = query.origin.as_deref().filter(|o| !o.is_empty());
    let destination = query.destination.as_deref().filter(|d| !d.is_empty());

    promotions
        .into_iter()
        .filter(|p| origin.is_none_or(|o| p.origin == o))
        .filter(|p| destination.is_none_or(|d| p.destination == d))
        .filter(|p| {
            airline
                .as_ref()
                .is_none_or(|a| p.airline.to_lowercase().contains(a.as_str()))
        })
        .filter(|p| query.min_discount.is_none_or(|min| p.discount_percentage >= min))
        .filter(|p| query.max_price.is_none_or(|max| p.price_total <= max))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_accepts_both_casings() {
        let snake = normalize_offer(
            &json!({
                "id": 7,
                "origin": "GRU",
                "destination": "LIS",
                "destination_city": "Lisboa",
                "price_total": 2890.0,
                "discount_percentage": 44,
                "discount_classification": "GREAT",
                "source_url": "https://a",
                "created_at": "2025-03-01T00:00:00Z"
            }),
            "now",
        );
        let camel = normalize_offer(
            &json!({
                "id": 7,
                "origin": "GRU",
                "destination": "LIS",
                "destinationCity": "Lisboa",
                "priceTotal": 2890.0,
                "discountPercentage": 44,
                "discountClassification": "GREAT",
                "sourceUrl": "https://a",
                "createdAt": "2025-03-01T00:00:00Z"
            }),
            "now",
        );

        assert_eq!(snake, camel);
        assert_eq!(snake.destination_city.as_deref(), Some("Lisboa"));
        assert_eq!(snake.airline, DEFAULT_AIRLINE);
    }

    #[test]
    fn test_normalize_defaults() {
        let offer = normalize_offer(&json!({ "origin": "GYN", "destination": "GRU" }), "now");

        assert_eq!(offer.airline, "Varias companhias");
        assert_eq!(offer.discount_percentage, 0.0);
        assert_eq!(offer.discount_classification, "NORMAL");
        assert_eq!(offer.source_url, "");
        assert_eq!(offer.created_at, "now");
        assert_eq!(offer.id, Value::Null);
    }

    #[test]
    fn test_offers_sorted_by_discount_then_price() {
        let body = json!({
            "offers": [
                { "id": 1, "priceTotal": 900, "discountPercentage": 30 },
                { "id": 2, "priceTotal": 700, "discountPercentage": 50 },
                { "id": 3, "priceTotal": 500, "discountPercentage": 50 },
            ]
        });

        let response = flights_from_body(&body, "international".to_string());
        let ids: Vec<Value> = response.offers.iter().map(|o| o.id.clone()).collect();
        assert_eq!(ids, vec![json!(3), json!(2), json!(1)]);
        assert_eq!(response.total, 3);
        assert_eq!(response.route_type, "international");
    }

    #[test]
    fn test_flights_keep_upstream_last_updated() {
        let body = json!({ "offers": [], "lastUpdated": "2025-03-01T10:00:00Z" });
        let response = flights_from_body(&body, "domestic".to_string());
        assert_eq!(response.last_updated, "2025-03-01T10:00:00Z");
        assert!(response.offers.is_empty());
    }

    fn proxy_promotion(origin: &str, airline: &str, price: f64, discount: f64) -> ProxyPromotion {
        normalize_promotion(&json!({
            "origin": origin,
            "destination": "MIA",
            "airline": airline,
            "price_total": price,
            "discount_percentage": discount,
        }))
    }

    #[test]
    fn test_filter_promotions() {
        let promotions = vec![
            proxy_promotion("GRU", "LATAM Airlines", 2450.0, 45.0),
            proxy_promotion("GRU", "TAP", 2890.0, 44.0),
            proxy_promotion("GYN", "GOL", 320.0, 45.0),
        ];

        let query = ProxyPromotionQuery {
            origin: Some("GRU".to_string()),
            airline: Some("latam".to_string()),
            ..ProxyPromotionQuery::default()
        };
        let filtered = filter_promotions(promotions.clone(), &query);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].airline, "LATAM Airlines");

        let query = ProxyPromotionQuery {
            min_discount: Some(45.0),
            max_price: Some(2000.0),
            ..ProxyPromotionQuery::default()
        };
        let filtered = filter_promotions(promotions, &query);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].origin, "GYN");
    }

    #[test]
    fn test_items_accepts_bare_array() {
        let body = json!([{ "origin": "GRU" }]);
        assert_eq!(items(&body, "promotions").len(), 1);
        assert!(items(&json!({}), "promotions").is_empty());
    }

    #[test]
    fn test_cache_key() {
        let key = cache_key(
            "/api/offers/by-route",
            &[("type", "domestic".to_string()), ("limit", "50".to_string())],
        );
        assert_eq!(key, "voyager:/api/offers/by-route?type=domestic&limit=50");
    }
}

//! Shapes exchanged with the flight-price aggregation service

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Query parameters of `GET /api/voyager/flights`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlightsQuery {
    #[serde(rename = "type")]
    pub route_type: Option<String>,
    pub origin: Option<String>,
    pub limit: Option<u32>,
}

/// A normalized route offer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightOffer {
    pub id: Value,
    pub origin: String,
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_city: Option<String>,
    pub airline: String,
    pub price_total: f64,
    pub discount_percentage: f64,
    pub discount_classification: String,
    pub source_url: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightsResponse {
    pub offers: Vec<FlightOffer>,
    pub total: usize,
    #[serde(rename = "type")]
    pub route_type: String,
    pub last_updated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Query parameters of `GET /api/voyager/promotions`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyPromotionQuery {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub airline: Option<String>,
    pub min_discount: Option<f64>,
    pub max_price: Option<f64>,
    pub limit: Option<usize>,
}

/// A normalized promotion from the aggregation service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyPromotion {
    pub id: Value,
    pub origin: String,
    pub destination: String,
    pub airline: String,
    pub price_total: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    pub discount_percentage: f64,
    pub currency: String,
    pub is_round_trip: bool,
    pub source: String,
    pub source_url: String,
    pub title: String,
    pub created_at: Value,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProxyPromotionsResponse {
    pub promotions: Vec<ProxyPromotion>,
    pub total: usize,
    pub source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

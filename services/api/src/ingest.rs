//! Promotion ingestion: validation, in-batch deduplication and merge
//!
//! A batch goes through three stages. Raw JSON candidates are validated one
//! by one, collecting index-tagged errors without stopping. Valid
//! candidates are collapsed by `(origin, destination, sourceUrl)` so a key
//! is merged once, with the last payload seen for it. Each unique key is
//! then merged into the active set with a single atomic upsert.

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{error::ApiError, models::promotion::NewPromotion};

/// Result of merging one candidate into the active set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created(Uuid),
    /// An active listing existed and its price changed
    Updated(Uuid),
    /// An active listing existed at the same price
    Unchanged,
}

/// Storage the merge stage writes to
pub trait PromotionSink {
    fn upsert(
        &self,
        promotion: &NewPromotion,
    ) -> impl Future<Output = Result<UpsertOutcome>> + Send;
}

/// Candidates that passed validation, plus the per-index failures
#[derive(Debug, Default)]
pub struct ValidatedBatch {
    pub received: usize,
    pub valid: Vec<NewPromotion>,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Candidates collapsed into an earlier one with the same key
    pub duplicates: usize,
    /// Keys whose write failed; every other key was still merged
    pub failed: usize,
    /// IDs of the newly created promotions
    pub ids: Vec<Uuid>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

fn non_empty_str(candidate: &Value, field: &str) -> bool {
    candidate
        .get(field)
        .and_then(Value::as_str)
        .is_some_and(|value| !value.is_empty())
}

fn check_candidate(candidate: &Value) -> Result<NewPromotion, String> {
    if !(non_empty_str(candidate, "origin")
        && non_empty_str(candidate, "destination")
        && non_empty_str(candidate, "airline"))
    {
        return Err("Missing required fields (origin, destination, airline)".to_string());
    }

    match candidate.get("priceTotal").and_then(Value::as_f64) {
        Some(price) if price > 0.0 => {}
        _ => return Err("Invalid priceTotal".to_string()),
    }

    if candidate
        .get("discountPercentage")
        .and_then(Value::as_f64)
        .is_none()
    {
        return Err("Invalid discountPercentage".to_string());
    }

    if !(non_empty_str(candidate, "source")
        && non_empty_str(candidate, "sourceUrl")
        && non_empty_str(candidate, "title"))
    {
        return Err("Missing source, sourceUrl or title".to_string());
    }

    // Null or empty optional fields fall back to their defaults.
    let mut candidate = candidate.clone();
    if let Some(fields) = candidate.as_object_mut() {
        fields.retain(|name, value| {
            !(matches!(name.as_str(), "currency" | "isRoundTrip")
                && (value.is_null() || value.as_str() == Some("")))
        });
    }

    serde_json::from_value(candidate).map_err(|e| format!("Invalid payload: {}", e))
}

/// Validate a sync request body: one candidate or an array of them
pub fn validate_batch(body: Value) -> Result<ValidatedBatch, ApiError> {
    let candidates = match body {
        Value::Array(items) => items,
        single => vec![single],
    };

    if candidates.is_empty() {
        return Err(ApiError::Validation("No promotions provided".to_string()));
    }

    let mut batch = ValidatedBatch {
        received: candidates.len(),
        ..ValidatedBatch::default()
    };

    for (index, candidate) in candidates.iter().enumerate() {
        match check_candidate(candidate) {
            Ok(promotion) => batch.valid.push(promotion),
            Err(reason) => batch.errors.push(format!("Promotion {}: {}", index, reason)),
        }
    }

    if !batch.errors.is_empty() {
        warn!("Rejected {} of {} promotion(s)", batch.errors.len(), batch.received);
    }

    Ok(batch)
}

/// Collapse candidates sharing a key
///
/// Each key keeps the position of its first occurrence and the payload of
/// its last. Returns the unique candidates and how many were collapsed.
pub fn collapse_duplicates(candidates: Vec<NewPromotion>) -> (Vec<NewPromotion>, usize) {
    let total = candidates.len();
    let mut positions: HashMap<(String, String, String), usize> = HashMap::new();
    let mut unique: Vec<NewPromotion> = Vec::with_capacity(total);

    for candidate in candidates {
        let (origin, destination, source_url) = candidate.dedup_key();
        let key = (
            origin.to_string(),
            destination.to_string(),
            source_url.to_string(),
        );
        match positions.get(&key) {
            Some(&position) => unique[position] = candidate,
            None => {
                positions.insert(key, unique.len());
                unique.push(candidate);
            }
        }
    }

    let duplicates = total - unique.len();
    (unique, duplicates)
}

/// Merge candidates into the active set
///
/// Each key is written independently. A failed write is recorded in
/// `errors` and the remaining keys are still merged.
pub async fn merge<S: PromotionSink>(sink: &S, candidates: Vec<NewPromotion>) -> IngestSummary {
    let (unique, duplicates) = collapse_duplicates(candidates);
    let mut summary = IngestSummary {
        duplicates,
        ..IngestSummary::default()
    };

    for candidate in &unique {
        match sink.upsert(candidate).await {
            Ok(UpsertOutcome::Created(id)) => {
                summary.created += 1;
                summary.ids.push(id);
            }
            Ok(UpsertOutcome::Updated(_)) => summary.updated += 1,
            Ok(UpsertOutcome::Unchanged) => summary.unchanged += 1,
            Err(e) => {
                let (origin, destination, source_url) = candidate.dedup_key();
                error!(
                    "Failed to merge promotion {}-{} ({}): {:#}",
                    origin, destination, source_url, e
                );
                summary.failed += 1;
                summary.errors.push(format!(
                    "Promotion {}-{} ({}): storage failure",
                    origin, destination, source_url
                ));
            }
        }
    }

    info!(
        "Ingested {} promotion(s): {} created, {} updated, {} unchanged, {} duplicate(s), {} failed",
        unique.len() + duplicates,
        summary.created,
        summary.updated,
        summary.unchanged,
        summary.duplicates,
        summary.failed
    );

    summary
}

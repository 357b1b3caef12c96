//! Promotion repository for database operations

use anyhow::Result;
use common::preferences::Preferences;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::{
    ingest::{PromotionSink, UpsertOutcome},
    models::promotion::{NewPromotion, Promotion, PromotionQuery, PromotionStats},
};

/// Promotion repository for database operations
#[derive(Clone)]
pub struct PromotionRepository {
    pool: PgPool,
}

impl PromotionRepository {
    /// Create a new promotion repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Active promotions matching the filters, best discount first
    pub async fn list_active(&self, query: &PromotionQuery) -> Result<Vec<Promotion>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM promotions
            WHERE is_active
              AND ($1::TEXT IS NULL OR origin = $1)
              AND ($2::TEXT IS NULL OR destination = $2)
              AND ($3::DOUBLE PRECISION IS NULL OR price_total <= $3)
              AND ($4::DOUBLE PRECISION IS NULL OR discount_percentage >= $4)
            ORDER BY discount_percentage DESC
            LIMIT $5
            "#,
            Promotion::COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(&query.origin)
            .bind(&query.destination)
            .bind(query.max_price)
            .bind(query.min_discount)
            .bind(query.limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(Promotion::from_row).collect())
    }

    /// Newest active promotions
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Promotion>> {
        let sql = format!(
            "SELECT {} FROM promotions WHERE is_active ORDER BY created_at DESC LIMIT $1",
            Promotion::COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(Promotion::from_row).collect())
    }

    pub async fn stats(&self) -> Result<PromotionStats> {
        let active = self.list_active(&PromotionQuery::default()).await?;
        Ok(PromotionStats::from_promotions(&active))
    }

    /// Active promotions a user's preferences allow, best discount first
    pub async fn matching(
        &self,
        preferences: &Preferences,
        limit: Option<i64>,
    ) -> Result<Vec<Promotion>> {
        let filter = preferences.filter();
        let candidates = self
            .list_active(&PromotionQuery {
                max_price: Some(preferences.max_price),
                ..PromotionQuery::default()
            })
            .await?;

        let limit = limit.and_then(|l| usize::try_from(l).ok()).unwrap_or(usize::MAX);
        Ok(candidates
            .into_iter()
            .filter(|p| filter.matches(&p.origin, &p.destination, &p.airline))
            .take(limit)
            .collect())
    }

    pub async fn high_discount(&self, min_discount: f64, limit: i64) -> Result<Vec<Promotion>> {
        self.list_active(&PromotionQuery {
            min_discount: Some(min_discount),
            limit: Some(limit),
            ..PromotionQuery::default()
        })
        .await
    }

    /// Get a promotion by ID, active or not
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<Promotion>> {
        let sql = format!("SELECT {} FROM promotions WHERE id = $1", Promotion::COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(Promotion::from_row))
    }

    /// Load several promotions keyed by ID
    pub async fn find_many(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Promotion>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT {} FROM promotions WHERE id = ANY($1)",
            Promotion::COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(Promotion::from_row)
            .map(|promotion| (promotion.id, promotion))
            .collect())
    }

    /// Insert a new active promotion
    ///
    /// `None` when an active listing with the same route and source exists.
    pub async fn create(&self, promotion: &NewPromotion) -> Result<Option<Promotion>> {
        info!(
            "Creating promotion {} -> {} ({})",
            promotion.origin, promotion.destination, promotion.airline
        );

        let sql = format!(
            r#"
            INSERT INTO promotions (
                origin, destination, airline, departure_date, return_date, price_total,
                price_per_person, original_price, discount_percentage, currency, is_round_trip,
                source, source_url, title, description, image_url, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {}
            "#,
            Promotion::COLUMNS
        );

        let row = bind_new_promotion(sqlx::query(&sql), promotion)
            .fetch_one(&self.pool)
            .await;

        match row {
            Ok(row) => Ok(Some(Promotion::from_row(&row))),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Soft-retire a promotion; reports whether it existed
    pub async fn deactivate(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE promotions SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Merge one candidate into the active set in a single statement
    ///
    /// Relies on the partial unique index over
    /// `(origin, destination, source_url) WHERE is_active`. An equal price
    /// makes the conflict branch a no-op and returns no row.
    pub async fn upsert_active(&self, promotion: &NewPromotion) -> Result<UpsertOutcome> {
        let sql = r#"
            INSERT INTO promotions (
                origin, destination, airline, departure_date, return_date, price_total,
                price_per_person, original_price, discount_percentage, currency, is_round_trip,
                source, source_url, title, description, image_url, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (origin, destination, source_url) WHERE is_active
            DO UPDATE SET
                price_total = EXCLUDED.price_total,
                discount_percentage = EXCLUDED.discount_percentage,
                updated_at = NOW()
            WHERE promotions.price_total IS DISTINCT FROM EXCLUDED.price_total
            RETURNING id, (xmax = 0) AS inserted
            "#;

        let row = bind_new_promotion(sqlx::query(sql), promotion)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match row {
            Some(row) if row.get::<bool, _>("inserted") => UpsertOutcome::Created(row.get("id")),
            Some(row) => UpsertOutcome::Updated(row.get("id")),
            None => UpsertOutcome::Unchanged,
        })
    }
}

fn bind_new_promotion<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    promotion: &'q NewPromotion,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(&promotion.origin)
        .bind(&promotion.destination)
        .bind(&promotion.airline)
        .bind(&promotion.departure_date)
        .bind(&promotion.return_date)
        .bind(promotion.price_total)
        .bind(promotion.price_per_person)
        .bind(promotion.original_price)
        .bind(promotion.discount_percentage)
        .bind(&promotion.currency)
        .bind(promotion.is_round_trip)
        .bind(&promotion.source)
        .bind(&promotion.source_url)
        .bind(&promotion.title)
        .bind(&promotion.description)
        .bind(&promotion.image_url)
        .bind(promotion.expires_at)
}

impl PromotionSink for PromotionRepository {
    async fn upsert(&self, promotion: &NewPromotion) -> Result<UpsertOutcome> {
        self.upsert_active(promotion).await
    }
}

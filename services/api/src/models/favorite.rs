//! Favorite models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use crate::models::promotion::Promotion;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub promotion_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Favorite {
    pub const COLUMNS: &'static str = "id, user_id, promotion_id, created_at";

    pub fn from_row(row: &PgRow) -> Self {
        Self {
            id: row.get("id"),
            user_id: row.get("user_id"),
            promotion_id: row.get("promotion_id"),
            created_at: row.get("created_at"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FavoriteWithPromotion {
    #[serde(flatten)]
    pub favorite: Favorite,
    pub promotion: Option<Promotion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FavoriteListQuery {
    pub limit: Option<i64>,
}

//! Favorite repository for database operations

use anyhow::Result;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::favorite::Favorite;

/// Outcome of inserting a favorite pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteInsert {
    Added,
    AlreadyExists,
    /// The promotion id matches no promotion
    UnknownPromotion,
}

/// Favorite repository for database operations
#[derive(Clone)]
pub struct FavoriteRepository {
    pool: PgPool,
}

impl FavoriteRepository {
    /// Create a new favorite repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Flip the favorite state of a pair; returns the new state
    ///
    /// `None` when the promotion does not exist.
    pub async fn toggle(&self, user_id: Uuid, promotion_id: Uuid) -> Result<Option<bool>> {
        let removed = sqlx::query(
            "DELETE FROM user_favorites WHERE user_id = $1 AND promotion_id = $2 RETURNING id",
        )
        .bind(user_id)
        .bind(promotion_id)
        .fetch_optional(&self.pool)
        .await?;

        if removed.is_some() {
            debug!("Favorite removed for user {}", user_id);
            return Ok(Some(false));
        }

        Ok(match self.add(user_id, promotion_id).await? {
            FavoriteInsert::UnknownPromotion => None,
            FavoriteInsert::Added | FavoriteInsert::AlreadyExists => Some(true),
        })
    }

    pub async fn add(&self, user_id: Uuid, promotion_id: Uuid) -> Result<FavoriteInsert> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_favorites (user_id, promotion_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, promotion_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(promotion_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Ok(FavoriteInsert::AlreadyExists),
            Ok(_) => Ok(FavoriteInsert::Added),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Ok(FavoriteInsert::UnknownPromotion)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn remove(&self, user_id: Uuid, promotion_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM user_favorites WHERE user_id = $1 AND promotion_id = $2")
            .bind(user_id)
            .bind(promotion_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Favorites of a user, newest first
    pub async fn list_by_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Favorite>> {
        let sql = format!(
            "SELECT {} FROM user_favorites WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            Favorite::COLUMNS
        );

        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(Favorite::from_row).collect())
    }

    pub async fn count(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_favorites WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn is_favorite(&self, user_id: Uuid, promotion_id: Uuid) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM user_favorites WHERE user_id = $1 AND promotion_id = $2)",
        )
        .bind(user_id)
        .bind(promotion_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::database::{DatabaseConfig, init_pool, run_migrations};
    use sqlx::Row;

    async fn seeded() -> (FavoriteRepository, Uuid, Uuid) {
        let pool = init_pool(&DatabaseConfig::from_env().unwrap()).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let user_id: Uuid = sqlx::query(
            "INSERT INTO users (email, password_hash) VALUES ($1, 'x') RETURNING id",
        )
        .bind(format!("{}@favorites.test", Uuid::new_v4()))
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("id");

        let promotion_id: Uuid = sqlx::query(
            r#"
            INSERT INTO promotions (
                origin, destination, airline, price_total, discount_percentage,
                source, source_url, title
            )
            VALUES ('GYN', 'MIA', 'LATAM', 2450, 45, 'Melhores Destinos', $1, 'Miami')
            RETURNING id
            "#,
        )
        .bind(format!("https://example.test/{}", Uuid::new_v4()))
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("id");

        (FavoriteRepository::new(pool), user_id, promotion_id)
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_toggle_is_its_own_inverse() {
        let (favorites, user_id, promotion_id) = seeded().await;

        assert!(!favorites.is_favorite(user_id, promotion_id).await.unwrap());
        assert_eq!(favorites.toggle(user_id, promotion_id).await.unwrap(), Some(true));
        assert!(favorites.is_favorite(user_id, promotion_id).await.unwrap());
        assert_eq!(favorites.toggle(user_id, promotion_id).await.unwrap(), Some(false));
        assert!(!favorites.is_favorite(user_id, promotion_id).await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_add_reports_existing_pair() {
        let (favorites, user_id, promotion_id) = seeded().await;

        assert_eq!(
            favorites.add(user_id, promotion_id).await.unwrap(),
            FavoriteInsert::Added
        );
        assert_eq!(
            favorites.add(user_id, promotion_id).await.unwrap(),
            FavoriteInsert::AlreadyExists
        );
        assert_eq!(favorites.count(user_id).await.unwrap(), 1);

        favorites.remove(user_id, promotion_id).await.unwrap();
        favorites.remove(user_id, promotion_id).await.unwrap();
        assert_eq!(favorites.count(user_id).await.unwrap(), 0);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_unknown_promotion_is_reported() {
        let (favorites, user_id, _) = seeded().await;
        let missing = Uuid::new_v4();

        assert_eq!(
            favorites.add(user_id, missing).await.unwrap(),
            FavoriteInsert::UnknownPromotion
        );
        assert_eq!(favorites.toggle(user_id, missing).await.unwrap(), None);
        assert_eq!(favorites.count(user_id).await.unwrap(), 0);
    }
}

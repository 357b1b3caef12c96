//! Preference repository for database operations

use anyhow::Result;
use common::preferences::{self, Preferences, add_unique, remove_value};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::preferences::ValidatedUpdate;

/// One of the allow-list columns of a preferences row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceList {
    Origins,
    Destinations,
    Airlines,
}

impl PreferenceList {
    pub fn column(&self) -> &'static str {
        match self {
            PreferenceList::Origins => "preferred_origins",
            PreferenceList::Destinations => "preferred_destinations",
            PreferenceList::Airlines => "preferred_airlines",
        }
    }

    fn values_mut<'a>(&self, preferences: &'a mut Preferences) -> &'a mut Vec<String> {
        match self {
            PreferenceList::Origins => &mut preferences.preferred_origins,
            PreferenceList::Destinations => &mut preferences.preferred_destinations,
            PreferenceList::Airlines => &mut preferences.preferred_airlines,
        }
    }
}

/// Set operation applied to a preference list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListChange {
    Add,
    Remove,
}

/// Preference repository for database operations
#[derive(Clone)]
pub struct PreferenceRepository {
    pool: PgPool,
}

impl PreferenceRepository {
    /// Create a new preference repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_user(&self, user_id: Uuid) -> Result<Option<Preferences>> {
        Ok(preferences::find_by_user(&self.pool, user_id).await?)
    }

    /// Replace the fields present in `update`
    pub async fn update(
        &self,
        user_id: Uuid,
        update: &ValidatedUpdate,
    ) -> Result<Option<Preferences>> {
        info!("Updating preferences for user: {}", user_id);

        let sql = format!(
            r#"
            UPDATE user_preferences
            SET preferred_origins = COALESCE($2, preferred_origins),
                preferred_destinations = COALESCE($3, preferred_destinations),
                max_price = COALESCE($4, max_price),
                preferred_airlines = COALESCE($5, preferred_airlines),
                notification_channels = COALESCE($6, notification_channels),
                notification_frequency = COALESCE($7, notification_frequency),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {}
            "#,
            Preferences::COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(&update.preferred_origins)
            .bind(&update.preferred_destinations)
            .bind(update.max_price)
            .bind(&update.preferred_airlines)
            .bind(update.channel_names())
            .bind(update.notification_frequency.map(|f| f.as_str()))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(Preferences::from_row).transpose()?)
    }

    /// Add or remove one value of a list; a no-op change writes nothing
    pub async fn change_list(
        &self,
        user_id: Uuid,
        list: PreferenceList,
        change: ListChange,
        value: &str,
    ) -> Result<Option<Preferences>> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "SELECT {} FROM user_preferences WHERE user_id = $1 FOR UPDATE",
            Preferences::COLUMNS
        );
        let Some(row) = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        let mut current = Preferences::from_row(&row)?;

        let values = list.values_mut(&mut current);
        let changed = match change {
            ListChange::Add => add_unique(values, value),
            ListChange::Remove => remove_value(values, value),
        };

        if !changed {
            tx.commit().await?;
            return Ok(Some(current));
        }

        let sql = format!(
            "UPDATE user_preferences SET {} = $2, updated_at = NOW() WHERE user_id = $1 RETURNING {}",
            list.column(),
            Preferences::COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(values.as_slice())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(Some(Preferences::from_row(&row)?))
    }
}

//! User repository for database operations

use chrono::{DateTime, Utc};
use common::{
    error::{DatabaseError, DatabaseResult},
    preferences::insert_defaults,
    session::SessionRepository,
};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::{NewUser, UpdateProfile, User};

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user and its default preferences in one transaction
    pub async fn create_with_preferences(&self, new_user: &NewUser) -> DatabaseResult<User> {
        info!("Creating new user: {}", new_user.email);

        let mut tx = self.pool.begin().await.map_err(DatabaseError::Query)?;

        let sql = format!(
            r#"
            INSERT INTO users (
                email, password_hash, full_name,
                email_verification_token, email_verification_expires_at
            )
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            User::COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.full_name)
            .bind(&new_user.email_verification_token)
            .bind(new_user.email_verification_expires_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(DatabaseError::Query)?;
        let user = User::from_row(&row);

        insert_defaults(&mut *tx, user.id).await?;
        tx.commit().await.map_err(DatabaseError::Query)?;

        Ok(user)
    }

    /// Find a user by email (exact, case-sensitive)
    pub async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", User::COLUMNS);

        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(row.as_ref().map(User::from_row))
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", User::COLUMNS);

        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(row.as_ref().map(User::from_row))
    }

    pub async fn email_exists(&self, email: &str) -> DatabaseResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(exists)
    }

    /// Apply the present fields of a profile update
    pub async fn update_profile(
        &self,
        id: Uuid,
        update: &UpdateProfile,
    ) -> DatabaseResult<Option<User>> {
        info!("Updating profile for user: {}", id);

        let sql = format!(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                phone = COALESCE($3, phone),
                telegram_chat_id = COALESCE($4, telegram_chat_id),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            User::COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(id)
            .bind(&update.full_name)
            .bind(&update.phone)
            .bind(&update.telegram_chat_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(row.as_ref().map(User::from_row))
    }

    pub async fn update_password_hash(&self, id: Uuid, password_hash: &str) -> DatabaseResult<()> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(())
    }

    /// Consume a reset token, replace the password hash and drop every
    /// session of the token's owner, all in one transaction
    ///
    /// Returns the owner and how many other sessions were dropped, or `None`
    /// when the token is unknown, expired or already used.
    pub async fn reset_password(
        &self,
        reset_token: &str,
        password_hash: &str,
    ) -> DatabaseResult<Option<(Uuid, u64)>> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::Query)?;

        let Some(id) =
            SessionRepository::consume_reset(&mut *tx, reset_token, Utc::now()).await?
        else {
            return Ok(None);
        };
        info!("Resetting password for user: {}", id);

        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::Query)?;

        let removed = SessionRepository::delete_all_for_user(&mut *tx, id).await?;
        tx.commit().await.map_err(DatabaseError::Query)?;

        Ok(Some((id, removed)))
    }

    pub async fn find_by_verification_token(
        &self,
        token: &str,
    ) -> DatabaseResult<Option<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE email_verification_token = $1",
            User::COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(row.as_ref().map(User::from_row))
    }

    /// Mark the email verified and consume the verification token
    pub async fn mark_email_verified(&self, id: Uuid) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET is_email_verified = TRUE,
                email_verification_token = NULL,
                email_verification_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(())
    }

    /// Issue a fresh verification token for a user
    pub async fn set_verification_token(
        &self,
        id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET email_verification_token = $2,
                email_verification_expires_at = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(())
    }
}

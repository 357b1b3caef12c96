//! Session store shared by the authentication and API services
//!
//! Login sessions and password-reset tokens share the `sessions` table and
//! are told apart by its `kind` column. Callers never inspect the token
//! string to decide what a row is for; they get a [`SessionToken`] variant.
//!
//! Validity is decided at read time: a row is valid iff `now < expires_at`.
//! Expired rows stay in the table until [`SessionRepository::purge_expired`]
//! removes them.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::{PgExecutor, PgPool, Row, postgres::PgRow};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DatabaseError, DatabaseResult};
use crate::token::generate_token;

/// Cookie mirroring the login token for page navigation
pub const SESSION_COOKIE: &str = "voyager_token";

/// Extract the token from an `Authorization: Bearer <token>` value
pub fn parse_bearer(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Lifetime of a login session
pub fn login_session_ttl() -> Duration {
    Duration::days(7)
}

/// Lifetime of a password-reset token
pub fn reset_token_ttl() -> Duration {
    Duration::hours(1)
}

/// Purpose of a row in the `sessions` table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    Login,
    PasswordReset,
}

impl SessionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::Login => "login",
            SessionKind::PasswordReset => "password_reset",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "login" => Some(SessionKind::Login),
            "password_reset" => Some(SessionKind::PasswordReset),
            _ => None,
        }
    }

    fn ttl(&self) -> Duration {
        match self {
            SessionKind::Login => login_session_ttl(),
            SessionKind::PasswordReset => reset_token_ttl(),
        }
    }
}

/// Common owner/expiry interface of every session-table entry
pub trait Expiring {
    fn user_id(&self) -> Uuid;
    fn expires_at(&self) -> DateTime<Utc>;

    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }

    fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }
}

/// Optional client metadata recorded with a login session
#[derive(Debug, Clone, Default)]
pub struct ClientMetadata {
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Authenticated login session
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginSession {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Single-use password-reset token
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub id: Uuid,
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// A row of the session table, typed by purpose
#[derive(Debug, Clone)]
pub enum SessionToken {
    Login(LoginSession),
    Reset(ResetToken),
}

impl Expiring for LoginSession {
    fn user_id(&self) -> Uuid {
        self.user_id
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl Expiring for ResetToken {
    fn user_id(&self) -> Uuid {
        self.user_id
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

impl Expiring for SessionToken {
    fn user_id(&self) -> Uuid {
        match self {
            SessionToken::Login(s) => s.user_id,
            SessionToken::Reset(r) => r.user_id,
        }
    }

    fn expires_at(&self) -> DateTime<Utc> {
        match self {
            SessionToken::Login(s) => s.expires_at,
            SessionToken::Reset(r) => r.expires_at,
        }
    }
}

impl SessionToken {
    pub fn kind(&self) -> SessionKind {
        match self {
            SessionToken::Login(_) => SessionKind::Login,
            SessionToken::Reset(_) => SessionKind::PasswordReset,
        }
    }

    pub fn token(&self) -> &str {
        match self {
            SessionToken::Login(s) => &s.token,
            SessionToken::Reset(r) => &r.token,
        }
    }

    /// The login session this entry grants at `now`, if any
    ///
    /// Reset tokens never authenticate requests.
    pub fn into_valid_login(self, now: DateTime<Utc>) -> Option<LoginSession> {
        match self {
            SessionToken::Login(session) if session.is_valid_at(now) => Some(session),
            _ => None,
        }
    }

    fn from_row(row: &PgRow) -> DatabaseResult<Self> {
        let kind: String = row.get("kind");
        let kind = SessionKind::parse(&kind).ok_or_else(|| DatabaseError::CorruptRow {
            table: "sessions",
            reason: format!("unknown kind '{}'", kind),
        })?;

        let token = match kind {
            SessionKind::Login => SessionToken::Login(LoginSession {
                id: row.get("id"),
                token: row.get("token"),
                user_id: row.get("user_id"),
                expires_at: row.get("expires_at"),
                created_at: row.get("created_at"),
                user_agent: row.get("user_agent"),
                ip_address: row.get("ip_address"),
            }),
            SessionKind::PasswordReset => SessionToken::Reset(ResetToken {
                id: row.get("id"),
                token: row.get("token"),
                user_id: row.get("user_id"),
                expires_at: row.get("expires_at"),
                created_at: row.get("created_at"),
            }),
        };

        Ok(token)
    }
}

/// Session repository for database operations
#[derive(Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Issue a new 7-day login session; existing sessions are left alone
    pub async fn create_login(
        &self,
        user_id: Uuid,
        metadata: &ClientMetadata,
    ) -> DatabaseResult<LoginSession> {
        info!("Creating login session for user: {}", user_id);

        match self.insert(SessionKind::Login, user_id, metadata).await? {
            SessionToken::Login(session) => Ok(session),
            SessionToken::Reset(_) => Err(DatabaseError::CorruptRow {
                table: "sessions",
                reason: "login insert returned a reset token".to_string(),
            }),
        }
    }

    /// Issue a new 1-hour password-reset token
    pub async fn create_reset(&self, user_id: Uuid) -> DatabaseResult<ResetToken> {
        info!("Creating password reset token for user: {}", user_id);

        match self
            .insert(SessionKind::PasswordReset, user_id, &ClientMetadata::default())
            .await?
        {
            SessionToken::Reset(reset) => Ok(reset),
            SessionToken::Login(_) => Err(DatabaseError::CorruptRow {
                table: "sessions",
                reason: "reset insert returned a login session".to_string(),
            }),
        }
    }

    async fn insert(
        &self,
        kind: SessionKind,
        user_id: Uuid,
        metadata: &ClientMetadata,
    ) -> DatabaseResult<SessionToken> {
        let expires_at = Utc::now() + kind.ttl();

        let row = sqlx::query(
            r#"
            INSERT INTO sessions (token, kind, user_id, expires_at, user_agent, ip_address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, token, kind, user_id, expires_at, created_at, user_agent, ip_address
            "#,
        )
        .bind(generate_token())
        .bind(kind.as_str())
        .bind(user_id)
        .bind(expires_at)
        .bind(&metadata.user_agent)
        .bind(&metadata.ip_address)
        .fetch_one(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        SessionToken::from_row(&row)
    }

    /// Look up a session-table entry by its token, whatever its state
    pub async fn find(&self, token: &str) -> DatabaseResult<Option<SessionToken>> {
        let row = sqlx::query(
            r#"
            SELECT id, token, kind, user_id, expires_at, created_at, user_agent, ip_address
            FROM sessions
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(DatabaseError::Query)?;

        row.as_ref().map(SessionToken::from_row).transpose()
    }

    /// Resolve a bearer token to a live login session, failing closed
    pub async fn find_valid_login(&self, token: &str) -> DatabaseResult<Option<LoginSession>> {
        let session = self
            .find(token)
            .await?
            .and_then(|entry| entry.into_valid_login(Utc::now()));

        if session.is_none() {
            debug!("Rejected missing, expired or non-login session token");
        }

        Ok(session)
    }

    /// Look up a password-reset token regardless of expiry
    pub async fn find_reset(&self, token: &str) -> DatabaseResult<Option<ResetToken>> {
        Ok(match self.find(token).await? {
            Some(SessionToken::Reset(reset)) => Some(reset),
            _ => None,
        })
    }

    /// Delete one entry by token; reports whether a row was removed
    pub async fn delete(&self, token: &str) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a live reset token and return its owner
    ///
    /// At most one caller gets `Some` for a given token. Takes an executor
    /// so the reset can run in the same transaction as the password change.
    pub async fn consume_reset<'e, E>(
        executor: E,
        token: &str,
        now: DateTime<Utc>,
    ) -> DatabaseResult<Option<Uuid>>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query(
            r#"
            DELETE FROM sessions
            WHERE token = $1 AND kind = $2 AND expires_at > $3
            RETURNING user_id
            "#,
        )
        .bind(token)
        .bind(SessionKind::PasswordReset.as_str())
        .bind(now)
        .fetch_optional(executor)
        .await
        .map_err(DatabaseError::Query)?;

        Ok(row.map(|row| row.get("user_id")))
    }

    /// Delete every entry (logins and reset tokens) owned by a user
    ///
    /// Takes an executor so it can run inside a caller's transaction.
    pub async fn delete_all_for_user<'e, E>(executor: E, user_id: Uuid) -> DatabaseResult<u64>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(executor)
            .await
            .map_err(DatabaseError::Query)?;

        info!(
            "Invalidated {} session(s) for user: {}",
            result.rows_affected(),
            user_id
        );
        Ok(result.rows_affected())
    }

    /// Remove entries that expired before `now`
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> DatabaseResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        Ok(result.rows_affected())
    }
}

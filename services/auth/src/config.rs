//! Service settings for the authentication service

use anyhow::Result;
use ::config::{Config, Environment};
use serde::Deserialize;

/// Authentication service settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Deployment environment; `production` hides reset tokens from responses
    pub app_env: String,
    /// Public site URL used to build links in emails
    pub site_url: String,
    /// Sender of transactional emails
    pub email_from: String,
    /// Resend API key; emails are skipped when unset
    pub resend_api_key: Option<String>,
    /// Resend endpoint
    pub resend_api_url: String,
    /// Cron expression for the expired-session reaper
    pub session_reaper_schedule: String,
    /// Whether the session cookie carries the `Secure` attribute
    pub cookie_secure: bool,
}

impl AuthSettings {
    /// Load settings from defaults overlaid with environment variables
    ///
    /// # Environment Variables
    /// - `BIND_ADDR` (default: "0.0.0.0:3000")
    /// - `APP_ENV` (default: "development")
    /// - `SITE_URL` (default: "https://levoyager.com.br")
    /// - `EMAIL_FROM` (default: "LeVoyager <noreply@levoyager.com.br>")
    /// - `RESEND_API_KEY` (optional)
    /// - `RESEND_API_URL` (default: "https://api.resend.com/emails")
    /// - `SESSION_REAPER_SCHEDULE` (default: hourly, "0 0 * * * *")
    /// - `COOKIE_SECURE` (default: false)
    pub fn from_env() -> Result<Self> {
        let settings = Config::builder()
            .set_default("bind_addr", "0.0.0.0:3000")?
            .set_default("app_env", "development")?
            .set_default("site_url", "https://levoyager.com.br")?
            .set_default("email_from", "LeVoyager <noreply@levoyager.com.br>")?
            .set_default("resend_api_url", "https://api.resend.com/emails")?
            .set_default("session_reaper_schedule", "0 0 * * * *")?
            .set_default("cookie_secure", false)?
            .add_source(Environment::default().try_parsing(true))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }
}

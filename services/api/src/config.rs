//! Service settings for the API service

use anyhow::Result;
use ::config::{Config, Environment};
use serde::Deserialize;

/// API service settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Base URL of the flight-price aggregation service
    pub voyager_api_url: String,
    /// Shared secret expected in `x-api-key` on ingress endpoints
    pub voyager_api_key: Option<String>,
    /// Timeout for aggregator calls, in seconds
    pub voyager_timeout_secs: u64,
    /// Lifetime of cached aggregator responses, in seconds
    pub voyager_cache_ttl_secs: u64,
}

impl Settings {
    /// Load settings from defaults overlaid with environment variables
    ///
    /// # Environment Variables
    /// - `BIND_ADDR` (default: "0.0.0.0:3001")
    /// - `VOYAGER_API_URL` (default: "http://localhost:5000")
    /// - `VOYAGER_API_KEY` (optional; ingress is refused while unset)
    /// - `VOYAGER_TIMEOUT_SECS` (default: 10)
    /// - `VOYAGER_CACHE_TTL_SECS` (default: 300)
    pub fn from_env() -> Result<Self> {
        let settings = Config::builder()
            .set_default("bind_addr", "0.0.0.0:3001")?
            .set_default("voyager_api_url", "http://localhost:5000")?
            .set_default("voyager_timeout_secs", 10)?
            .set_default("voyager_cache_ttl_secs", 300)?
            .add_source(Environment::default().try_parsing(true))
            .build()?;

        let mut settings: Settings = settings.try_deserialize()?;
        settings.voyager_api_url = settings.voyager_api_url.trim_end_matches('/').to_string();
        Ok(settings)
    }
}

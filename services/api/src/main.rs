use anyhow::Result;
use common::{
    cache::{RedisConfig, RedisPool},
    database::{self, DatabaseConfig},
    session::SessionRepository,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod config;
mod error;
mod guard;
mod ingest;
mod middleware;
mod models;
mod repositories;
mod routes;
mod state;
mod voyager;

use crate::{
    config::Settings,
    repositories::{
        AlertRepository, FavoriteRepository, PreferenceRepository, PromotionRepository,
    },
    state::AppState,
    voyager::VoyagerClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting API service");

    let settings = Settings::from_env()?;
    if settings.voyager_api_key.is_none() {
        tracing::warn!("VOYAGER_API_KEY is not set; ingestion endpoints will reject every call");
    }

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    // Check database connectivity
    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    database::run_migrations(&pool).await?;

    // Proxy cache; an unreachable Redis only costs cache hits
    let redis_config = RedisConfig::from_env()?;
    let cache = RedisPool::new(&redis_config).await?;
    match cache.health_check().await {
        Ok(true) => info!("Redis connection successful"),
        _ => tracing::warn!("Redis is unreachable; proxy responses will not be cached"),
    }

    let voyager = VoyagerClient::new(&settings, cache)?;

    let app_state = AppState {
        sessions: SessionRepository::new(pool.clone()),
        promotions: PromotionRepository::new(pool.clone()),
        alerts: AlertRepository::new(pool.clone()),
        favorites: FavoriteRepository::new(pool.clone()),
        preferences: PreferenceRepository::new(pool),
        voyager,
        settings: settings.clone(),
    };

    info!("API service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    info!("API service listening on {}", settings.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

use anyhow::Result;
use common::{
    database::{self, DatabaseConfig},
    session::SessionRepository,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod config;
mod error;
mod mailer;
mod middleware;
mod models;
mod password;
mod reaper;
mod repositories;
mod routes;
mod service;
mod validation;

use crate::{config::AuthSettings, mailer::Mailer, service::AuthService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRepository,
    pub auth: AuthService,
    pub settings: AuthSettings,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting authentication service");

    let settings = AuthSettings::from_env()?;

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

    let sessions = SessionRepository::new(pool.clone());
    let _reaper =
        reaper::start_session_reaper(sessions.clone(), &settings.session_reaper_schedule).await?;

    let mailer = Mailer::from_settings(&settings);
    info!("Email delivery enabled: {}", mailer.is_enabled());

    let auth = AuthService::new(
        pool,
        mailer,
        settings.site_url.clone(),
        !settings.is_production(),
    );

    let app_state = AppState {
        sessions,
        auth,
        settings: settings.clone(),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    info!("Authentication service listening on {}", settings.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

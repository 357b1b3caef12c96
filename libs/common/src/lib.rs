//! Common library for the Voyager services
//!
//! This crate provides shared functionality used by the auth and api
//! services: database connectivity and migrations, the Redis cache, the
//! session store, opaque token generation and the user preference record.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, init_pool, health_check};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     let is_healthy = health_check(&pool).await?;
//!     println!("Database health check: {}", is_healthy);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod database;
pub mod error;
pub mod preferences;
pub mod session;
pub mod token;

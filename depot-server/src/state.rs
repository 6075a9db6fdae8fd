//! Application state for depot-server

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use crate::auth::{RateLimiter, SessionService, session::SessionKeyConfig};
use crate::config::Config;
use crate::db::{PgStore, Store};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Datastore (Postgres in production, in-memory in tests)
    pub store: Arc<dyn Store>,
    /// Session token issuer/verifier for all three kinds
    pub sessions: Arc<SessionService>,
    /// Admin unlock PIN
    pub admin_access_pin: Option<String>,
    /// Shared runner PIN (legacy unlock without runner id)
    pub runner_access_pin: Option<String>,
    /// Whether session cookies carry `Secure`
    pub cookie_secure: bool,
    /// Rate limiter for unlock routes
    pub rate_limiter: RateLimiter,
    pub unlock_limit_per_minute: u32,
}

impl AppState {
    /// Connect to Postgres, run migrations and build the state
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;
        tracing::info!("Database connected");

        let store = PgStore::new(pool);
        store.migrate().await?;
        tracing::info!("Database migrations applied");

        Ok(Self::with_store(Arc::new(store), config))
    }

    /// Build the state around an existing store
    pub fn with_store(store: Arc<dyn Store>, config: &Config) -> Self {
        let sessions = SessionService::new(
            SessionKeyConfig {
                secret: &config.admin_session_secret,
                ttl_hours: config.admin_session_ttl_hours,
            },
            SessionKeyConfig {
                secret: &config.location_session_secret,
                ttl_hours: config.location_session_ttl_hours,
            },
            SessionKeyConfig {
                secret: &config.runner_session_secret,
                ttl_hours: config.runner_session_ttl_hours,
            },
        );

        Self {
            store,
            sessions: Arc::new(sessions),
            admin_access_pin: config.admin_access_pin.clone(),
            runner_access_pin: config.runner_access_pin.clone(),
            cookie_secure: config.cookie_secure(),
            rate_limiter: RateLimiter::new(),
            unlock_limit_per_minute: config.unlock_rate_limit_per_minute,
        }
    }
}

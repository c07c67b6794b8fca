use std::sync::Arc;

use anyhow::Result;
use config::{Config, Environment};
use sea_orm::Database;
use serde::Deserialize;
use tracing::{debug, info};

use crate::auth::notifier::LogNotifier;
use crate::schemas::AppState;

/// Settings read from the process environment (and `.env`) at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    /// HMAC secret for session tokens
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub otp_ttl_minutes: i64,
    /// Base URL of the web client, used for CORS and links in messages
    pub frontend_url: String,
}

impl AppConfig {
    /// Loads `.env` when present, then reads `DATABASE_URL`, `BIND_ADDRESS`,
    /// `JWT_SECRET`, `JWT_EXPIRY_HOURS`, `OTP_TTL_MINUTES` and `FRONTEND_URL`.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = Config::builder()
            .set_default("database_url", "sqlite://lexdesk.db?mode=rwc")?
            .set_default("bind_address", "0.0.0.0:3000")?
            .set_default("jwt_secret", "change-me")?
            .set_default("jwt_expiry_hours", 24_i64)?
            .set_default("otp_ttl_minutes", 10_i64)?
            .set_default("frontend_url", "http://localhost:5173")?
            .add_source(Environment::default().try_parsing(true))
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        if config.jwt_secret == "change-me" {
            tracing::warn!("JWT_SECRET is not set, using the built-in development secret");
        }
        debug!("Configuration loaded, bind address {}", config.bind_address);
        Ok(config)
    }

    /// Applies command line overrides.
    pub fn with_overrides(mut self, database_url: Option<String>, bind_address: Option<String>) -> Self {
        if let Some(url) = database_url {
            self.database_url = url;
        }
        if let Some(address) = bind_address {
            self.bind_address = address;
        }
        self
    }
}

/// Connects to the database and assembles the shared handler state.
pub async fn initialize_app_state(config: AppConfig) -> Result<AppState> {
    info!("Connecting to database: {}", config.database_url);
    let db = Database::connect(&config.database_url).await?;

    Ok(AppState {
        db,
        config: Arc::new(config),
        notifier: Arc::new(LogNotifier),
    })
}

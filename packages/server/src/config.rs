use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub openai_api_key: String,
    pub openai_model: Option<String>,
    /// Shared secret for webhook signature verification. When unset,
    /// signatures are not required (development).
    pub webhook_secret: Option<String>,
    /// Bearer token accepted for moderator actions.
    pub moderator_token: String,
    /// Recency window for intake, in hours.
    pub intake_window_hours: i64,
    /// Minimum extracted-text length for intake.
    pub intake_min_content_len: usize,
    /// Health: queue backlog above this is unhealthy.
    pub health_max_queue_backlog: i64,
    /// Health: rolling success rate below this floor is unhealthy.
    pub health_success_rate_floor: f64,
    /// Health: no processed message within this many hours is unhealthy.
    pub health_staleness_hours: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            openai_api_key: env::var("OPENAI_API_KEY").context("OPENAI_API_KEY must be set")?,
            openai_model: env::var("OPENAI_MODEL").ok(),
            webhook_secret: env::var("WEBHOOK_SECRET").ok(),
            moderator_token: env::var("MODERATOR_TOKEN").context("MODERATOR_TOKEN must be set")?,
            intake_window_hours: env::var("INTAKE_WINDOW_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .context("INTAKE_WINDOW_HOURS must be a valid number")?,
            intake_min_content_len: env::var("INTAKE_MIN_CONTENT_LEN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("INTAKE_MIN_CONTENT_LEN must be a valid number")?,
            health_max_queue_backlog: env::var("HEALTH_MAX_QUEUE_BACKLOG")
                .unwrap_or_else(|_| "500".to_string())
                .parse()
                .context("HEALTH_MAX_QUEUE_BACKLOG must be a valid number")?,
            health_success_rate_floor: env::var("HEALTH_SUCCESS_RATE_FLOOR")
                .unwrap_or_else(|_| "0.05".to_string())
                .parse()
                .context("HEALTH_SUCCESS_RATE_FLOOR must be a valid number")?,
            health_staleness_hours: env::var("HEALTH_STALENESS_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .context("HEALTH_STALENESS_HOURS must be a valid number")?,
        })
    }
}

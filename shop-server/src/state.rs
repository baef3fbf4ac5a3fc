//! Application state for shop-server

use std::sync::Arc;

use aws_sdk_sesv2::Client as SesClient;
use chrono::FixedOffset;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::auth::rate_limit::RateLimiter;
use crate::config::{Config, MailTransport};
use crate::email::{LogMailer, Mailer, SesMailer};
use crate::period::parse_utc_offset;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// JWT secret for sessions
    pub jwt_secret: String,
    /// Session lifetime in days
    pub session_ttl_days: i64,
    /// Add `Secure` to session cookies (everywhere but development)
    pub secure_cookies: bool,
    /// Base of magic-link URLs
    pub api_base_url: String,
    /// Default and only allowed prefix of post-login redirects
    pub auth_redirect_url: String,
    /// Business offset used when a metrics request carries none
    pub default_utc_offset: FixedOffset,
    /// Outbound mail
    pub mailer: Arc<dyn Mailer>,
    /// Rate limiter for `POST /authenticate`
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Connect, migrate and pick the mail transport
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        let mailer: Arc<dyn Mailer> = match config.mail_transport {
            MailTransport::Log => {
                tracing::info!("Mail transport: log");
                Arc::new(LogMailer)
            }
            MailTransport::Ses => {
                let aws_config =
                    aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
                let ses = if let Ok(ses_region) = std::env::var("SES_REGION") {
                    let ses_config = aws_config
                        .to_builder()
                        .region(aws_config::Region::new(ses_region))
                        .build();
                    SesClient::new(&ses_config)
                } else {
                    SesClient::new(&aws_config)
                };
                tracing::info!("Mail transport: ses");
                Arc::new(SesMailer::new(ses, config.ses_from_email.clone()))
            }
        };

        Self::with_parts(config, pool, mailer)
    }

    /// Assemble state around an existing pool and mailer
    pub fn with_parts(
        config: &Config,
        pool: PgPool,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, BoxError> {
        Ok(Self {
            pool,
            jwt_secret: config.jwt_secret.clone(),
            session_ttl_days: config.session_ttl_days,
            secure_cookies: config.environment != "development",
            api_base_url: config.api_base_url.clone(),
            auth_redirect_url: config.auth_redirect_url.clone(),
            default_utc_offset: parse_utc_offset(config.utc_offset_minutes)?,
            mailer,
            rate_limiter: RateLimiter::new(),
        })
    }
}

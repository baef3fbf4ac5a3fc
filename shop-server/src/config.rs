//! Server configuration

use crate::period::MAX_UTC_OFFSET_MINUTES;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// How outbound mail is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTransport {
    /// Write the magic link to the log (development)
    Log,
    /// Send through AWS SES
    Ses,
}

impl MailTransport {
    fn parse(value: &str) -> Result<Self, BoxError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "log" => Ok(Self::Log),
            "ses" => Ok(Self::Ses),
            other => Err(format!("MAIL_TRANSPORT must be 'log' or 'ses', got '{other}'").into()),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// Maximum pooled database connections
    pub database_max_connections: u32,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// HS256 secret for session tokens
    pub jwt_secret: String,
    /// Session lifetime in days
    pub session_ttl_days: i64,
    /// Public base URL of this API, used to build magic links
    pub api_base_url: String,
    /// Where the web app wants users sent after a magic link; also the
    /// only prefix accepted for `redirect` on redemption
    pub auth_redirect_url: String,
    /// Mail delivery transport
    pub mail_transport: MailTransport,
    /// SES sender email address
    pub ses_from_email: String,
    /// Business UTC offset in minutes, used when a metrics caller sends none
    pub utc_offset_minutes: i32,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Parse an optional numeric env var, rejecting garbage instead of silently defaulting
    fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T, BoxError> {
        match std::env::var(name) {
            Ok(raw) if !raw.trim().is_empty() => raw
                .trim()
                .parse()
                .map_err(|_| format!("{name} has an invalid value: '{raw}'").into()),
            _ => Ok(default),
        }
    }

    fn check_utc_offset(minutes: i32) -> Result<i32, BoxError> {
        if !(-MAX_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&minutes) {
            return Err("UTC_OFFSET_MINUTES must be within ±840".into());
        }
        Ok(minutes)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let utc_offset_minutes = Self::check_utc_offset(Self::parse_var("UTC_OFFSET_MINUTES", 0)?)?;

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            database_max_connections: Self::parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            http_port: Self::parse_var("HTTP_PORT", 3333)?,
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            session_ttl_days: Self::parse_var("SESSION_TTL_DAYS", 7)?,
            api_base_url: std::env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3333".into()),
            auth_redirect_url: std::env::var("AUTH_REDIRECT_URL")
                .unwrap_or_else(|_| "http://localhost:5173".into()),
            mail_transport: MailTransport::parse(
                &std::env::var("MAIL_TRANSPORT").unwrap_or_else(|_| "log".into()),
            )?,
            ses_from_email: std::env::var("SES_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@example.com".into()),
            utc_offset_minutes,
            environment,
        })
    }
}

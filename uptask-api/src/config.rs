/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 4000)
/// - `DATABASE_URL`: PostgreSQL connection string (unset: in-memory store)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Secret key for session token signing (required)
/// - `JWT_EXPIRATION_DAYS`: Session lifetime (default: 180)
/// - `TOKEN_TTL_MINUTES`: Confirmation/reset code lifetime (default: 10)
/// - `FRONTEND_URL`: Web client base URL (default: http://localhost:5173)
/// - `ENABLE_HSTS`: Send `Strict-Transport-Security` (default: false)
/// - `SMTP_HOST`, `SMTP_PORT`, `SMTP_FROM`, `SMTP_USER`, `SMTP_PASSWORD`:
///   SMTP relay (unset: emails are logged)
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use uptask_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use uptask_shared::{
    auth::jwt::DEFAULT_SESSION_DAYS,
    email::{smtp::SmtpConfig, DEFAULT_FROM},
    models::token::DEFAULT_TOKEN_TTL_MINUTES,
};

/// Default API port
pub const DEFAULT_PORT: u16 = 4000;

/// Default web client URL
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

/// Longest accepted session lifetime
pub const MAX_SESSION_DAYS: i64 = 3650;

/// Longest accepted confirmation/reset code lifetime (one week)
pub const MAX_TOKEN_TTL_MINUTES: i64 = 7 * 24 * 60;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration, `None` runs on the in-memory store
    pub database: Option<DatabaseConfig>,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Account workflow settings
    pub account: AccountConfig,

    /// SMTP relay, `None` logs emails instead of sending them
    pub smtp: Option<SmtpSettings>,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Web client base URL, allowed by CORS
    pub frontend_url: String,

    /// Whether responses carry `Strict-Transport-Security` (HTTPS deployments)
    pub enable_hsts: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    /// Session token lifetime in days
    pub expiration_days: i64,
}

/// Confirmation and reset code settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Minutes a code stays redeemable
    pub token_ttl_minutes: i64,
}

/// SMTP relay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub from: String,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl From<&SmtpSettings> for SmtpConfig {
    fn from(settings: &SmtpSettings) -> Self {
        SmtpConfig {
            host: settings.host.clone(),
            port: settings.port,
            from: settings.from.clone(),
            user: settings.user.clone(),
            password: settings.password.clone(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `JWT_SECRET` is missing or shorter than 32 characters
    /// - A numeric variable doesn't parse
    /// - A lifetime is outside the range checked by [`Config::validate`]
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = parse_var("API_PORT", DEFAULT_PORT)?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| DEFAULT_FRONTEND_URL.to_string());
        let enable_hsts = parse_var("ENABLE_HSTS", false)?;

        let database = match optional_var("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            }),
            None => None,
        };

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let expiration_days = parse_var("JWT_EXPIRATION_DAYS", DEFAULT_SESSION_DAYS)?;
        let token_ttl_minutes = parse_var("TOKEN_TTL_MINUTES", DEFAULT_TOKEN_TTL_MINUTES)?;

        let smtp = match optional_var("SMTP_HOST") {
            Some(host) => Some(SmtpSettings {
                host,
                port: parse_var("SMTP_PORT", uptask_shared::email::smtp::DEFAULT_SMTP_PORT)?,
                from: env::var("SMTP_FROM").unwrap_or_else(|_| DEFAULT_FROM.to_string()),
                user: optional_var("SMTP_USER"),
                password: optional_var("SMTP_PASSWORD"),
            }),
            None => None,
        };

        let config = Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                frontend_url,
                enable_hsts,
            },
            database,
            jwt: JwtConfig {
                secret: jwt_secret,
                expiration_days,
            },
            account: AccountConfig { token_ttl_minutes },
            smtp,
        };
        config.validate()?;

        Ok(config)
    }

    /// Checks the session and code lifetimes are within range
    ///
    /// # Errors
    ///
    /// Returns an error if `JWT_EXPIRATION_DAYS` is outside
    /// `1..=MAX_SESSION_DAYS` or `TOKEN_TTL_MINUTES` is outside
    /// `1..=MAX_TOKEN_TTL_MINUTES`
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(1..=MAX_SESSION_DAYS).contains(&self.jwt.expiration_days) {
            anyhow::bail!("JWT_EXPIRATION_DAYS must be between 1 and {MAX_SESSION_DAYS}");
        }
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&self.account.token_ttl_minutes) {
            anyhow::bail!("TOKEN_TTL_MINUTES must be between 1 and {MAX_TOKEN_TTL_MINUTES}");
        }
        Ok(())
    }

    /// Configuration for tests and local tooling: in-memory store, no SMTP
    pub fn for_testing(jwt_secret: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: DEFAULT_PORT,
                frontend_url: DEFAULT_FRONTEND_URL.to_string(),
                enable_hsts: false,
            },
            database: None,
            jwt: JwtConfig {
                secret: jwt_secret.into(),
                expiration_days: DEFAULT_SESSION_DAYS,
            },
            account: AccountConfig {
                token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            },
            smtp: None,
        }
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional_var(name) {
        Some(value) => value
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{name} is invalid: {e}")),
        None => Ok(default),
    }
}

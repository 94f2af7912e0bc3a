use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use common_auth::{config::DEFAULT_TOKEN_TTL_SECONDS, JwtConfig};

pub const DEFAULT_PAYMENT_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://localhost:5174",
];

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    pub payment_secret_key: Option<String>,
    pub payment_api_base: String,
    pub payment_timeout: Duration,
    pub allowed_origins: Vec<String>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).and_then(|value| normalize_optional(&value));

        let host: IpAddr = var("HOST")
            .unwrap_or_else(|| "0.0.0.0".to_string())
            .parse()
            .context("Failed to parse HOST")?;
        let port: u16 = parse_or(var("PORT"), 5000).context("Failed to parse PORT")?;

        let secret = var("ACCESS_TOKEN_SECRET")
            .ok_or_else(|| anyhow!("ACCESS_TOKEN_SECRET must be set"))?;
        let ttl = parse_or(var("ACCESS_TOKEN_TTL_SECONDS"), DEFAULT_TOKEN_TTL_SECONDS)
            .context("Failed to parse ACCESS_TOKEN_TTL_SECONDS")?;
        if ttl <= 0 {
            return Err(anyhow!("ACCESS_TOKEN_TTL_SECONDS must be positive"));
        }
        let leeway = parse_or(var("JWT_LEEWAY_SECONDS"), 0u32)
            .context("Failed to parse JWT_LEEWAY_SECONDS")?;

        let timeout_secs = parse_or(var("PAYMENT_TIMEOUT_SECONDS"), 10u64)
            .context("Failed to parse PAYMENT_TIMEOUT_SECONDS")?;

        let allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .map(|value| parse_list(&value))
            .unwrap_or_else(|| DEFAULT_ORIGINS.iter().map(|o| o.to_string()).collect());

        Ok(Self {
            bind_addr: SocketAddr::new(host, port),
            database_url: var("DATABASE_URL"),
            database_max_connections: parse_or(var("DATABASE_MAX_CONNECTIONS"), 5u32)
                .context("Failed to parse DATABASE_MAX_CONNECTIONS")?,
            jwt: JwtConfig::new(secret).with_leeway(leeway).with_token_ttl(ttl),
            payment_secret_key: var("PAYMENT_SECRET_KEY"),
            payment_api_base: var("PAYMENT_API_BASE")
                .unwrap_or_else(|| DEFAULT_PAYMENT_API_BASE.to_string()),
            payment_timeout: Duration::from_secs(timeout_secs),
            allowed_origins,
        })
    }
}

fn parse_or<T>(value: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => Ok(raw.parse::<T>()?),
        None => Ok(default),
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter_map(normalize_optional)
        .collect()
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

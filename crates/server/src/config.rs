use log::info;
use std::str::FromStr;

use crate::error::ConfigError;

pub const DEFAULT_PUBLIC_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub base_url: String,
    pub api_key: String,
    pub public_base_url: String,
    pub http_host: String,
    pub http_port: u16,
    pub log_level: String,
    pub revalidate_seconds: u64,
    pub live_poll_interval_seconds: u64,
    pub live_idle_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn optional<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

impl ServerConfig {
    /// Reads `.env` (when present) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenv::dotenv() {
            Ok(path) => println!("Loaded environment from: {}", path.display()),
            Err(_) => println!("No .env file found, using process environment"),
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. The API base URL and
    /// key are required; everything else has a default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = required(&lookup, "COINGECKO_BASE_URL")?;
        let api_key = required(&lookup, "COINGECKO_API_KEY")?;

        Ok(ServerConfig {
            base_url,
            api_key,
            public_base_url: optional(&lookup, "COINGECKO_PUBLIC_URL", DEFAULT_PUBLIC_URL.to_string())?,
            http_host: optional(&lookup, "HTTP_HOST", "0.0.0.0".to_string())?,
            http_port: optional(&lookup, "HTTP_PORT", 8080)?,
            log_level: optional(&lookup, "LOG_LEVEL", "INFO".to_string())?,
            revalidate_seconds: optional(&lookup, "REVALIDATE_SECONDS", 60)?,
            live_poll_interval_seconds: optional(&lookup, "LIVE_POLL_INTERVAL_SECONDS", 30)?,
            live_idle_timeout_seconds: optional(&lookup, "LIVE_IDLE_TIMEOUT_SECONDS", 300)?,
            request_timeout_seconds: optional(&lookup, "REQUEST_TIMEOUT_SECONDS", 10)?,
        })
    }

    pub fn setup_logging(&self) {
        shared::init_logging(&self.log_level);
        info!("Upstream API: {} (public: {})", self.base_url, self.public_base_url);
    }
}

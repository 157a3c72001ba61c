// src/config.rs

// 🌍 Standard library
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

// 📦 External crates
use thiserror::Error;
use url::Url;

// 🧠 Internal modules
use crate::async_actors::watch::PRICE_WATCH_INTERVAL;
use crate::domain::cache::PRICE_CACHE_TTL;
use crate::domain::provider::ALPHAVANTAGE_BASE_URL;

const API_KEY_VAR: &str = "ALPHAVANTAGE_API_KEY";
const BASE_URL_VAR: &str = "ALPHAVANTAGE_BASE_URL";
const BIND_ADDR_VAR: &str = "HTTP_BIND_ADDR";
const POLL_INTERVAL_VAR: &str = "PRICE_POLL_INTERVAL_SECS";
const CACHE_TTL_VAR: &str = "PRICE_CACHE_TTL_SECS";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub base_url: Url,
    pub bind_addr: SocketAddr,
    pub poll_interval: Duration,
    pub cache_ttl: Duration,
}

impl AppConfig {
    /// Load from the process environment.
    ///
    /// # Errors
    /// [`ConfigError::Missing`] without an API key, [`ConfigError::Invalid`] for any
    /// value that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing(API_KEY_VAR))?;

        let base_url = lookup(BASE_URL_VAR).unwrap_or_else(|| ALPHAVANTAGE_BASE_URL.to_string());
        let bind_addr = lookup(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let poll_interval = lookup(POLL_INTERVAL_VAR);
        let cache_ttl = lookup(CACHE_TTL_VAR);

        Ok(Self {
            api_key,
            base_url: parse(BASE_URL_VAR, &base_url)?,
            bind_addr: parse(BIND_ADDR_VAR, &bind_addr)?,
            poll_interval: seconds(POLL_INTERVAL_VAR, poll_interval, PRICE_WATCH_INTERVAL)?,
            cache_ttl: seconds(CACHE_TTL_VAR, cache_ttl, PRICE_CACHE_TTL)?,
        })
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

fn seconds(
    var: &'static str,
    value: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => match parse::<u64>(var, &value)? {
            0 => Err(ConfigError::Invalid {
                var,
                reason: "must be at least one second".into(),
            }),
            secs => Ok(Duration::from_secs(secs)),
        },
    }
}

//! Environment-driven runtime configuration

use std::env;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::aggregation::charts::DEFAULT_TOP_K;
use crate::aggregation::engine::EngineSettings;
use crate::error::ConfigError;
use crate::keys::parser::DEFAULT_ROOT;
use crate::models::taxonomy::Taxonomy;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_UPSTREAM_URL: &str = "http://127.0.0.1:9000/tags/series";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Deployment environment name (`ENVIRONMENT`, default `sandbox`).
pub fn get_environment() -> String {
    env::var("ENVIRONMENT")
        .map(|v| v.trim().to_lowercase())
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| "sandbox".to_string())
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub port: u16,
    pub upstream_url: Url,
    pub upstream_token: Option<String>,
    pub fetch_timeout: Duration,
    pub cache_ttl: Duration,
    pub cache_capacity: usize,
    pub top_k: usize,
    pub root_marker: String,
    pub taxonomy: Taxonomy,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let upstream_raw = get("UPSTREAM_URL").unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string());
        let upstream_url = parse_upstream_url(&upstream_raw)?;

        let taxonomy = match get("TAXONOMY_PATH") {
            Some(path) => Taxonomy::load(&path)?,
            None => Taxonomy::default(),
        };

        Ok(Self {
            environment: get("ENVIRONMENT")
                .map(|v| v.to_lowercase())
                .unwrap_or_else(|| "sandbox".to_string()),
            port: parse_or("PORT", get("PORT"), DEFAULT_PORT),
            upstream_url,
            upstream_token: get("UPSTREAM_TOKEN"),
            fetch_timeout: Duration::from_secs(parse_or(
                "FETCH_TIMEOUT_SECS",
                get("FETCH_TIMEOUT_SECS"),
                DEFAULT_FETCH_TIMEOUT_SECS,
            )),
            cache_ttl: Duration::from_secs(parse_or(
                "CACHE_TTL_SECS",
                get("CACHE_TTL_SECS"),
                DEFAULT_CACHE_TTL_SECS,
            )),
            cache_capacity: parse_or("CACHE_CAPACITY", get("CACHE_CAPACITY"), DEFAULT_CACHE_CAPACITY),
            top_k: parse_or("TOP_K", get("TOP_K"), DEFAULT_TOP_K),
            root_marker: get("ROOT_MARKER").unwrap_or_else(|| DEFAULT_ROOT.to_string()),
            taxonomy,
        })
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "production" | "prod")
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            root: self.root_marker.clone(),
            top_k: self.top_k,
        }
    }
}

fn parse_upstream_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUpstreamUrl {
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUpstreamUrl {
            value: raw.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match raw {
        None => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(key, value = %value, default = %default, "Invalid value, using default");
            default
        }),
    }
}

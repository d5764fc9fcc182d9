//! Runtime configuration read from the environment.

use anyhow::{Context, Result};
use std::net::SocketAddr;

pub const DATABASE_URL_VAR: &str = "STAR_CHART_DATABASE_URL";
pub const BIND_ADDR_VAR: &str = "STAR_CHART_BIND_ADDR";
pub const LOG_VAR: &str = "STAR_CHART_LOG";
pub const CORS_ORIGIN_VAR: &str = "STAR_CHART_CORS_ORIGIN";

const DEFAULT_DATABASE_URL: &str = "sqlite:star_chart.db";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_LOG: &str = "info";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Default log filter, used when `RUST_LOG` is not set
    pub log_level: String,
    pub cors_origin: String,
    pub max_connections: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            log_level: DEFAULT_LOG.to_string(),
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let bind_addr_raw = value(BIND_ADDR_VAR, DEFAULT_BIND_ADDR);
        let bind_addr = bind_addr_raw
            .parse::<SocketAddr>()
            .with_context(|| format!("{} is not a socket address: {}", BIND_ADDR_VAR, bind_addr_raw))?;

        let cors_origin = value(CORS_ORIGIN_VAR, DEFAULT_CORS_ORIGIN);
        cors_origin
            .parse::<axum::http::HeaderValue>()
            .with_context(|| format!("{} is not a valid origin: {}", CORS_ORIGIN_VAR, cors_origin))?;

        Ok(Self {
            database_url: value(DATABASE_URL_VAR, DEFAULT_DATABASE_URL),
            bind_addr,
            log_level: value(LOG_VAR, DEFAULT_LOG),
            cors_origin,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        })
    }
}

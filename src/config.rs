use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use anyhow::{Context, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// Sentry DSN; error reporting stays off when unset.
    pub sentry_dsn: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            database_url: "sqlite://todos.db".to_string(),
            max_connections: 5,
            sentry_dsn: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> { Self::from_lookup(|key| std::env::var(key).ok()) }

    /// Builds a config from any key lookup. Unset or blank keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Ok(Self {
            host: parse_or(get("HOST"), "HOST", defaults.host)?,
            port: parse_or(get("PORT"), "PORT", defaults.port)?,
            database_url: get("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: parse_or(get("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            sentry_dsn: get("SENTRY_URL"),
        })
    }

    pub fn addr(&self) -> SocketAddr { SocketAddr::new(self.host, self.port) }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value.trim().parse().with_context(|| format!("invalid {key} `{value}`")),
        None => Ok(default),
    }
}

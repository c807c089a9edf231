//! Process configuration, read from the environment.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::jobs::PollerConfig;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Where job records are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Redis { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Base URL of the AI + license backend.
    pub backend_url: String,
    /// Per-request timeout for backend calls.
    pub http_timeout: Duration,
    pub poller: PollerConfig,
    pub worker_concurrency: usize,
    pub store: StoreBackend,
    /// Expiry of stored job records, restarted on every write.
    pub job_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            http_timeout: Duration::from_secs(120),
            poller: PollerConfig::default(),
            worker_concurrency: 4,
            store: StoreBackend::InMemory,
            job_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; unset and blank variables take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let bind_addr = parse(&get, "GOBOT_BIND_ADDR")?.unwrap_or(defaults.bind_addr);
        let backend_url = get("GOBOT_BACKEND_URL")
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.backend_url);
        let http_timeout = parse::<u64, _>(&get, "GOBOT_HTTP_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);

        let interval = parse::<u64, _>(&get, "GOBOT_POLL_INTERVAL_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.poller.interval);
        if interval.is_zero() {
            return Err(invalid("GOBOT_POLL_INTERVAL_MS", "0", "must be positive"));
        }
        // 0 disables the attempt bound.
        let max_attempts = match parse::<u32, _>(&get, "GOBOT_POLL_MAX_ATTEMPTS")? {
            Some(0) => None,
            Some(n) => Some(n),
            None => defaults.poller.max_attempts,
        };
        let not_found_grace = parse(&get, "GOBOT_POLL_NOT_FOUND_GRACE")?
            .unwrap_or(defaults.poller.not_found_grace);

        let worker_concurrency = parse::<usize, _>(&get, "GOBOT_WORKER_CONCURRENCY")?
            .unwrap_or(defaults.worker_concurrency);
        if worker_concurrency == 0 {
            return Err(invalid("GOBOT_WORKER_CONCURRENCY", "0", "must be at least 1"));
        }

        let persistent = parse::<bool, _>(&get, "USE_PERSISTENT_STORES")?.unwrap_or(false);
        let store = if persistent {
            StoreBackend::Redis {
                url: get("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string()),
            }
        } else {
            StoreBackend::InMemory
        };
        let job_ttl = parse::<u64, _>(&get, "GOBOT_JOB_TTL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.job_ttl);
        if job_ttl.is_zero() {
            return Err(invalid("GOBOT_JOB_TTL_SECS", "0", "must be positive"));
        }

        Ok(Self {
            bind_addr,
            backend_url,
            http_timeout,
            poller: PollerConfig {
                interval,
                max_attempts,
                not_found_grace,
            },
            worker_concurrency,
            store,
            job_ttl,
        })
    }
}

fn parse<T, G>(get: &G, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(var)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| invalid(var, &raw, e.to_string()))
        })
        .transpose()
}

fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.into(),
    }
}

use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use anyhow::{Error, anyhow, bail};
use favicon::{
    Classification,
    network::{DEFAULT_PROBE_TIMEOUT, DEFAULT_PROBE_URL},
    resolve::DEFAULT_ICON_TIMEOUT,
};
use tracing::{info, warn};

use crate::auth::TOKEN_TTL;

pub struct Config {
    pub port: u16,
    pub redis_url: Option<String>,
    pub admin_password: String,
    pub probe_url: String,
    pub probe_timeout: Duration,
    pub icon_timeout: Duration,
    pub token_ttl: Duration,
    /// Skips the network probe when set.
    pub network: Option<Classification>,
}

impl Config {
    pub fn new(admin_password: impl Into<String>) -> Self {
        Self {
            port: 8788,
            redis_url: None,
            admin_password: admin_password.into(),
            probe_url: DEFAULT_PROBE_URL.to_string(),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            icon_timeout: DEFAULT_ICON_TIMEOUT,
            token_ttl: TOKEN_TTL,
            network: None,
        }
    }

    pub fn load() -> Result<Self, Error> {
        let defaults = Self::new(read_secret("ADMIN_PASSWORD")?);

        Ok(Self {
            port: try_load("RUST_PORT", defaults.port)?,
            redis_url: optional("REDIS_URL"),
            probe_url: optional("PROBE_URL").unwrap_or(defaults.probe_url),
            probe_timeout: millis("PROBE_TIMEOUT_MS", defaults.probe_timeout)?,
            icon_timeout: millis("ICON_TIMEOUT_MS", defaults.icon_timeout)?,
            token_ttl: Duration::from_secs(try_load("TOKEN_TTL_SECS", defaults.token_ttl.as_secs())?),
            network: optional("NETWORK")
                .map(|value| value.parse().map_err(|e| anyhow!("Invalid NETWORK value: {e}")))
                .transpose()?,
            ..defaults
        })
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn optional(key: &str) -> Option<String> {
    let value = var(key);

    if value.is_none() {
        info!("{key} not set");
    }

    value
}

fn try_load<T>(key: &str, default: T) -> Result<T, Error>
where
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow!("Invalid {key} value: {e}")),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn millis(key: &str, default: Duration) -> Result<Duration, Error> {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);

    try_load(key, default_ms).map(Duration::from_millis)
}

fn read_secret(secret_name: &str) -> Result<String, Error> {
    let path = format!("/run/secrets/{secret_name}");

    match read_to_string(&path) {
        Ok(secret) if !secret.trim().is_empty() => return Ok(secret.trim().to_string()),
        Ok(_) => warn!("{path} is empty"),
        Err(e) => warn!("Failed to read {secret_name} from file: {e}"),
    }

    match var(secret_name) {
        Some(secret) => Ok(secret.trim().to_string()),
        None => bail!("{secret_name} must be provided as a secret file or environment variable"),
    }
}

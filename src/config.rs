use crate::refresh::DEFAULT_REFRESH_INTERVAL;
use crate::stats::{DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
use crate::storage::resolve_data_path;
use std::{env, path::PathBuf, str::FromStr, time::Duration};
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;

/// Runtime settings, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub refresh_interval: Duration,
    pub window_days: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_path: PathBuf::from("data/state.json"),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            window_days: DEFAULT_WINDOW_DAYS,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let refresh_secs = env_or("DASHBOARD_REFRESH_SECS", DEFAULT_REFRESH_INTERVAL.as_secs())
            .max(1);
        Self {
            port: env_or("PORT", DEFAULT_PORT),
            data_path: resolve_data_path(),
            refresh_interval: Duration::from_secs(refresh_secs),
            window_days: env_or("DASHBOARD_WINDOW_DAYS", DEFAULT_WINDOW_DAYS).clamp(1, MAX_WINDOW_DAYS),
        }
    }
}

fn env_or<T: FromStr + Copy + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring invalid {key}={value:?}, using {default}");
            default
        }),
        Err(_) => default,
    }
}

use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

use crate::{HttptionError, Result, action::DEFAULT_MAX_REPEATS};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// transport config
    #[serde(default)]
    pub transport: TransportConfig,
    /// retry config
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// whole request timeout in milliseconds, 0 disables it
    pub timeout_ms: u64,
    /// connect timeout in milliseconds, 0 disables it
    pub connect_timeout_ms: u64,
    /// proxy url applied to every scheme
    pub proxy: Option<String>,
    /// skip TLS certificate verification
    pub accept_invalid_certs: bool,
    /// user agent header sent with every request
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// retries after a rate limited attempt, 0 disables retrying
    pub max_retry: u32,
    /// fixed delay between retries in milliseconds
    pub retry_delay_ms: u64,
    /// upper bound of repeat cycles for a single execute call
    pub max_repeats: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            connect_timeout_ms: 10_000,
            proxy: None,
            accept_invalid_certs: false,
            user_agent: None,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retry: 0,
            retry_delay_ms: 0,
            max_repeats: DEFAULT_MAX_REPEATS,
        }
    }
}

impl TransportConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_ms > 0).then(|| Duration::from_millis(self.connect_timeout_ms))
    }
}

impl RetryConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Config {
    pub fn create<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())
            .map_err(|err| HttptionError::Config(format!("failed to load config file {:?}: {}", path.as_ref(), err)))?;

        Self::load_from_str(data.as_str())
    }

    pub fn load_from_str(toml_str: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(toml_str)?;
        Ok(config)
    }
}

use crate::resilience::RetryConfig;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Process-wide configuration, read once at startup.
///
/// Layered: built-in defaults, then an optional TOML file, then
/// `SPORTSPROXY__`-prefixed environment variables
/// (e.g. `SPORTSPROXY__RATE_LIMIT__REFILL_RATE_PER_SECOND=0.5`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub rate_limit: RateLimitConfig,
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider identifier the factory resolves (`openliga`).
    pub name: String,
    pub base_url: String,
    pub request_timeout_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Tokens added per second to the shared bucket.
    pub refill_rate_per_second: f64,
    /// Burst size; the bucket starts full.
    pub capacity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_secs: f64,
    pub max_delay_secs: f64,
    pub jitter_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            provider: ProviderConfig::default(),
            rate_limit: RateLimitConfig::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: "openliga".to_string(),
            base_url: "https://api.openligadb.de".to_string(),
            request_timeout_secs: 10.0,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            refill_rate_per_second: 0.25,
            capacity: 5.0,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_secs: 1.0,
            max_delay_secs: 30.0,
            jitter_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration from defaults, an optional file, and the
    /// environment, then validate it.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())?;

        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("SPORTSPROXY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the runtime cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "must be non-zero"));
        }
        if self.rate_limit.refill_rate_per_second <= 0.0 {
            return Err(invalid(
                "rate_limit.refill_rate_per_second",
                "must be positive",
            ));
        }
        if self.rate_limit.capacity < 1.0 {
            return Err(invalid("rate_limit.capacity", "must be at least 1"));
        }
        if self.retry.base_delay_secs < 0.0 {
            return Err(invalid("retry.base_delay_secs", "must not be negative"));
        }
        if self.retry.max_delay_secs < self.retry.base_delay_secs {
            return Err(invalid(
                "retry.max_delay_secs",
                "must not be below retry.base_delay_secs",
            ));
        }
        if self.provider.request_timeout_secs <= 0.0 {
            return Err(invalid(
                "provider.request_timeout_secs",
                "must be positive",
            ));
        }
        if Url::parse(&self.provider.base_url).is_err() {
            return Err(invalid("provider.base_url", "must be a valid URL"));
        }
        Ok(())
    }
}

impl ProviderConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_secs)
    }
}

impl RetrySettings {
    /// Bind the startup settings to the retry executor's config type.
    #[must_use]
    pub fn to_retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            base_delay: Duration::from_secs_f64(self.base_delay_secs),
            max_delay: Duration::from_secs_f64(self.max_delay_secs),
            jitter_enabled: self.jitter_enabled,
        }
    }
}

fn invalid(field: &str, reason: &str) -> Error {
    Error::InvalidConfig {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

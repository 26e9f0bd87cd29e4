use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{DeleterError, Result};
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delay before the first delete retry; doubles on every further failure
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(self.initial_backoff_ms))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_initial_backoff_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| DeleterError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| DeleterError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.retry.initial_backoff_ms == 0 {
            return Err(DeleterError::ConfigError(
                "retry.initial_backoff_ms must be at least 1".to_string(),
            ));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(DeleterError::ConfigError(
                "api.request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.api.request_timeout_secs > 600 {
            return Err(DeleterError::ConfigError(
                "api.request_timeout_secs cannot exceed 600".to_string(),
            ));
        }

        Ok(())
    }

    /// Write a commented example configuration
    pub async fn create_example(path: &Path) -> Result<()> {
        let example = r#"# gmail-deleter configuration

[retry]
# Delay before retrying a failed batch delete, in milliseconds.
# Doubles after every consecutive failure; deletes are retried until they succeed.
initial_backoff_ms = 1000

[api]
# Upper bound for a single Gmail API call, in seconds (1-600).
request_timeout_secs = 30
"#;

        tokio::fs::write(path, example)
            .await
            .map_err(|e| DeleterError::ConfigError(format!("Failed to write example config: {}", e)))?;
        Ok(())
    }
}

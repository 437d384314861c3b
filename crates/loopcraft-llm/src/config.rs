use std::time::Duration;

use crate::error::LlmError;

/// Environment variable holding the API credential.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model when neither the CLI nor the config file names one.
pub const DEFAULT_MODEL: &str = "gpt-4-turbo";

/// Configuration for a remote chat-completion endpoint.
///
/// Retry count and backoff are policy knobs, not hard-coded constants:
/// transient transport failures are retried up to `max_retries` times with
/// exponential backoff starting at `retry_backoff`.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    /// Per-request timeout applied by the HTTP client.
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.into(),
            temperature: 0.7,
            timeout: Duration::from_secs(120),
            max_retries: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }

    /// Read the credential from the environment. A missing key is a
    /// configuration error and must be surfaced before any loop starts.
    pub fn from_env(model: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| LlmError::ApiKeyNotFound(API_KEY_ENV.to_string()))?;
        Ok(Self::new(api_key, model))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = LlmConfig::new("test-key", "gpt-4o")
            .with_base_url("http://localhost:8080/v1")
            .with_temperature(0.0)
            .with_timeout(Duration::from_secs(10))
            .with_max_retries(5)
            .with_retry_backoff(Duration::from_millis(100));

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_backoff, Duration::from_millis(100));
    }

    #[test]
    fn defaults_are_sane() {
        let config = LlmConfig::new("k", DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.max_retries >= 1);
        assert!(config.timeout > Duration::from_secs(0));
    }
}

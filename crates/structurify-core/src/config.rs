use std::time::Duration;

use crate::error::StructurifyError;

pub const DEFAULT_BASE_URL: &str = "https://app.structurify.ai/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(1000);

/// Connection settings for a Structurify client.
///
/// Built once and never mutated; the client owns its copy.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: String,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay", &self.retry_base_delay)
            .finish()
    }
}

impl ClientConfig {
    /// Create a config with default endpoint, timeout, and retry settings.
    ///
    /// Fails with [`StructurifyError::InvalidArgument`] if `api_key` is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self, StructurifyError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(StructurifyError::InvalidArgument(
                "API key is required".into(),
            ));
        }

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
        })
    }

    /// Read configuration from environment variables.
    ///
    /// - `STRUCTURIFY_API_KEY` (required)
    /// - `STRUCTURIFY_BASE_URL` (optional)
    /// - `STRUCTURIFY_TIMEOUT_MS` (optional, defaults to 30000)
    /// - `STRUCTURIFY_MAX_RETRIES` (optional, defaults to 3)
    pub fn from_env() -> Result<Self, StructurifyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StructurifyError> {
        let api_key = lookup("STRUCTURIFY_API_KEY").ok_or_else(|| {
            StructurifyError::Config("STRUCTURIFY_API_KEY not set".into())
        })?;
        let mut config = Self::new(api_key)?;

        if let Some(base_url) = lookup("STRUCTURIFY_BASE_URL") {
            config = config.with_base_url(base_url);
        }

        if let Some(raw) = lookup("STRUCTURIFY_TIMEOUT_MS") {
            let millis: u64 = raw.parse().map_err(|_| {
                StructurifyError::Config(format!(
                    "Invalid STRUCTURIFY_TIMEOUT_MS '{raw}': must be a positive integer"
                ))
            })?;
            if millis == 0 {
                return Err(StructurifyError::Config(
                    "STRUCTURIFY_TIMEOUT_MS must be at least 1".into(),
                ));
            }
            config = config.with_timeout(Duration::from_millis(millis));
        }

        if let Some(raw) = lookup("STRUCTURIFY_MAX_RETRIES") {
            let retries: u32 = raw.parse().map_err(|_| {
                StructurifyError::Config(format!(
                    "Invalid STRUCTURIFY_MAX_RETRIES '{raw}': must be a non-negative integer"
                ))
            })?;
            config = config.with_max_retries(retries);
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
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

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Check settings the builders cannot reject on their own.
    ///
    /// A zero timeout would fail every attempt before it is sent.
    pub fn validate(&self) -> Result<(), StructurifyError> {
        if self.timeout.is_zero() {
            return Err(StructurifyError::InvalidArgument(
                "Timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: self.retry_base_delay,
        }
    }
}

/// Retry schedule with exponential backoff.
///
/// Delay schedule with the default base: 1s, 2s, 4s, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_RETRY_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// `true` while another attempt is allowed after the 0-indexed `attempt`.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Backoff before the retry that follows the 0-indexed `attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Like [`delay_for_attempt`](Self::delay_for_attempt), but a non-zero
    /// server hint wins. `Retry-After: 0` falls back to the backoff.
    pub fn delay_for_rate_limit(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after
            .filter(|d| !d.is_zero())
            .unwrap_or_else(|| self.delay_for_attempt(attempt))
    }
}

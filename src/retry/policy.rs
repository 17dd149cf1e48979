use crate::core::{DbError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_DELAY_MS: u64 = 25_000;

/// Fixed-delay retry configuration.
///
/// `max_attempts` counts every call, the first one included, so a limit of `1`
/// means "no retries". The delay is only inserted between attempts.
///
/// Serialized as `{ "max_attempts": u32, "delay_ms": u64 }`; deserialization
/// rejects a zero attempt limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RetryPolicyConfig", into = "RetryPolicyConfig")]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

/// Wire form of [`RetryPolicy`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
struct RetryPolicyConfig {
    max_attempts: u32,
    delay_ms: u64,
}

impl Default for RetryPolicyConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_DELAY_MS,
        }
    }
}

impl TryFrom<RetryPolicyConfig> for RetryPolicy {
    type Error = DbError;

    fn try_from(config: RetryPolicyConfig) -> Result<Self> {
        Self::new(config.max_attempts, Duration::from_millis(config.delay_ms))
    }
}

impl From<RetryPolicy> for RetryPolicyConfig {
    fn from(policy: RetryPolicy) -> Self {
        // round up so a sub-millisecond delay never serializes as "no delay"
        let millis = policy.delay.as_nanos().div_ceil(1_000_000);
        Self {
            max_attempts: policy.max_attempts,
            delay_ms: u64::try_from(millis).unwrap_or(u64::MAX),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Create a validated policy
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use dbretry::RetryPolicy;
    ///
    /// let policy = RetryPolicy::new(3, Duration::from_millis(500)).unwrap();
    /// assert_eq!(policy.delay(), Duration::from_millis(500));
    ///
    /// assert!(RetryPolicy::new(0, Duration::ZERO).is_err());
    /// ```
    pub fn new(max_attempts: u32, delay: Duration) -> Result<Self> {
        let policy = Self::default()
            .with_max_attempts(max_attempts)
            .with_delay(delay);
        policy.validate()?;
        Ok(policy)
    }

    /// Set the attempt limit. Checked by `validate` and by executor construction.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the delay between attempts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        check_attempts(self.max_attempts)
    }

    /// Pick the per-call override if present, else the configured limit.
    pub fn resolve_attempts(&self, retry_limit: Option<u32>) -> Result<u32> {
        let attempts = retry_limit.unwrap_or(self.max_attempts);
        check_attempts(attempts)?;
        Ok(attempts)
    }
}

pub(crate) fn check_attempts(max_attempts: u32) -> Result<()> {
    if max_attempts == 0 {
        return Err(DbError::InvalidConfig(
            "max_attempts must be >= 1".to_string(),
        ));
    }
    Ok(())
}

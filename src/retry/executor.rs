use crate::core::{DbError, Result};
use crate::interface::FailureLogger;
use super::policy::{RetryPolicy, check_attempts};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, event};

/// Observation hook: `(error, attempt_index, max_attempts)`.
pub type FailureHook<'a> = &'a (dyn Fn(&DbError, u32, u32) + Send + Sync);

/// Decides whether a failure may be retried. `false` stops the loop early.
pub type RetryPredicate = Arc<dyn Fn(&DbError) -> bool + Send + Sync>;

/// Run `operation` until it succeeds or `max_attempts` calls have failed.
///
/// `operation` is called afresh for every attempt, so each retry re-issues the
/// underlying work. Attempts are strictly sequential and `delay` is slept between
/// two attempts only: never before the first call and never after the last one.
///
/// `on_failure` sees every failed attempt with its 0-based index. When the limit
/// is reached the error of the last attempt is returned unchanged; earlier errors
/// are only visible through the hook.
///
/// Returns `DbError::InvalidConfig` without calling `operation` when
/// `max_attempts` is zero.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use dbretry::{DbError, retry_async};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut calls = 0;
/// let value = retry_async(
///     || {
///         calls += 1;
///         let attempt = calls;
///         async move {
///             if attempt < 3 {
///                 Err(DbError::ConnectionError("reset by peer".into()))
///             } else {
///                 Ok(42)
///             }
///         }
///     },
///     3,
///     Duration::ZERO,
///     |_, _, _| {},
/// )
/// .await
/// .unwrap();
///
/// assert_eq!(value, 42);
/// # }
/// ```
pub async fn retry_async<T, Op, Fut, OnFailure>(
    operation: Op,
    max_attempts: u32,
    delay: Duration,
    on_failure: OnFailure,
) -> Result<T>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    OnFailure: FnMut(&DbError, u32, u32),
{
    retry_loop(operation, max_attempts, delay, on_failure, |_| true).await
}

async fn retry_loop<T, Op, Fut, OnFailure, ShouldRetry>(
    mut operation: Op,
    max_attempts: u32,
    delay: Duration,
    mut on_failure: OnFailure,
    should_retry: ShouldRetry,
) -> Result<T>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    OnFailure: FnMut(&DbError, u32, u32),
    ShouldRetry: Fn(&DbError) -> bool,
{
    check_attempts(max_attempts)?;

    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    event!(
                        Level::DEBUG,
                        attempts = attempt + 1,
                        max_attempts,
                        "database operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) => {
                on_failure(&err, attempt, max_attempts);

                if attempt + 1 >= max_attempts {
                    event!(
                        Level::WARN,
                        attempts = attempt + 1,
                        error = %err,
                        "database operation failed, retry limit reached"
                    );
                    return Err(err);
                }

                if !should_retry(&err) {
                    event!(
                        Level::WARN,
                        attempts = attempt + 1,
                        error = %err,
                        "database operation failed with a non-retryable error"
                    );
                    return Err(err);
                }

                event!(
                    Level::DEBUG,
                    attempt = attempt + 1,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "database operation failed, retrying after delay"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Retry runner bound to a [`RetryPolicy`] and an optional [`FailureLogger`].
///
/// Holds no mutable state, so one executor can serve any number of concurrent calls.
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    logger: Option<Arc<dyn FailureLogger>>,
    retry_if: Option<RetryPredicate>,
}

impl RetryExecutor {
    /// Create an executor without a logger. Fails on an invalid policy.
    pub fn new(policy: RetryPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            logger: None,
            retry_if: None,
        })
    }

    /// Report every failed attempt to `logger`.
    pub fn with_logger(mut self, logger: Arc<dyn FailureLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Stop retrying as soon as `predicate` returns `false` for a failure.
    ///
    /// Without a predicate every failure is retried until the limit, which is
    /// the default. Use this to bail out early on errors that can never succeed,
    /// such as malformed SQL or constraint violations. The failing attempt is
    /// still reported to the failure hook before its error is returned.
    pub fn with_retry_predicate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&DbError) -> bool + Send + Sync + 'static,
    {
        self.retry_if = Some(Arc::new(predicate));
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn has_logger(&self) -> bool {
        self.logger.is_some()
    }

    /// Run `operation` with an explicit limit, delay and failure hook.
    ///
    /// `max_attempts` falls back to the configured limit when `None`.
    pub async fn run_with_retry<T, Op, Fut>(
        &self,
        operation: Op,
        max_attempts: Option<u32>,
        delay: Duration,
        on_failure: Option<FailureHook<'_>>,
    ) -> Result<T>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.policy.resolve_attempts(max_attempts)?;
        retry_loop(
            operation,
            max_attempts,
            delay,
            |err, attempt, max| {
                if let Some(hook) = on_failure {
                    hook(err, attempt, max);
                }
            },
            |err| self.is_retryable(err),
        )
        .await
    }

    /// Run `operation` with the configured delay, logging each failed attempt.
    pub async fn run<T, Op, Fut>(&self, operation: Op, retry_limit: Option<u32>) -> Result<T>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.policy.resolve_attempts(retry_limit)?;
        retry_loop(
            operation,
            max_attempts,
            self.policy.delay(),
            |err, attempt, _| self.log_attempt(err, attempt),
            |err| self.is_retryable(err),
        )
        .await
    }

    fn log_attempt(&self, err: &DbError, attempt: u32) {
        if let Some(logger) = &self.logger {
            logger.log_failure(err, &format!("Database retry #: {}", attempt + 1));
        }
    }

    fn is_retryable(&self, err: &DbError) -> bool {
        self.retry_if.as_ref().is_none_or(|predicate| predicate(err))
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::default(),
            logger: None,
            retry_if: None,
        }
    }
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .field("logger", &self.logger.is_some())
            .field("retry_if", &self.retry_if.is_some())
            .finish()
    }
}

mod executor;
mod logger;
pub mod policy;

pub use executor::{FailureHook, RetryExecutor, RetryPredicate, retry_async};
pub use logger::TracingFailureLogger;
pub use policy::{DEFAULT_DELAY_MS, DEFAULT_MAX_ATTEMPTS, RetryPolicy};

use crate::core::DbError;
use crate::interface::FailureLogger;
use tracing::warn;

/// Reports failed attempts as `WARN` events through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingFailureLogger {
    component: Option<String>,
}

impl TracingFailureLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag every event with a component name, e.g. the database being wrapped.
    pub fn named(component: impl Into<String>) -> Self {
        Self {
            component: Some(component.into()),
        }
    }
}

impl FailureLogger for TracingFailureLogger {
    fn log_failure(&self, error: &DbError, message: &str) {
        match &self.component {
            Some(component) => warn!(component = %component, error = %error, "{}", message),
            None => warn!(error = %error, "{}", message),
        }
    }
}

impl<F> FailureLogger for F
where
    F: Fn(&DbError, &str) + Send + Sync,
{
    fn log_failure(&self, error: &DbError, message: &str) {
        self(error, message)
    }
}

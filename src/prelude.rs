//! Everything an application needs to wrap a driver and issue retried calls.
//!
//! ```
//! use dbretry::prelude::*;
//! ```

pub use crate::{
    CommandKind, ConnectionFactory, DatabaseConnection, DbError, DbRetry, FailureLogger,
    FromRow, QueryResult, Result, RetryPolicy, Row, SqlCommand, TracingFailureLogger, Value,
    column,
};

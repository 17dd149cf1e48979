// ============================================================================
// dbretry Library
// ============================================================================
//
// Fixed-delay retry around async relational database calls.
//
// The crate owns the retry loop and connection scoping only. Opening physical
// connections and running SQL belong to a driver, plugged in through the
// `ConnectionFactory` and `DatabaseConnection` traits.

pub mod core;
pub mod result;
pub mod interface;
pub mod connection;
pub mod retry;
pub mod facade;
pub mod prelude;

// Re-export main types for convenience
pub use crate::core::{DbError, Result, Row, Value};
pub use result::{FromRow, FromValue, QueryResult, column};
pub use interface::{ConnectionFactory, DatabaseConnection, FailureLogger};
pub use connection::{ScopedConnection, config::ConnectionInfo};
pub use retry::{
    FailureHook, RetryExecutor, RetryPolicy, RetryPredicate, TracingFailureLogger, retry_async,
};
pub use facade::{CommandKind, DbRetry, Parameters, SqlCommand, TransactionId};

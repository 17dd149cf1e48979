use crate::connection::ScopedConnection;
use crate::core::Result;
use crate::interface::{ConnectionFactory, DatabaseConnection, FailureLogger};
use crate::result::FromRow;
use crate::retry::{RetryExecutor, RetryPolicy};
use super::SqlCommand;
use std::future::Future;
use std::sync::Arc;

/// Retrying front door for database calls.
///
/// Every operation comes in two flavours:
/// - on a connection string (`fetch_many`, ...): each attempt opens its own
///   connection and closes it before the attempt finishes, so a retry never reuses
///   a connection that just failed;
/// - on an open connection (`fetch_many_on`, ...): the connection is borrowed for
///   every attempt and its lifecycle stays with the caller.
///
/// Failures are retried with the fixed delay of the configured [`RetryPolicy`],
/// and `retry_limit` overrides the attempt limit for a single call.
///
/// # Examples
///
/// ```ignore
/// let db = DbRetry::with_logger(
///     PostgresFactory::new(),
///     RetryPolicy::default(),
///     Arc::new(TracingFailureLogger::named("orders")),
/// )?;
///
/// let users: Vec<User> = db
///     .fetch_many(CONN, &SqlCommand::new("SELECT * FROM users"), None)
///     .await?;
/// ```
pub struct DbRetry<F: ConnectionFactory> {
    factory: Arc<F>,
    executor: RetryExecutor,
}

impl<F: ConnectionFactory> Clone for DbRetry<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
            executor: self.executor.clone(),
        }
    }
}

impl<F: ConnectionFactory> DbRetry<F> {
    /// Create a facade that retries silently.
    pub fn new(factory: F, policy: RetryPolicy) -> Result<Self> {
        Ok(Self::with_executor(factory, RetryExecutor::new(policy)?))
    }

    /// Create a facade that reports each failed attempt to `logger`.
    pub fn with_logger(
        factory: F,
        policy: RetryPolicy,
        logger: Arc<dyn FailureLogger>,
    ) -> Result<Self> {
        let executor = RetryExecutor::new(policy)?.with_logger(logger);
        Ok(Self::with_executor(factory, executor))
    }

    /// Create a facade around a fully configured executor.
    pub fn with_executor(factory: F, executor: RetryExecutor) -> Self {
        Self {
            factory: Arc::new(factory),
            executor,
        }
    }

    pub fn executor(&self) -> &RetryExecutor {
        &self.executor
    }

    pub fn policy(&self) -> &RetryPolicy {
        self.executor.policy()
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Retry an arbitrary repeatable operation with this facade's policy and logger.
    pub async fn run<T, Op, Fut>(&self, operation: Op, retry_limit: Option<u32>) -> Result<T>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.executor.run(operation, retry_limit).await
    }

    // ------------------------------------------------------------------
    // Connection-string variants
    // ------------------------------------------------------------------

    /// Fetch all rows, opening a new connection per attempt.
    pub async fn fetch_many<T: FromRow>(
        &self,
        connection_string: &str,
        command: &SqlCommand,
        retry_limit: Option<u32>,
    ) -> Result<Vec<T>> {
        self.run(
            || self.fetch_many_new_connection(connection_string, command),
            retry_limit,
        )
        .await
    }

    /// Fetch the first row, or `None` if the query matched nothing.
    pub async fn fetch_first<T: FromRow>(
        &self,
        connection_string: &str,
        command: &SqlCommand,
        retry_limit: Option<u32>,
    ) -> Result<Option<T>> {
        self.run(
            || self.fetch_first_new_connection(connection_string, command),
            retry_limit,
        )
        .await
    }

    /// Fetch the first row, or `T::default()` if the query matched nothing.
    pub async fn fetch_first_or_default<T: FromRow + Default>(
        &self,
        connection_string: &str,
        command: &SqlCommand,
        retry_limit: Option<u32>,
    ) -> Result<T> {
        self.fetch_first(connection_string, command, retry_limit)
            .await
            .map(Option::unwrap_or_default)
    }

    /// Execute a non-query, opening a new connection per attempt. Returns affected rows.
    pub async fn execute_non_query(
        &self,
        connection_string: &str,
        command: &SqlCommand,
        retry_limit: Option<u32>,
    ) -> Result<u64> {
        self.run(
            || self.execute_new_connection(connection_string, command),
            retry_limit,
        )
        .await
    }

    // ------------------------------------------------------------------
    // Open-connection variants
    // ------------------------------------------------------------------

    /// Fetch all rows on a connection the caller keeps open.
    pub async fn fetch_many_on<T, C>(
        &self,
        conn: &C,
        command: &SqlCommand,
        retry_limit: Option<u32>,
    ) -> Result<Vec<T>>
    where
        T: FromRow,
        C: DatabaseConnection + ?Sized,
    {
        self.run(
            move || async move { conn.query(command).await.and_then(|r| r.map_rows()) },
            retry_limit,
        )
        .await
    }

    /// Fetch the first row on a caller-owned connection, or `None`.
    pub async fn fetch_first_on<T, C>(
        &self,
        conn: &C,
        command: &SqlCommand,
        retry_limit: Option<u32>,
    ) -> Result<Option<T>>
    where
        T: FromRow,
        C: DatabaseConnection + ?Sized,
    {
        self.run(
            move || async move { conn.query_first(command).await.and_then(|r| r.map_first()) },
            retry_limit,
        )
        .await
    }

    /// Fetch the first row on a caller-owned connection, or `T::default()`.
    pub async fn fetch_first_or_default_on<T, C>(
        &self,
        conn: &C,
        command: &SqlCommand,
        retry_limit: Option<u32>,
    ) -> Result<T>
    where
        T: FromRow + Default,
        C: DatabaseConnection + ?Sized,
    {
        self.fetch_first_on(conn, command, retry_limit)
            .await
            .map(Option::unwrap_or_default)
    }

    /// Execute a non-query on a caller-owned connection.
    pub async fn execute_non_query_on<C>(
        &self,
        conn: &C,
        command: &SqlCommand,
        retry_limit: Option<u32>,
    ) -> Result<u64>
    where
        C: DatabaseConnection + ?Sized,
    {
        self.run(move || async move { conn.execute(command).await }, retry_limit)
            .await
    }

    // ------------------------------------------------------------------
    // Single attempt on a fresh connection
    // ------------------------------------------------------------------

    /// Open a connection, fetch all rows once, close the connection. No retry.
    pub async fn fetch_many_new_connection<T: FromRow>(
        &self,
        connection_string: &str,
        command: &SqlCommand,
    ) -> Result<Vec<T>> {
        let conn = ScopedConnection::open(self.factory.as_ref(), connection_string).await?;
        let outcome = conn.query(command).await.and_then(|result| result.map_rows());
        conn.release();
        outcome
    }

    /// Open a connection, fetch the first row once, close the connection. No retry.
    pub async fn fetch_first_new_connection<T: FromRow>(
        &self,
        connection_string: &str,
        command: &SqlCommand,
    ) -> Result<Option<T>> {
        let conn = ScopedConnection::open(self.factory.as_ref(), connection_string).await?;
        let outcome = conn.query_first(command).await.and_then(|result| result.map_first());
        conn.release();
        outcome
    }

    /// Open a connection, execute once, close the connection. No retry.
    pub async fn execute_new_connection(
        &self,
        connection_string: &str,
        command: &SqlCommand,
    ) -> Result<u64> {
        let conn = ScopedConnection::open(self.factory.as_ref(), connection_string).await?;
        let outcome = conn.execute(command).await;
        conn.release();
        outcome
    }
}

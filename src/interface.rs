use async_trait::async_trait;
use crate::core::{DbError, Result};
use crate::facade::SqlCommand;
use crate::result::QueryResult;

/// An open connection to a relational database.
///
/// This is the seam to the real driver: wrap a Postgres, MySQL or SQL Server client
/// and implement this trait. Errors are passed through the retry layer untouched,
/// so implementations should return whatever `DbError` best describes the failure.
#[async_trait]
pub trait DatabaseConnection: Send + Sync {
    /// Execute a command that is expected to return rows.
    async fn query(&self, command: &SqlCommand) -> Result<QueryResult>;

    /// Execute a command that is expected to return at most the first row.
    ///
    /// Drivers that can push a row limit down to the server should override this.
    async fn query_first(&self, command: &SqlCommand) -> Result<QueryResult> {
        let mut result = self.query(command).await?;
        result.rows.truncate(1);
        Ok(result)
    }

    /// Execute a command that modifies data and return the number of affected rows.
    async fn execute(&self, command: &SqlCommand) -> Result<u64>;

    /// Release the physical connection. Must be safe to call from `Drop`.
    fn close(&mut self) -> Result<()>;
}

/// Opens connections from a connection string.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    type Connection: DatabaseConnection;

    /// Open a new physical connection. The caller owns closing it.
    async fn connect(&self, connection_string: &str) -> Result<Self::Connection>;
}

/// Sink for failed attempts. Purely observational.
pub trait FailureLogger: Send + Sync {
    fn log_failure(&self, error: &DbError, message: &str);
}

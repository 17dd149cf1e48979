pub mod config;

use crate::core::Result;
use crate::interface::{ConnectionFactory, DatabaseConnection};
use config::ConnectionInfo;
use std::ops::Deref;
use tracing::{debug, warn};

/// A connection opened for exactly one attempt.
///
/// The connection is closed by [`ScopedConnection::release`] on the normal paths and
/// by `Drop` when the owning future is cancelled mid-attempt, so it never outlives
/// the attempt that opened it.
pub struct ScopedConnection<C: DatabaseConnection> {
    inner: Option<C>,
}

impl<C: DatabaseConnection> ScopedConnection<C> {
    /// Open a fresh physical connection through `factory`.
    pub async fn open<F>(factory: &F, connection_string: &str) -> Result<Self>
    where
        F: ConnectionFactory<Connection = C>,
    {
        match ConnectionInfo::parse(connection_string) {
            Ok(info) => debug!(
                server = %info.server().unwrap_or_default(),
                database = %info.database().unwrap_or_default(),
                connection = %info,
                "opening scoped connection"
            ),
            Err(_) => debug!(connection = config::UNPARSABLE, "opening scoped connection"),
        }
        let conn = factory.connect(connection_string).await?;
        Ok(Self { inner: Some(conn) })
    }

    /// Wrap an already opened connection so that it is closed on scope exit.
    pub fn new(conn: C) -> Self {
        Self { inner: Some(conn) }
    }

    /// Close the connection now.
    ///
    /// A failing close is logged and swallowed: the attempt's own outcome is what
    /// the caller sees.
    pub fn release(mut self) {
        self.close_inner();
    }

    fn close_inner(&mut self) {
        if let Some(mut conn) = self.inner.take() {
            if let Err(err) = conn.close() {
                warn!(error = %err, "failed to close scoped connection");
            }
        }
    }
}

impl<C: DatabaseConnection> Deref for ScopedConnection<C> {
    type Target = C;

    fn deref(&self) -> &C {
        // `inner` is only taken by `release` (which consumes self) and by `Drop`
        self.inner
            .as_ref()
            .unwrap_or_else(|| unreachable!("scoped connection used after release"))
    }
}

impl<C: DatabaseConnection> Drop for ScopedConnection<C> {
    fn drop(&mut self) {
        self.close_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DbError;
    use crate::facade::SqlCommand;
    use crate::result::QueryResult;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingConnection {
        closed: Arc<AtomicUsize>,
        fail_close: bool,
    }

    #[async_trait]
    impl DatabaseConnection for CountingConnection {
        async fn query(&self, _command: &SqlCommand) -> Result<QueryResult> {
            Ok(QueryResult::empty())
        }

        async fn execute(&self, _command: &SqlCommand) -> Result<u64> {
            Ok(0)
        }

        fn close(&mut self) -> Result<()> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                return Err(DbError::ConnectionError("socket already gone".into()));
            }
            Ok(())
        }
    }

    fn connection(closed: &Arc<AtomicUsize>, fail_close: bool) -> CountingConnection {
        CountingConnection {
            closed: Arc::clone(closed),
            fail_close,
        }
    }

    #[test]
    fn test_release_closes_exactly_once() {
        let closed = Arc::new(AtomicUsize::new(0));
        let scoped = ScopedConnection::new(connection(&closed, false));

        scoped.release();
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_closes() {
        let closed = Arc::new(AtomicUsize::new(0));
        {
            let _scoped = ScopedConnection::new(connection(&closed, false));
        }
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_close_failure_is_swallowed() {
        let closed = Arc::new(AtomicUsize::new(0));
        ScopedConnection::new(connection(&closed, true)).release();
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_deref_reaches_connection() {
        let closed = Arc::new(AtomicUsize::new(0));
        let scoped = ScopedConnection::new(connection(&closed, false));

        let affected = scoped.execute(&SqlCommand::new("DELETE FROM t")).await.unwrap();
        assert_eq!(affected, 0);
        assert_eq!(closed.load(Ordering::SeqCst), 0);
    }
}

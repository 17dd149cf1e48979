#![allow(dead_code)]

use async_trait::async_trait;
use dbretry::{
    ConnectionFactory, DatabaseConnection, DbError, FailureLogger, QueryResult, Result, SqlCommand,
    Value,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// What the next database call (or connect) should do.
#[derive(Debug, Clone)]
pub enum Outcome {
    Rows(QueryResult),
    Affected(u64),
    Fail(String),
    RefuseConnect(String),
    Hang,
}

#[derive(Default)]
pub struct FakeState {
    script: Mutex<VecDeque<Outcome>>,
    next_id: AtomicU64,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub connect_attempts: AtomicUsize,
    pub calls: AtomicUsize,
    /// Connection id used by each call, in order.
    pub call_connections: Mutex<Vec<u64>>,
    pub connection_strings: Mutex<Vec<String>>,
    pub commands: Mutex<Vec<SqlCommand>>,
}

impl FakeState {
    pub fn live(&self) -> usize {
        self.opened.load(Ordering::SeqCst) - self.closed.load(Ordering::SeqCst)
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    pub fn call_connections(&self) -> Vec<u64> {
        self.call_connections.lock().unwrap().clone()
    }

    fn next_outcome(&self) -> Option<Outcome> {
        self.script.lock().unwrap().pop_front()
    }

    fn refuse_connect(&self) -> Option<String> {
        let mut script = self.script.lock().unwrap();
        if let Some(Outcome::RefuseConnect(msg)) = script.front() {
            let msg = msg.clone();
            script.pop_front();
            return Some(msg);
        }
        None
    }
}

#[derive(Clone, Default)]
pub struct FakeFactory {
    pub state: Arc<FakeState>,
}

impl FakeFactory {
    pub fn scripted(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        let factory = Self::default();
        factory
            .state
            .script
            .lock()
            .unwrap()
            .extend(outcomes);
        factory
    }

    /// A connection the test owns, bypassing `connect`.
    pub fn open_direct(&self) -> FakeConnection {
        let id = self.state.next_id.fetch_add(1, Ordering::SeqCst);
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        FakeConnection {
            id,
            state: Arc::clone(&self.state),
            closed: false,
        }
    }
}

#[async_trait]
impl ConnectionFactory for FakeFactory {
    type Connection = FakeConnection;

    async fn connect(&self, connection_string: &str) -> Result<FakeConnection> {
        self.state.connect_attempts.fetch_add(1, Ordering::SeqCst);
        self.state
            .connection_strings
            .lock()
            .unwrap()
            .push(connection_string.to_string());

        if let Some(msg) = self.state.refuse_connect() {
            return Err(DbError::ConnectionError(msg));
        }
        Ok(self.open_direct())
    }
}

pub struct FakeConnection {
    pub id: u64,
    state: Arc<FakeState>,
    closed: bool,
}

impl FakeConnection {
    async fn next(&self, command: &SqlCommand) -> Result<Outcome> {
        if self.closed {
            return Err(DbError::ConnectionError("connection is closed".into()));
        }
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        self.state.call_connections.lock().unwrap().push(self.id);
        self.state.commands.lock().unwrap().push(command.clone());

        match self.state.next_outcome() {
            Some(Outcome::Fail(msg)) => Err(DbError::ExecutionError(msg)),
            Some(Outcome::Hang) => std::future::pending().await,
            Some(outcome) => Ok(outcome),
            None => Ok(Outcome::Rows(QueryResult::empty())),
        }
    }
}

#[async_trait]
impl DatabaseConnection for FakeConnection {
    async fn query(&self, command: &SqlCommand) -> Result<QueryResult> {
        match self.next(command).await? {
            Outcome::Rows(result) => Ok(result),
            Outcome::Affected(_) => Ok(QueryResult::empty()),
            other => Err(DbError::ExecutionError(format!("unexpected outcome {:?}", other))),
        }
    }

    async fn execute(&self, command: &SqlCommand) -> Result<u64> {
        match self.next(command).await? {
            Outcome::Affected(n) => Ok(n),
            Outcome::Rows(result) => Ok(result.row_count() as u64),
            other => Err(DbError::ExecutionError(format!("unexpected outcome {:?}", other))),
        }
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            self.closed = true;
            self.state.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Failure logger that remembers every `(error, message)` pair.
#[derive(Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<(String, String)>>,
}

impl RecordingLogger {
    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries().into_iter().map(|(_, m)| m).collect()
    }
}

impl FailureLogger for RecordingLogger {
    fn log_failure(&self, error: &DbError, message: &str) {
        self.entries
            .lock()
            .unwrap()
            .push((error.to_string(), message.to_string()));
    }
}

pub fn users() -> QueryResult {
    QueryResult::new(
        vec!["id".into(), "name".into()],
        vec![
            vec![Value::Integer(1), Value::Text("Alice".into())],
            vec![Value::Integer(2), Value::Text("Bob".into())],
        ],
    )
}

pub fn scalar(value: i64) -> QueryResult {
    QueryResult::new(vec!["value".into()], vec![vec![Value::Integer(value)]])
}

pub const CONN: &str = "Server=db.local;Database=orders;User Id=app;Password=hunter2";

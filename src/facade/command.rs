use crate::core::Value;
use std::time::Duration;

/// How the driver should interpret [`SqlCommand::sql`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CommandKind {
    #[default]
    Text,
    StoredProcedure,
    TableDirect,
}

/// Handle of a transaction already open on a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(pub u64);

/// Named parameters bound to a command, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: Vec<(String, Value)>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` to `name`, replacing any earlier binding of the same name.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.values.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<N: Into<String>, V: Into<Value>> FromIterator<(N, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut params = Parameters::new();
        for (name, value) in iter {
            params.add(name, value);
        }
        params
    }
}

/// Everything the driver needs to issue one database call.
///
/// A command is plain data, so the retry loop can hand the same command to
/// every attempt.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use dbretry::{CommandKind, SqlCommand};
///
/// let cmd = SqlCommand::new("SELECT id, name FROM users WHERE age > @age")
///     .param("@age", 25)
///     .timeout(Duration::from_secs(30));
///
/// assert_eq!(cmd.kind, CommandKind::Text);
/// assert_eq!(cmd.params.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SqlCommand {
    pub sql: String,
    pub params: Parameters,
    pub transaction: Option<TransactionId>,
    /// Command timeout passed to the driver. Expiry surfaces as an ordinary failure.
    pub timeout: Option<Duration>,
    pub kind: CommandKind,
}

impl SqlCommand {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Parameters::new(),
            transaction: None,
            timeout: None,
            kind: CommandKind::Text,
        }
    }

    /// Bind a single parameter
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.add(name, value);
        self
    }

    /// Replace all parameters
    pub fn params(mut self, params: Parameters) -> Self {
        self.params = params;
        self
    }

    /// Run inside an existing transaction
    pub fn transaction(mut self, transaction: TransactionId) -> Self {
        self.transaction = Some(transaction);
        self
    }

    /// Set command timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set command kind
    pub fn kind(mut self, kind: CommandKind) -> Self {
        self.kind = kind;
        self
    }
}

impl From<&str> for SqlCommand {
    fn from(sql: &str) -> Self {
        Self::new(sql)
    }
}

impl From<String> for SqlCommand {
    fn from(sql: String) -> Self {
        Self::new(sql)
    }
}

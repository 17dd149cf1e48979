use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    #[error("Command timed out after {0} ms")]
    Timeout(u64),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Row mapping error: {0}")]
    MappingError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    /// Rejected before any attempt is made; never reported as an attempt failure.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DbError {
    pub fn is_config_error(&self) -> bool {
        matches!(self, DbError::InvalidConfig(_))
    }
}

pub type Result<T> = std::result::Result<T, DbError>;

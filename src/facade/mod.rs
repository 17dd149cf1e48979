mod command;
mod database;

pub use command::{CommandKind, Parameters, SqlCommand, TransactionId};
pub use database::DbRetry;

mod result;

pub use result::{FromRow, FromValue, QueryResult, column};

use crate::core::{DbError, Result, Row, Value};

/// Rows returned by a single query, as handed back by a [`DatabaseConnection`].
///
/// [`DatabaseConnection`]: crate::interface::DatabaseConnection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
    }

    /// Maps every row into `T`, stopping at the first row that does not fit.
    pub fn map_rows<T: FromRow>(&self) -> Result<Vec<T>> {
        self.rows
            .iter()
            .map(|row| T::from_row(&self.columns, row))
            .collect()
    }

    /// Maps the first row, if any.
    pub fn map_first<T: FromRow>(&self) -> Result<Option<T>> {
        self.rows
            .first()
            .map(|row| T::from_row(&self.columns, row))
            .transpose()
    }
}

/// Conversion from a single cell.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;
}

/// Conversion from a whole row. Implement this for your own record types.
///
/// ```ignore
/// struct User { id: i64, name: String }
///
/// impl FromRow for User {
///     fn from_row(columns: &[String], row: &Row) -> Result<Self> {
///         Ok(User {
///             id: column(columns, row, "id")?,
///             name: column(columns, row, "name")?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    fn from_row(columns: &[String], row: &Row) -> Result<Self>;
}

/// Reads the named column out of `row` and converts it.
pub fn column<T: FromValue>(columns: &[String], row: &Row, name: &str) -> Result<T> {
    let index = columns
        .iter()
        .position(|c| c.eq_ignore_ascii_case(name))
        .ok_or_else(|| DbError::MappingError(format!("Column '{}' not found", name)))?;
    let value = row.get(index).ok_or_else(|| {
        DbError::MappingError(format!("Row has no value for column '{}'", name))
    })?;
    T::from_value(value)
}

fn mismatch(expected: &str, value: &Value) -> DbError {
    DbError::MappingError(format!(
        "Expected {}, got {}",
        expected,
        value.type_name()
    ))
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_i64().ok_or_else(|| mismatch("INTEGER", value))
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self> {
        let wide = value.as_i64().ok_or_else(|| mismatch("INTEGER", value))?;
        i32::try_from(wide)
            .map_err(|_| DbError::MappingError(format!("{} does not fit in i32", wide)))
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| mismatch("FLOAT", value))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| mismatch("BOOLEAN", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch("TEXT", value))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

fn first_cell(row: &Row) -> Result<&Value> {
    row.first()
        .ok_or_else(|| DbError::MappingError("Row has no columns".into()))
}

macro_rules! scalar_from_row {
    ($($ty:ty),*) => {
        $(
            impl FromRow for $ty {
                fn from_row(_columns: &[String], row: &Row) -> Result<Self> {
                    <$ty as FromValue>::from_value(first_cell(row)?)
                }
            }
        )*
    };
}

scalar_from_row!(Value, i64, i32, f64, bool, String);

impl<T: FromValue> FromRow for Option<T> {
    fn from_row(_columns: &[String], row: &Row) -> Result<Self> {
        <Option<T> as FromValue>::from_value(first_cell(row)?)
    }
}

macro_rules! tuple_from_row {
    ($len:expr; $($name:ident : $idx:tt),+) => {
        impl<$($name: FromValue),+> FromRow for ($($name,)+) {
            fn from_row(_columns: &[String], row: &Row) -> Result<Self> {
                if row.len() < $len {
                    return Err(DbError::MappingError(format!(
                        "Expected {} columns, got {}",
                        $len,
                        row.len()
                    )));
                }
                Ok(($($name::from_value(&row[$idx])?,)+))
            }
        }
    };
}

tuple_from_row!(2; A: 0, B: 1);
tuple_from_row!(3; A: 0, B: 1, C: 2);
tuple_from_row!(4; A: 0, B: 1, C: 2, D: 3);

//! Row and streaming types for query results.

use crate::error::AppError;
use crate::store::value::{FromValue, Value};
use futures::Stream;
use std::pin::Pin;

/// Positional parameters for SQL statements (`$1`, `$2`, ...).
pub type Params = Vec<Value>;

/// A stream of rows from a query result.
///
/// Uses `futures::Stream` for memory-efficient iteration over large result sets.
/// Rows are fetched on-demand, not loaded all at once.
pub type RowStream<'a> = Pin<Box<dyn Stream<Item = Result<Row, AppError>> + Send + 'a>>;

/// A single row from a query result.
///
/// Columns keep the order of the SELECT list, with typed extraction via [`Row::get`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Creates a new row from ordered `(column, value)` pairs.
    pub fn new(columns: Vec<(String, Value)>) -> Self {
        Self { columns }
    }

    /// Builds a row from borrowed column names.
    pub fn from_pairs<I, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, V)>,
        V: Into<Value>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
        )
    }

    /// Gets a value from the row by column name, converting to the requested type.
    ///
    /// # Errors
    ///
    /// Returns an error if the column is missing, NULL (for non-`Option` types),
    /// or of an incompatible type.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let id: i64 = row.get("bug_id")?;
    /// let deadline: Option<NaiveDate> = row.get("deadline")?;
    /// ```
    pub fn get<T: FromValue>(&self, key: &str) -> Result<T, AppError> {
        let value = self
            .get_raw(key)
            .ok_or_else(|| AppError::Internal(format!("column not found: {}", key)))?;
        T::from_value(value)
            .map_err(|e| AppError::Internal(format!("failed to read '{}': {}", key, e)))
    }

    /// Gets a value from the row, returning `None` if the column is missing or NULL.
    ///
    /// Still returns an error if the column exists but has an incompatible type.
    pub fn get_opt<T: FromValue>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.get_raw(key) {
            Some(v) if v.is_null() => Ok(None),
            Some(v) => T::from_value(v)
                .map(Some)
                .map_err(|e| AppError::Internal(format!("failed to read '{}': {}", key, e))),
            None => Ok(None),
        }
    }

    /// Returns the raw value for a column, if it exists.
    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, v)| v)
    }

    /// Returns all column names in select-list order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the number of columns in this row.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Consumes the row and returns the underlying pairs.
    pub fn into_inner(self) -> Vec<(String, Value)> {
        self.columns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_get_string() {
        let row = Row::from_pairs([("name", "test")]);
        let name: String = row.get("name").unwrap();
        assert_eq!(name, "test");
    }

    #[test]
    fn test_row_get_number() {
        let row = Row::from_pairs([("count", 42i64)]);
        let count: i64 = row.get("count").unwrap();
        assert_eq!(count, 42);
    }

    #[test]
    fn test_row_get_missing_key() {
        let row = Row::default();
        let result: Result<String, _> = row.get("missing");
        assert!(result.is_err());
    }

    #[test]
    fn test_row_get_opt_null() {
        let row = Row::new(vec![("name".to_string(), Value::Null)]);
        let name: Option<String> = row.get_opt("name").unwrap();
        assert_eq!(name, None);
    }

    #[test]
    fn test_row_get_opt_missing() {
        let row = Row::default();
        let name: Option<String> = row.get_opt("missing").unwrap();
        assert_eq!(name, None);
    }

    #[test]
    fn test_row_columns_keep_select_order() {
        let row = Row::from_pairs([("b", 2i64), ("a", 1i64)]);
        let columns: Vec<_> = row.columns().collect();
        assert_eq!(columns, vec!["b", "a"]);
    }
}

//! Query builder for fluent SQL statement construction.

use futures::{StreamExt, TryStreamExt};

use crate::error::AppError;
use crate::store::row::{Params, Row, RowStream};
use crate::store::traits::{QueryExecutor, StatementExecutor};
use crate::store::value::Value;

/// A builder for constructing and executing SQL statements.
///
/// `Query` provides a fluent API for binding positional parameters and
/// executing statements against any [`QueryExecutor`]. Every statement is
/// logged at debug level together with its arguments.
///
/// # Example
///
/// ```ignore
/// let rows = Query::new(&source, "SELECT id FROM versions WHERE product_id = $1")
///     .bind(product_id)
///     .fetch_all()
///     .await?;
/// ```
pub struct Query<'a, E: QueryExecutor + ?Sized> {
    executor: &'a E,
    sql: String,
    params: Params,
}

impl<'a, E: QueryExecutor + ?Sized> Query<'a, E> {
    /// Creates a new query builder.
    pub fn new(executor: &'a E, sql: &str) -> Self {
        Self {
            executor,
            sql: sql.to_string(),
            params: Params::new(),
        }
    }

    /// Binds the next positional parameter (`$1`, `$2`, ... in call order).
    pub fn bind<T: Into<Value>>(mut self, value: T) -> Self {
        self.params.push(value.into());
        self
    }

    /// Returns the SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the parameters bound so far.
    pub fn params(&self) -> &Params {
        &self.params
    }

    fn log(&self) {
        let args = self
            .params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        tracing::debug!(store = %self.executor.side(), args = %args, "{}", self.sql);
    }

    /// Executes the query and returns a stream of rows.
    ///
    /// Use this for memory-efficient iteration over large result sets.
    /// The store stays busy until the stream is dropped.
    pub async fn execute(self) -> Result<RowStream<'a>, AppError> {
        self.log();
        self.executor.query_rows(&self.sql, self.params).await
    }

    /// Executes the query and collects all rows into a vector.
    ///
    /// This is a convenience method for small result sets. For large
    /// results, use [`execute`](Query::execute) and stream the rows.
    pub async fn fetch_all(self) -> Result<Vec<Row>, AppError> {
        self.execute().await?.try_collect().await
    }

    /// Executes the query and returns the first row, if any.
    ///
    /// Remaining rows are drained so the connection is free afterwards.
    pub async fn fetch_one(self) -> Result<Option<Row>, AppError> {
        let mut stream = self.execute().await?;
        let first = stream.next().await.transpose()?;
        while let Some(rest) = stream.next().await {
            rest?;
        }
        Ok(first)
    }

    /// Returns true if the query yields at least one row.
    pub async fn exists(self) -> Result<bool, AppError> {
        Ok(self.fetch_one().await?.is_some())
    }
}

impl<'a, E: StatementExecutor + ?Sized> Query<'a, E> {
    /// Executes the statement and returns the number of affected rows.
    ///
    /// Use this for INSERT, UPDATE and DELETE.
    pub async fn run(self) -> Result<u64, AppError> {
        self.log();
        self.executor.execute_statement(&self.sql, self.params).await
    }

    /// Executes an `INSERT ... RETURNING id` and returns the generated id.
    ///
    /// Used where the target assigns the id instead of carrying the source id.
    pub async fn insert_returning_id(self) -> Result<i64, AppError> {
        let side = self.executor.side();
        let sql = self.sql.clone();
        let row = self
            .fetch_one()
            .await?
            .ok_or_else(|| AppError::statement(side, "insert returned no id", &sql))?;
        row.get("id")
    }
}

/// Extension trait providing a convenient `query()` method.
///
/// Implemented for every [`QueryExecutor`], including trait objects,
/// so `store.query("...")` works on both concrete and boxed stores.
pub trait QueryExt: QueryExecutor {
    /// Creates a new query builder for this executor.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use bz2redmine::store::QueryExt;
    ///
    /// let rows = client.query("SELECT id FROM trackers WHERE id = $1")
    ///     .bind(1)
    ///     .fetch_all()
    ///     .await?;
    /// ```
    fn query(&self, sql: &str) -> Query<'_, Self> {
        Query::new(self, sql)
    }
}

// Blanket implementation for all QueryExecutor types
impl<E: QueryExecutor + ?Sized> QueryExt for E {}

//! Core traits for store access.
//!
//! - [`QueryExecutor`] - Read queries (both stores)
//! - [`StatementExecutor`] - Mutating statements (target store only)

use async_trait::async_trait;

use crate::error::{AppError, StoreSide};
use crate::store::row::{Params, RowStream};

/// Executes read queries against a relational store.
///
/// Implementations stream rows lazily. A connection with an open stream
/// must not be handed another statement until that stream is dropped.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Which database this executor talks to, for logs and errors.
    fn side(&self) -> StoreSide;

    /// Executes a query and returns a stream of result rows.
    ///
    /// # Arguments
    ///
    /// * `sql` - The SQL text, with `$n` placeholders
    /// * `params` - Positional parameters bound to the placeholders
    async fn query_rows(&self, sql: &str, params: Params) -> Result<RowStream<'_>, AppError>;
}

/// Executes mutating statements.
///
/// Only the target store needs this; the source is read-only.
#[async_trait]
pub trait StatementExecutor: QueryExecutor {
    /// Executes a statement and returns the number of affected rows.
    async fn execute_statement(&self, sql: &str, params: Params) -> Result<u64, AppError>;
}

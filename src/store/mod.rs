//! Store abstraction layer for the two relational databases.
//!
//! The migration reads from one store (Bugzilla) and writes to another
//! (Redmine). Both are reached through the same small trait hierarchy:
//!
//! - [`QueryExecutor`] - Run a parameterized query and stream the rows
//! - [`StatementExecutor`] - Run a parameterized mutation
//!
//! # Usage
//!
//! ```ignore
//! use bz2redmine::store::QueryExt;
//!
//! // Streamed read
//! let mut rows = source.query("SELECT id, name FROM products").execute().await?;
//!
//! // Lookup with parameters
//! let row = target
//!     .query("SELECT id FROM versions WHERE project_id = $1 AND name = $2")
//!     .bind(project_id)
//!     .bind(name)
//!     .fetch_one()
//!     .await?;
//!
//! // Mutation
//! target.query("DELETE FROM watchers").run().await?;
//! ```
//!
//! A store has a single connection. Finish (or drop) a row stream before
//! sending the next statement to the same store.

pub(crate) mod busy;
mod macros;
mod query;
mod row;
mod traits;
mod value;

pub mod backends;

// Re-export core types
pub use query::{Query, QueryExt};
pub use row::{Params, Row, RowStream};
pub use traits::{QueryExecutor, StatementExecutor};
pub use value::{FromValue, Value};

// Re-export macro (defined at crate root via #[macro_export])
#[doc(inline)]
pub use crate::sql;

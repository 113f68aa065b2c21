//! Backend implementations for the relational stores.
//!
//! Each backend implements the core traits from [`crate::store::traits`]:
//!
//! - [`QueryExecutor`](crate::store::QueryExecutor) - Required
//! - [`StatementExecutor`](crate::store::StatementExecutor) - Required for the target side
//!
//! # Available Backends
//!
//! | Backend | Module | Status |
//! |---------|--------|--------|
//! | PostgreSQL | [`postgres`] | Available |
//! | MySQL | `mysql` | Future |

pub mod postgres;

//! Compile-time wiring of services to the run [`Context`](crate::context::Context).
//!
//! The context derives `Context`, which makes each of its fields resolvable
//! by type. Services and migration stages derive `FromContext` and are built
//! with `from_ref`:
//!
//! ```ignore
//! use crate::di::{FromContext, FromRef};
//!
//! #[derive(FromContext, Clone)]
//! pub struct Resolver {
//!     source: SourceDb,
//!     target: TargetDb,
//! }
//!
//! let resolver = Resolver::from_ref(&ctx);
//! ```
//!
//! The derive names the context type `Context`, so the deriving module must
//! have it in scope.

/// Extracts a value from a reference to `T`.
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

impl<T: Clone> FromRef<T> for T {
    fn from_ref(input: &T) -> Self {
        input.clone()
    }
}

pub use di_macros::{Context, FromContext};

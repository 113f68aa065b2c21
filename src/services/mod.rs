//! Migration services shared by the stages.
//!
//! Services that need stores use the `FromContext` derive macro for
//! dependency injection; the rest are plain values.

mod allocator;
mod fold;
mod resolver;
mod validation;

pub use allocator::{TreeAllocator, TREE_STEP};
pub use fold::{FoldAction, GroupFold, GroupKey};
pub use resolver::{done_ratio, sentinel_epoch, Resolver};
pub use validation::{ValidationGate, Violation};

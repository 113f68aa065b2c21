//! bz2redmine - Bugzilla to Redmine migration
//!
//! Reloads a Redmine database from a Bugzilla database: products, versions,
//! users, groups, memberships, components, bugs with their comments, work
//! time, CC lists, dependencies and attachments.

pub mod blob;
pub mod cli;
pub mod config;
pub mod context;
pub mod di;
pub mod directory;
pub mod error;
pub mod mapping;
pub mod migrations;
pub mod models;
pub mod services;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

// Re-export FromRef at crate root for di-macros generated code
pub use di::FromRef;

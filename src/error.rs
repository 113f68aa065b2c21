//! Application error types.
//!
//! Every variant is fatal to the run. The CLI reports whatever escapes
//! the pipeline and exits with a non-zero status.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::EnumDomain;
use crate::services::Violation;

/// Which of the two databases a store error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreSide {
    Source,
    Target,
}

impl std::fmt::Display for StoreSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreSide::Source => write!(f, "bugzilla"),
            StoreSide::Target => write!(f, "redmine"),
        }
    }
}

/// Application-level errors for bz2redmine.
#[derive(Error, Debug)]
pub enum AppError {
    // Pre-flight gate
    #[error("Validation failed: {count} offending value(s), fix the mappings and re-run")]
    ValidationFailed {
        count: usize,
        violations: Vec<Violation>,
    },

    // Mapping errors
    #[error("bugzilla bug {entity_id}: cannot map {domain} '{code}'")]
    UnmappedEnumeration {
        domain: EnumDomain,
        entity_id: i64,
        code: String,
    },

    // Directory errors
    #[error("External login directory unavailable: {0}")]
    ExternalDirectoryUnavailable(String),

    // Store errors
    #[error("{side} store failure: {message}")]
    Store {
        side: StoreSide,
        message: String,
        sql: Option<String>,
    },

    #[error("Failed to write attachment payload to {path}: {source}")]
    BlobPersist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Rows out of order on '{column}': group {found} arrived after group {previous}")]
    StreamOrderingViolation {
        column: String,
        previous: String,
        found: String,
    },

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a store error without statement context.
    pub fn store(side: StoreSide, message: impl Into<String>) -> Self {
        AppError::Store {
            side,
            message: message.into(),
            sql: None,
        }
    }

    /// Builds a store error for a failed statement.
    pub fn statement(side: StoreSide, message: impl Into<String>, sql: &str) -> Self {
        AppError::Store {
            side,
            message: message.into(),
            sql: Some(sql.to_string()),
        }
    }
}

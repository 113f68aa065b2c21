//! Application context providing dependency injection root.

use std::ops::Deref;
use std::sync::Arc;

use crate::blob::BlobStore;
use crate::config::Config;
use crate::di::Context as ContextDerive;
use crate::directory::LoginDirectory;
use crate::mapping::EnumMapper;
use crate::store::{QueryExecutor, StatementExecutor};

/// Read-only Bugzilla store.
#[derive(Clone)]
pub struct SourceDb(Arc<dyn QueryExecutor>);

impl SourceDb {
    pub fn new(store: impl QueryExecutor + 'static) -> Self {
        Self(Arc::new(store))
    }
}

impl From<Arc<dyn QueryExecutor>> for SourceDb {
    fn from(store: Arc<dyn QueryExecutor>) -> Self {
        Self(store)
    }
}

impl Deref for SourceDb {
    type Target = dyn QueryExecutor;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

/// Writable Redmine store.
#[derive(Clone)]
pub struct TargetDb(Arc<dyn StatementExecutor>);

impl TargetDb {
    pub fn new(store: impl StatementExecutor + 'static) -> Self {
        Self(Arc::new(store))
    }
}

impl From<Arc<dyn StatementExecutor>> for TargetDb {
    fn from(store: Arc<dyn StatementExecutor>) -> Self {
        Self(store)
    }
}

impl Deref for TargetDb {
    type Target = dyn StatementExecutor;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

/// Root application context for dependency injection.
///
/// The Context holds all shared dependencies and uses `#[derive(Context)]`
/// to generate `FromRef` implementations for each field, so services and
/// migration stages resolve what they need at compile time.
#[derive(ContextDerive, Clone)]
pub struct Context {
    /// Bugzilla connection.
    pub source: SourceDb,
    /// Redmine connection.
    pub target: TargetDb,
    /// Run configuration.
    pub config: Arc<Config>,
    /// Enumeration tables built from the configuration.
    pub mapper: Arc<EnumMapper>,
    /// Attachment payload storage.
    pub blobs: Arc<dyn BlobStore>,
    /// External login directory, when users may authenticate externally.
    pub directory: Option<Arc<dyn LoginDirectory>>,
}

impl Context {
    /// Creates a new context with the given dependencies.
    pub fn new(
        source: SourceDb,
        target: TargetDb,
        config: Config,
        blobs: Arc<dyn BlobStore>,
        directory: Option<Arc<dyn LoginDirectory>>,
    ) -> Self {
        let mapper = EnumMapper::new(&config.mappings);
        Self {
            source,
            target,
            config: Arc::new(config),
            mapper: Arc::new(mapper),
            blobs,
            directory,
        }
    }
}

//! Scripted in-memory stores for unit tests.
//!
//! A [`FakeStore`] answers queries from responders keyed by a SQL substring
//! and records every statement it sees. It enforces the same one-statement-
//! at-a-time rule as the Postgres backend, so a stage that queries a store
//! while streaming from it fails in tests too.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_stream::try_stream;
use async_trait::async_trait;
use figment::{
    providers::{Format, Toml},
    Figment,
};

use crate::blob::BlobStore;
use crate::config::Config;
use crate::context::{Context, SourceDb, TargetDb};
use crate::directory::LoginDirectory;
use crate::error::{AppError, StoreSide};
use crate::store::busy::BusyGuard;
use crate::store::{Params, QueryExecutor, Row, RowStream, StatementExecutor};

type Responder = Box<dyn Fn(&Params) -> Vec<Row> + Send + Sync>;

/// A statement seen by a [`FakeStore`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub sql: String,
    pub params: Params,
    pub mutation: bool,
}

pub struct FakeStore {
    side: StoreSide,
    responders: Vec<(String, Responder)>,
    log: Mutex<Vec<Recorded>>,
    next_id: AtomicI64,
    busy: Arc<AtomicBool>,
}

impl FakeStore {
    fn new(side: StoreSide) -> Self {
        Self {
            side,
            responders: Vec::new(),
            log: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn source() -> Self {
        Self::new(StoreSide::Source)
    }

    pub fn target() -> Self {
        Self::new(StoreSide::Target)
    }

    /// Answers queries containing `needle` with fixed rows.
    ///
    /// The most recently registered matching responder wins.
    pub fn respond(self, needle: &str, rows: Vec<Row>) -> Self {
        self.respond_with(needle, move |_| rows.clone())
    }

    /// Answers queries containing `needle` from their parameters.
    pub fn respond_with(
        mut self,
        needle: &str,
        f: impl Fn(&Params) -> Vec<Row> + Send + Sync + 'static,
    ) -> Self {
        self.responders.push((needle.to_string(), Box::new(f)));
        self
    }

    /// First id handed out by `INSERT ... RETURNING id`.
    pub fn ids_from(self, first: i64) -> Self {
        self.next_id.store(first, Ordering::SeqCst);
        self
    }

    fn record(&self, sql: &str, params: &Params, mutation: bool) {
        if let Ok(mut log) = self.log.lock() {
            log.push(Recorded {
                sql: sql.to_string(),
                params: params.clone(),
                mutation,
            });
        }
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.log.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// Parameters of every read query containing `needle`.
    pub fn queries_matching(&self, needle: &str) -> Vec<Params> {
        self.recorded()
            .into_iter()
            .filter(|r| !r.mutation && r.sql.contains(needle))
            .map(|r| r.params)
            .collect()
    }

    /// Parameters of every mutation containing `needle`.
    pub fn statements_matching(&self, needle: &str) -> Vec<Params> {
        self.recorded()
            .into_iter()
            .filter(|r| r.mutation && r.sql.contains(needle))
            .map(|r| r.params)
            .collect()
    }

    /// SQL of every mutation, in order.
    pub fn mutations(&self) -> Vec<String> {
        self.recorded()
            .into_iter()
            .filter(|r| r.mutation)
            .map(|r| r.sql)
            .collect()
    }

    pub fn mutation_count(&self) -> usize {
        self.mutations().len()
    }
}

#[async_trait]
impl QueryExecutor for FakeStore {
    fn side(&self) -> StoreSide {
        self.side
    }

    async fn query_rows(&self, sql: &str, params: Params) -> Result<RowStream<'_>, AppError> {
        let guard = BusyGuard::acquire(&self.busy, self.side, sql)?;

        let rows = if sql.contains("RETURNING id") {
            self.record(sql, &params, true);
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            vec![Row::from_pairs([("id", id)])]
        } else {
            self.record(sql, &params, false);
            self.responders
                .iter()
                .rev()
                .find(|(needle, _)| sql.contains(needle.as_str()))
                .map(|(_, f)| f(&params))
                .unwrap_or_default()
        };

        Ok(Box::pin(try_stream! {
            let _guard = guard;
            for row in rows {
                yield row;
            }
        }))
    }
}

#[async_trait]
impl StatementExecutor for FakeStore {
    async fn execute_statement(&self, sql: &str, params: Params) -> Result<u64, AppError> {
        let _guard = BusyGuard::acquire(&self.busy, self.side, sql)?;
        self.record(sql, &params, true);
        Ok(1)
    }
}

/// Blob store keeping payloads in memory.
#[derive(Default)]
pub struct MemoryBlobStore {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn files(&self) -> BTreeMap<String, Vec<u8>> {
        self.files.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn persist(&self, file_name: &str, payload: &[u8]) -> Result<PathBuf, AppError> {
        if let Ok(mut files) = self.files.lock() {
            files.insert(file_name.to_string(), payload.to_vec());
        }
        Ok(PathBuf::from(file_name))
    }
}

pub const TEST_CONFIG: &str = r#"
    [source]
    uri = "postgresql://localhost/bugs"

    [target]
    uri = "postgresql://localhost/redmine"

    [mappings.priorities]
    P1 = 7
    P2 = 6

    [mappings.trackers]
    blocker = 1
    enhancement = 2

    [mappings.statuses]
    NEW = 1
    CLOSED = 5

    [attachments]
    path = "/tmp/files"
"#;

pub fn test_config() -> Config {
    Config::from_figment(Figment::new().merge(Toml::string(TEST_CONFIG)))
        .expect("test config parses")
}

/// Fake stores wired into a [`Context`].
pub struct TestRig {
    pub source: Arc<FakeStore>,
    pub target: Arc<FakeStore>,
    pub blobs: Arc<MemoryBlobStore>,
    pub ctx: Context,
}

impl TestRig {
    pub fn new(source: FakeStore, target: FakeStore) -> Self {
        Self::with_config(source, target, test_config(), None)
    }

    pub fn with_default_tracker(source: FakeStore, target: FakeStore, tracker_id: i64) -> Self {
        let mut config = test_config();
        config.mappings.default_tracker_id = Some(tracker_id);
        Self::with_config(source, target, config, None)
    }

    pub fn with_config(
        source: FakeStore,
        target: FakeStore,
        config: Config,
        directory: Option<Arc<dyn LoginDirectory>>,
    ) -> Self {
        let source = Arc::new(source);
        let target = Arc::new(target);
        let blobs = Arc::new(MemoryBlobStore::default());
        let ctx = Context::new(
            SourceDb::from(source.clone() as Arc<dyn QueryExecutor>),
            TargetDb::from(target.clone() as Arc<dyn StatementExecutor>),
            config,
            blobs.clone(),
            directory,
        );
        Self {
            source,
            target,
            blobs,
            ctx,
        }
    }
}

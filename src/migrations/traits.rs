//! Migration stage trait and registry.

use std::fmt;

use futures::future::BoxFuture;

use crate::context::Context;
use crate::error::AppError;

/// Counts reported by one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Primary records created.
    pub records: u64,
    /// Owned records created alongside them (journals, seeded links, ...).
    pub secondary: u64,
}

impl StageReport {
    pub fn records(records: u64) -> Self {
        Self {
            records,
            secondary: 0,
        }
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secondary == 0 {
            write!(f, "{} record(s)", self.records)
        } else {
            write!(f, "{} record(s), {} owned", self.records, self.secondary)
        }
    }
}

/// One stage of the pipeline.
///
/// Uses BoxFuture to avoid `'static` requirements from `#[async_trait]`.
pub trait Migration: Send + Sync {
    fn id(&self) -> &'static str;
    /// Position in the pipeline; stages run in ascending order.
    fn order(&self) -> u32;
    fn description(&self) -> &'static str;
    fn up<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<StageReport, AppError>>;
}

/// Outcome of one applied stage.
#[derive(Debug, Clone)]
pub struct AppliedStage {
    pub id: &'static str,
    pub report: StageReport,
}

// =============================================================================
// Migration Registry
// =============================================================================

pub struct Register {
    migrations: Vec<Box<dyn Migration>>,
}

impl Register {
    pub fn new() -> Self {
        Self {
            migrations: Vec::new(),
        }
    }

    pub fn register(mut self, migration: impl Migration + 'static) -> Self {
        self.migrations.push(Box::new(migration));
        self
    }

    /// Iterate over migrations.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Migration> {
        self.migrations.iter().map(|m| m.as_ref())
    }

    /// Runs every stage in order, stopping at the first failure.
    ///
    /// There is no rollback: a failed run leaves earlier stages' rows in
    /// place and is fixed by running again from the start.
    pub async fn run_all(&self, ctx: &Context) -> Result<Vec<AppliedStage>, AppError> {
        let mut stages: Vec<&dyn Migration> = self.iter().collect();
        stages.sort_by_key(|m| m.order());

        let mut applied = Vec::with_capacity(stages.len());
        for migration in stages {
            tracing::info!(
                "Applying stage {} ({}): {}",
                migration.id(),
                migration.order(),
                migration.description()
            );

            let report = migration.up(ctx).await.map_err(|e| {
                tracing::error!("Stage {} failed: {}", migration.id(), e);
                e
            })?;

            tracing::info!("Stage {} done: {}", migration.id(), report);
            applied.push(AppliedStage {
                id: migration.id(),
                report,
            });
        }

        Ok(applied)
    }
}

impl Default for Register {
    fn default() -> Self {
        Self::new()
    }
}

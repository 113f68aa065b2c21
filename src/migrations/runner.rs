//! Pipeline runner: validation gate first, then every stage.

use crate::context::Context;
use crate::di::FromRef;
use crate::error::AppError;
use crate::migrations::stages;
use crate::migrations::traits::AppliedStage;
use crate::services::ValidationGate;

/// Result of a full run.
#[derive(Debug, Clone)]
pub struct MigrationResult {
    pub applied: Vec<AppliedStage>,
}

impl MigrationResult {
    /// Total primary records created across all stages.
    pub fn total_records(&self) -> u64 {
        self.applied.iter().map(|s| s.report.records).sum()
    }
}

/// Runs only the validation gate.
pub async fn run_checks(ctx: &Context) -> Result<(), AppError> {
    ValidationGate::from_ref(ctx).check().await
}

/// Runs the gate, then all stages in order.
///
/// The gate touches nothing in Redmine, so a rejected run leaves the target
/// exactly as it was.
pub async fn run_migrations(ctx: &Context) -> Result<MigrationResult, AppError> {
    run_checks(ctx).await?;

    let applied = stages::create_register().run_all(ctx).await?;
    Ok(MigrationResult { applied })
}

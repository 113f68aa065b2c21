//! Migrate command handler.

use color_eyre::Result;

use crate::migrations::run_migrations;

use super::App;

impl App {
    /// Run the full migration.
    pub async fn run_migrate(&self) -> Result<()> {
        let ctx = self.connect().await?;

        tracing::info!("Migrating Bugzilla into Redmine...");
        let result = run_migrations(&ctx).await?;

        for stage in &result.applied {
            tracing::info!("  {}: {}", stage.id, stage.report);
        }
        tracing::info!(
            "Migration complete: {} stage(s), {} record(s)",
            result.applied.len(),
            result.total_records()
        );

        Ok(())
    }
}

//! Check command handler.

use color_eyre::Result;

use crate::migrations::run_checks;

use super::App;

impl App {
    /// Run the validation gate and report the outcome.
    pub async fn run_check(&self) -> Result<()> {
        let ctx = self.connect().await?;

        tracing::info!("Running validation gate...");
        run_checks(&ctx).await?;
        tracing::info!("All Bugzilla values can be mapped");

        Ok(())
    }
}

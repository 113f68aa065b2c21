//! The migration pipeline.
//!
//! Stages are:
//! - **Destructive**: each clears its Redmine tables before loading
//! - **Ordered**: stages run in foreign-key dependency order
//! - **Fail-fast**: the first error aborts the run, with no rollback
//! - **Gated**: nothing is cleared until the validation gate passes

mod runner;
pub mod stages;
mod traits;

pub use runner::{run_checks, run_migrations, MigrationResult};
pub use traits::{AppliedStage, Migration, Register, StageReport};

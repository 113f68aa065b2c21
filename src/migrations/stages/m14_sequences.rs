//! Id sequences catch up with the ids carried over from Bugzilla.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::context::Context;
use crate::error::AppError;
use crate::migrations::stages::resync_sequence;
use crate::migrations::{Migration, StageReport};

/// Tables whose rows were inserted with explicit ids.
const CARRIED_ID_TABLES: &[&str] = &[
    "projects",
    "versions",
    "users",
    "issue_categories",
    "issues",
    "journals",
    "custom_fields",
    "attachments",
];

pub struct M14Sequences;

impl Migration for M14Sequences {
    fn id(&self) -> &'static str {
        "m14_sequences"
    }

    fn order(&self) -> u32 {
        14
    }

    fn description(&self) -> &'static str {
        "Resynchronise id sequences"
    }

    fn up<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<StageReport, AppError>> {
        async move {
            for table in CARRIED_ID_TABLES {
                resync_sequence(&*ctx.target, table).await?;
            }
            Ok(StageReport::default())
        }
        .boxed()
    }
}

//! CC lists become issue watchers.

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};

use crate::context::Context;
use crate::error::AppError;
use crate::migrations::stages::clear_tables;
use crate::migrations::{Migration, StageReport};
use crate::sql;

pub struct M11Watchers;

impl Migration for M11Watchers {
    fn id(&self) -> &'static str {
        "m11_watchers"
    }

    fn order(&self) -> u32 {
        11
    }

    fn description(&self) -> &'static str {
        "CC entries to watchers"
    }

    fn up<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<StageReport, AppError>> {
        async move {
            let target = &*ctx.target;
            clear_tables(target, &["watchers"]).await?;

            let mut rows = sql!(ctx.source, "SELECT bug_id, who FROM cc ORDER BY bug_id, who")
                .execute()
                .await?;

            let mut count = 0;
            while let Some(row) = rows.next().await {
                let row = row?;
                sql!(
                    target,
                    "INSERT INTO watchers (watchable_type, watchable_id, user_id) \
                     VALUES ('Issue', $1, $2)",
                    row.get::<i64>("bug_id")?,
                    row.get::<i64>("who")?,
                )
                .run()
                .await?;
                count += 1;
            }

            Ok(StageReport::records(count))
        }
        .boxed()
    }
}

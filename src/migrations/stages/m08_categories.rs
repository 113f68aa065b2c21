//! Components become issue categories.

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};

use crate::context::Context;
use crate::error::AppError;
use crate::migrations::stages::clear_tables;
use crate::migrations::{Migration, StageReport};
use crate::sql;

pub struct M08Categories;

impl Migration for M08Categories {
    fn id(&self) -> &'static str {
        "m08_categories"
    }

    fn order(&self) -> u32 {
        8
    }

    fn description(&self) -> &'static str {
        "Components to issue categories"
    }

    fn up<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<StageReport, AppError>> {
        async move {
            let target = &*ctx.target;
            clear_tables(target, &["issue_categories"]).await?;

            let mut rows = sql!(
                ctx.source,
                "SELECT id, name, product_id, initialowner FROM components ORDER BY id"
            )
            .execute()
            .await?;

            let mut count = 0;
            while let Some(row) = rows.next().await {
                let row = row?;
                sql!(
                    target,
                    "INSERT INTO issue_categories (id, name, project_id, assigned_to_id) \
                     VALUES ($1, $2, $3, $4)",
                    row.get::<i64>("id")?,
                    row.get::<String>("name")?,
                    row.get::<i64>("product_id")?,
                    row.get_opt::<i64>("initialowner")?,
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

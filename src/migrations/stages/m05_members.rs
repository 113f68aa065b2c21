//! Project memberships for users, derived from group product controls.

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};

use crate::context::Context;
use crate::error::AppError;
use crate::migrations::{Migration, StageReport};
use crate::sql;

pub struct M05Members;

impl Migration for M05Members {
    fn id(&self) -> &'static str {
        "m05_members"
    }

    fn order(&self) -> u32 {
        5
    }

    fn description(&self) -> &'static str {
        "User memberships from group controls"
    }

    fn up<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<StageReport, AppError>> {
        async move {
            let target = &*ctx.target;
            let created_on = ctx.config.redmine.member_created_on;

            let mut rows = sql!(
                ctx.source,
                "SELECT DISTINCT ugm.user_id, gcm.product_id \
                 FROM group_control_map gcm \
                 JOIN user_group_map ugm ON ugm.group_id = gcm.group_id \
                 ORDER BY ugm.user_id, gcm.product_id"
            )
            .execute()
            .await?;

            let mut count = 0;
            while let Some(row) = rows.next().await {
                let row = row?;
                sql!(
                    target,
                    "INSERT INTO members (user_id, project_id, created_on, mail_notification) \
                     VALUES ($1, $2, $3, false)",
                    row.get::<i64>("user_id")?,
                    row.get::<i64>("product_id")?,
                    created_on,
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

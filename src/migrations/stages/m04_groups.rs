//! Bugzilla groups become Redmine group users.
//!
//! Groups live in `users` with `type = 'Group'` and take ids from the users
//! sequence, so they cannot keep their Bugzilla ids.

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};

use crate::context::Context;
use crate::error::AppError;
use crate::migrations::{Migration, StageReport};
use crate::sql;

/// The Bugzilla group whose Redmine counterpart is an administrator.
const ADMIN_GROUP: &str = "admin";

pub struct M04Groups;

impl Migration for M04Groups {
    fn id(&self) -> &'static str {
        "m04_groups"
    }

    fn order(&self) -> u32 {
        4
    }

    fn description(&self) -> &'static str {
        "Groups to group users"
    }

    fn up<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<StageReport, AppError>> {
        async move {
            let target = &*ctx.target;

            let mut rows = sql!(ctx.source, "SELECT id, name FROM groups ORDER BY id")
                .execute()
                .await?;

            let mut count = 0;
            while let Some(row) = rows.next().await {
                let row = row?;
                let name: String = row.get("name")?;

                let id = sql!(
                    target,
                    "INSERT INTO users (lastname, mail_notification, admin, status, type, language) \
                     VALUES ($1, 'only_my_events', $2, 1, 'Group', $3) RETURNING id",
                    &name,
                    name == ADMIN_GROUP,
                    &ctx.config.redmine.default_language,
                )
                .insert_returning_id()
                .await?;

                tracing::debug!("Group {} stored as user {}", name, id);
                count += 1;
            }

            Ok(StageReport::records(count))
        }
        .boxed()
    }
}

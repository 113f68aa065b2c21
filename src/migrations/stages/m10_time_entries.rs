//! Hours logged on comments become time entries.

use chrono::{Datelike, NaiveDateTime};
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};

use crate::context::Context;
use crate::error::AppError;
use crate::migrations::stages::clear_tables;
use crate::migrations::{Migration, StageReport};
use crate::sql;

/// Longest comment Redmine stores on a time entry.
const COMMENT_LIMIT: usize = 255;

/// Leading characters of a comment, cut on a character boundary.
fn comment_excerpt(text: &str) -> String {
    text.chars().take(COMMENT_LIMIT).collect()
}

pub struct M10TimeEntries;

impl Migration for M10TimeEntries {
    fn id(&self) -> &'static str {
        "m10_time_entries"
    }

    fn order(&self) -> u32 {
        10
    }

    fn description(&self) -> &'static str {
        "Work time to time entries"
    }

    fn up<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<StageReport, AppError>> {
        async move {
            let target = &*ctx.target;
            clear_tables(target, &["time_entries"]).await?;

            let mut rows = sql!(
                ctx.source,
                "SELECT b.product_id, a.who, a.bug_id, a.work_time::float8 AS hours, \
                 a.thetext, a.bug_when \
                 FROM longdescs a JOIN bugs b ON b.bug_id = a.bug_id \
                 WHERE a.work_time <> 0 ORDER BY a.bug_when, a.comment_id"
            )
            .execute()
            .await?;

            let mut count = 0;
            while let Some(row) = rows.next().await {
                let row = row?;
                let bug_when: NaiveDateTime = row.get("bug_when")?;
                let spent_on = bug_when.date();
                let comments = row
                    .get_opt::<String>("thetext")?
                    .map(|t| comment_excerpt(&t));

                sql!(
                    target,
                    "INSERT INTO time_entries (project_id, user_id, issue_id, hours, comments, \
                     activity_id, spent_on, tyear, tmonth, tweek, created_on, updated_on) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)",
                    row.get::<i64>("product_id")?,
                    row.get::<i64>("who")?,
                    row.get::<i64>("bug_id")?,
                    row.get::<f64>("hours")?,
                    comments,
                    ctx.config.redmine.time_entry_activity_id,
                    spent_on,
                    spent_on.year(),
                    spent_on.month(),
                    spent_on.iso_week().week(),
                    bug_when,
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

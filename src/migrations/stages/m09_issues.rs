//! Bugs and their comments become issues and journals.
//!
//! The join of `bugs` and `longdescs` is folded on `bug_id`: the first
//! comment row of a bug creates the issue (its text is the description),
//! every later row becomes a journal keeping its author and timestamp.

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};

use crate::context::Context;
use crate::di::FromRef;
use crate::error::AppError;
use crate::migrations::stages::clear_tables;
use crate::migrations::{Migration, StageReport};
use crate::models::TreePosition;
use crate::services::{done_ratio, sentinel_epoch, FoldAction, GroupFold, Resolver};
use crate::sql;
use crate::store::{Row, StatementExecutor, Value};

/// Id of the seeded `URL` custom field.
const URL_FIELD_ID: i64 = 1;

const ISSUE_TABLES: &[&str] = &[
    "issues",
    "journals",
    "custom_fields",
    "custom_fields_trackers",
    "custom_values",
];

/// Sorted by bug, then comment time; `updated_on` is computed per bug here
/// because the source is busy streaming while issues are written.
const ISSUE_ROWS: &str = "\
    SELECT b.bug_id, b.assigned_to, b.bug_status, b.creation_ts, b.short_desc, \
           b.product_id, b.reporter, b.version, \
           b.estimated_time::float8 AS estimated_time, \
           b.remaining_time::float8 AS remaining_time, \
           b.deadline, b.bug_severity, b.priority, b.component_id, b.bug_file_loc, \
           ld.comment_id, ld.thetext, ld.bug_when, ld.who, \
           MAX(ld.bug_when) OVER (PARTITION BY b.bug_id) AS updated_on \
    FROM bugs b JOIN longdescs ld ON ld.bug_id = b.bug_id \
    ORDER BY b.bug_id, ld.bug_when, ld.comment_id";

pub struct M09Issues;

impl Migration for M09Issues {
    fn id(&self) -> &'static str {
        "m09_issues"
    }

    fn order(&self) -> u32 {
        9
    }

    fn description(&self) -> &'static str {
        "Bugs to issues with journals and the URL custom field"
    }

    fn up<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<StageReport, AppError>> {
        async move {
            let target = &*ctx.target;
            let resolver = Resolver::from_ref(ctx);

            clear_tables(target, ISSUE_TABLES).await?;
            seed_url_field(target, &ctx.config.redmine.tracker_ids).await?;

            let rows = sql!(ctx.source, ISSUE_ROWS).execute().await?;
            let mut actions = Box::pin(GroupFold::new("bug_id").fold(rows));

            let mut report = StageReport::default();
            while let Some(action) = actions.next().await {
                match action? {
                    FoldAction::Primary { row, .. } => {
                        insert_issue(ctx, &resolver, &row).await?;
                        report.records += 1;
                    }
                    FoldAction::Secondary { key, row } => {
                        sql!(
                            target,
                            "INSERT INTO journals (id, journalized_id, journalized_type, user_id, notes, created_on) \
                             VALUES ($1, $2, 'Issue', $3, $4, $5)",
                            row.get::<i64>("comment_id")?,
                            key.as_int(),
                            row.get::<i64>("who")?,
                            row.get_raw("thetext"),
                            row.get_raw("bug_when"),
                        )
                        .run()
                        .await?;
                        report.secondary += 1;
                    }
                }
            }

            Ok(report)
        }
        .boxed()
    }
}

async fn seed_url_field(
    target: &dyn StatementExecutor,
    tracker_ids: &[i64],
) -> Result<(), AppError> {
    sql!(
        target,
        "INSERT INTO custom_fields (id, type, name, field_format, possible_values, max_length, \
         is_for_all, is_filter, searchable, default_value) \
         VALUES ($1, 'IssueCustomField', 'URL', 'string', '--- []\n', 255, true, true, true, '')",
        URL_FIELD_ID
    )
    .run()
    .await?;

    for &tracker_id in tracker_ids {
        sql!(
            target,
            "INSERT INTO custom_fields_trackers (custom_field_id, tracker_id) VALUES ($1, $2)",
            URL_FIELD_ID,
            tracker_id
        )
        .run()
        .await?;
    }
    Ok(())
}

async fn insert_issue(ctx: &Context, resolver: &Resolver, row: &Row) -> Result<(), AppError> {
    let target = &*ctx.target;
    let mapper = &ctx.mapper;

    let bug_id: i64 = row.get("bug_id")?;
    let product_id: i64 = row.get("product_id")?;
    let code = |column: &str| -> Result<String, AppError> {
        Ok(row.get_opt::<String>(column)?.unwrap_or_default())
    };

    let priority_id = mapper.map_priority(bug_id, &code("priority")?)?;
    let tracker_id = mapper.map_tracker(bug_id, &code("bug_severity")?)?;
    let status_id = mapper.map_status(bug_id, &code("bug_status")?)?;

    let fixed_version_id = match row.get_opt::<String>("version")? {
        Some(version) => resolver.resolve_version_id(product_id, &version).await?,
        None => None,
    };

    let estimated = row.get_raw("estimated_time").cloned().unwrap_or(Value::Null);
    let remaining = row.get_raw("remaining_time").cloned().unwrap_or(Value::Null);
    let updated_on = row
        .get_opt::<chrono::NaiveDateTime>("updated_on")?
        .unwrap_or_else(sentinel_epoch);
    let created_on = row.get_raw("creation_ts");

    sql!(
        target,
        "INSERT INTO issues (id, project_id, subject, description, assigned_to_id, author_id, \
         created_on, updated_on, start_date, due_date, done_ratio, estimated_hours, priority_id, \
         fixed_version_id, category_id, tracker_id, status_id, root_id, lft, rgt) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)",
        bug_id,
        product_id,
        row.get_raw("short_desc"),
        row.get_raw("thetext"),
        row.get_raw("assigned_to"),
        row.get_raw("reporter"),
        created_on,
        updated_on,
        created_on,
        row.get_raw("deadline"),
        done_ratio(&estimated, &remaining),
        estimated,
        priority_id,
        fixed_version_id,
        row.get_raw("component_id"),
        tracker_id,
        status_id,
        bug_id,
        TreePosition::ROOT.lft,
        TreePosition::ROOT.rgt,
    )
    .run()
    .await?;

    sql!(
        target,
        "INSERT INTO custom_values (customized_type, customized_id, custom_field_id, value) \
         VALUES ('Issue', $1, $2, $3)",
        bug_id,
        URL_FIELD_ID,
        row.get_raw("bug_file_loc"),
    )
    .run()
    .await?;

    Ok(())
}

//! Dependency and duplicate links become issue relations.
//!
//! Which Bugzilla column ends up as `issue_from_id` is configured per source
//! table, see [`RelationSource`](crate::config::RelationSource).

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};

use crate::config::RelationSource;
use crate::context::Context;
use crate::error::AppError;
use crate::migrations::stages::clear_tables;
use crate::migrations::{Migration, StageReport};
use crate::sql;
use crate::store::{QueryExecutor, StatementExecutor};

pub struct M12IssueRelations;

impl Migration for M12IssueRelations {
    fn id(&self) -> &'static str {
        "m12_issue_relations"
    }

    fn order(&self) -> u32 {
        12
    }

    fn description(&self) -> &'static str {
        "Dependencies and duplicates to issue relations"
    }

    fn up<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<StageReport, AppError>> {
        async move {
            let target = &*ctx.target;
            clear_tables(target, &["issue_relations"]).await?;

            let mut count = 0;
            for relation in &ctx.config.relations {
                let migrated = migrate_relation(&*ctx.source, target, relation).await?;
                tracing::info!(
                    "{} {} relation(s) from {}",
                    migrated,
                    relation.relation_type,
                    relation.table
                );
                count += migrated;
            }

            Ok(StageReport::records(count))
        }
        .boxed()
    }
}

async fn migrate_relation(
    source: &dyn QueryExecutor,
    target: &dyn StatementExecutor,
    relation: &RelationSource,
) -> Result<u64, AppError> {
    // Identifiers were checked when the configuration was loaded
    let query = format!(
        "SELECT {from} AS issue_from_id, {to} AS issue_to_id FROM {table} ORDER BY {from}, {to}",
        from = relation.from_column,
        to = relation.to_column,
        table = relation.table,
    );

    let mut rows = sql!(source, &query).execute().await?;
    let mut count = 0;
    while let Some(row) = rows.next().await {
        let row = row?;
        sql!(
            target,
            "INSERT INTO issue_relations (issue_from_id, issue_to_id, relation_type) \
             VALUES ($1, $2, $3)",
            row.get::<i64>("issue_from_id")?,
            row.get::<i64>("issue_to_id")?,
            &relation.relation_type,
        )
        .run()
        .await?;
        count += 1;
    }
    Ok(count)
}

//! Bugzilla versions keep their ids in Redmine.

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};

use crate::context::Context;
use crate::error::AppError;
use crate::migrations::stages::clear_tables;
use crate::migrations::{Migration, StageReport};
use crate::sql;

pub struct M02Versions;

impl Migration for M02Versions {
    fn id(&self) -> &'static str {
        "m02_versions"
    }

    fn order(&self) -> u32 {
        2
    }

    fn description(&self) -> &'static str {
        "Product versions"
    }

    fn up<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<StageReport, AppError>> {
        async move {
            let target = &*ctx.target;
            clear_tables(target, &["versions"]).await?;

            let mut rows = sql!(
                ctx.source,
                "SELECT id, product_id, value FROM versions ORDER BY id"
            )
            .execute()
            .await?;

            let mut count = 0;
            while let Some(row) = rows.next().await {
                let row = row?;
                sql!(
                    target,
                    "INSERT INTO versions (id, project_id, name) VALUES ($1, $2, $3)",
                    row.get::<i64>("id")?,
                    row.get::<i64>("product_id")?,
                    row.get::<String>("value")?,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Row, Value};
    use crate::testing::{FakeStore, TestRig};

    #[tokio::test]
    async fn test_versions_keep_ids() {
        let source = FakeStore::source().respond(
            "FROM versions",
            vec![
                Row::from_pairs([
                    ("id", Value::Int(3)),
                    ("product_id", Value::Int(5)),
                    ("value", "1.0".into()),
                ]),
                Row::from_pairs([
                    ("id", Value::Int(4)),
                    ("product_id", Value::Int(5)),
                    ("value", "2.0".into()),
                ]),
            ],
        );
        let rig = TestRig::new(source, FakeStore::target());

        let report = M02Versions.up(&rig.ctx).await.unwrap();

        assert_eq!(report.records, 2);
        assert_eq!(rig.target.mutations()[0], "DELETE FROM versions");
        assert_eq!(
            rig.target.statements_matching("INSERT INTO versions")[1],
            vec![Value::Int(4), Value::Int(5), Value::Text("2.0".into())]
        );
    }
}

//! Values the target needs that no single source row carries.

use chrono::{NaiveDate, NaiveDateTime};

use crate::context::{Context, SourceDb, TargetDb};
use crate::di::FromContext;
use crate::error::AppError;
use crate::sql;
use crate::store::{Row, Value};

/// Fallback timestamp for aggregates over zero rows.
pub fn sentinel_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1970, 1, 1)
        .and_then(|d| d.and_hms_opt(10, 22, 25))
        .unwrap_or_default()
}

/// Progress percentage from Bugzilla's estimate and remaining hours.
///
/// An estimate within 1e-3 of zero yields 0. NULL or non-numeric inputs count as zero.
pub fn done_ratio(estimate: &Value, remaining: &Value) -> f64 {
    let estimate = estimate.as_f64_or_zero();
    if estimate.abs() < 1e-3 {
        return 0.0;
    }
    (estimate - remaining.as_f64_or_zero()) / estimate * 100.0
}

/// Resolves derived values by querying related rows.
///
/// Every lookup is a single short statement, so callers must not hold an
/// open stream on the same store while resolving.
#[derive(FromContext, Clone)]
pub struct Resolver {
    source: SourceDb,
    target: TargetDb,
}

impl Resolver {
    /// Earliest bug creation time in a product.
    pub async fn min_created_at(&self, product_id: i64) -> Result<NaiveDateTime, AppError> {
        aggregate_timestamp(
            sql!(
                self.source,
                "SELECT MIN(creation_ts) AS ts FROM bugs WHERE product_id = $1",
                product_id
            )
            .fetch_one()
            .await?,
        )
    }

    /// Latest comment time across a product's bugs.
    pub async fn max_activity_at(&self, product_id: i64) -> Result<NaiveDateTime, AppError> {
        aggregate_timestamp(
            sql!(
                self.source,
                "SELECT MAX(l.bug_when) AS ts FROM longdescs l \
                 JOIN bugs b ON b.bug_id = l.bug_id WHERE b.product_id = $1",
                product_id
            )
            .fetch_one()
            .await?,
        )
    }

    /// Migrated version id for `(project_id, name)`, or `None` when unresolved.
    pub async fn resolve_version_id(
        &self,
        project_id: i64,
        name: &str,
    ) -> Result<Option<i64>, AppError> {
        let row = sql!(
            self.target,
            "SELECT id FROM versions WHERE project_id = $1 AND name = $2",
            project_id,
            name
        )
        .fetch_one()
        .await?;

        match row {
            Some(row) => row.get_opt("id"),
            None => Ok(None),
        }
    }
}

/// Reads the `ts` aggregate column, substituting the sentinel for NULL or no row.
fn aggregate_timestamp(row: Option<Row>) -> Result<NaiveDateTime, AppError> {
    let ts = match row {
        Some(row) => row.get_opt::<NaiveDateTime>("ts")?,
        None => None,
    };
    Ok(ts.unwrap_or_else(sentinel_epoch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::FromRef;
    use crate::testing::{FakeStore, TestRig};

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_sentinel_epoch() {
        assert_eq!(sentinel_epoch().to_string(), "1970-01-01 10:22:25");
    }

    #[test]
    fn test_done_ratio() {
        assert_eq!(done_ratio(&Value::Float(0.0), &Value::Float(5.0)), 0.0);
        assert_eq!(done_ratio(&Value::Float(0.0005), &Value::Float(0.0)), 0.0);
        assert_eq!(done_ratio(&Value::Float(10.0), &Value::Float(4.0)), 60.0);
        assert_eq!(done_ratio(&Value::Null, &Value::Null), 0.0);
        assert_eq!(done_ratio(&Value::Int(8), &Value::Null), 100.0);
    }

    #[tokio::test]
    async fn test_min_created_at_without_bugs_is_sentinel() {
        let rig = TestRig::new(
            FakeStore::source().respond(
                "MIN(creation_ts)",
                vec![Row::from_pairs([("ts", Value::Null)])],
            ),
            FakeStore::target(),
        );
        let resolver = Resolver::from_ref(&rig.ctx);

        assert_eq!(resolver.min_created_at(5).await.unwrap(), sentinel_epoch());
        assert_eq!(resolver.max_activity_at(5).await.unwrap(), sentinel_epoch());
    }

    #[tokio::test]
    async fn test_max_activity_reads_aggregate() {
        let rig = TestRig::new(
            FakeStore::source().respond(
                "MAX(l.bug_when)",
                vec![Row::from_pairs([("ts", ts("2009-03-04 05:06:07"))])],
            ),
            FakeStore::target(),
        );
        let resolver = Resolver::from_ref(&rig.ctx);

        assert_eq!(
            resolver.max_activity_at(12).await.unwrap(),
            ts("2009-03-04 05:06:07")
        );
        assert_eq!(rig.source.queries_matching("MAX(l.bug_when)"), vec![vec![Value::Int(12)]]);
    }

    #[tokio::test]
    async fn test_resolve_version_id() {
        let rig = TestRig::new(
            FakeStore::source(),
            FakeStore::target().respond_with("FROM versions", |params| {
                if params.get(1) == Some(&Value::Text("1.0".into())) {
                    vec![Row::from_pairs([("id", 31i64)])]
                } else {
                    vec![]
                }
            }),
        );
        let resolver = Resolver::from_ref(&rig.ctx);

        assert_eq!(resolver.resolve_version_id(5, "1.0").await.unwrap(), Some(31));
        assert_eq!(resolver.resolve_version_id(5, "unspecified").await.unwrap(), None);
    }
}

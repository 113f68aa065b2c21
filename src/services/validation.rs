//! Pre-flight gate run before anything in Redmine is touched.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use futures::StreamExt;

use crate::config::Config;
use crate::context::{Context, SourceDb, TargetDb};
use crate::di::FromContext;
use crate::error::AppError;
use crate::mapping::EnumMapper;
use crate::models::EnumDomain;
use crate::sql;

/// One reason the run cannot start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A bug carries a code the mapping does not cover.
    UnmappedCode {
        domain: EnumDomain,
        bug_id: i64,
        code: String,
    },
    /// A configured Redmine id has no row in its lookup table.
    MissingTarget { table: &'static str, id: i64 },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::UnmappedCode {
                domain,
                bug_id,
                code,
            } => write!(f, "bug {}: unknown bug {} '{}'", bug_id, domain, code),
            Violation::MissingTarget { table, id } => {
                write!(f, "cannot find id {} in {} table", id, table)
            }
        }
    }
}

/// Checks mapping coverage and target references.
///
/// The gate never stops at the first problem: it scans everything, logs
/// every violation, then fails once with the full list.
#[derive(FromContext, Clone)]
pub struct ValidationGate {
    source: SourceDb,
    target: TargetDb,
    mapper: Arc<EnumMapper>,
    config: Arc<Config>,
}

impl ValidationGate {
    /// Runs every check.
    ///
    /// # Errors
    ///
    /// [`AppError::ValidationFailed`] carrying every violation found.
    pub async fn check(&self) -> Result<(), AppError> {
        let violations = self.collect_violations().await?;
        if violations.is_empty() {
            tracing::info!("Validation passed");
            return Ok(());
        }

        for violation in &violations {
            tracing::error!("{}", violation);
        }
        Err(AppError::ValidationFailed {
            count: violations.len(),
            violations,
        })
    }

    /// Collects violations without failing on them.
    pub async fn collect_violations(&self) -> Result<Vec<Violation>, AppError> {
        let mut violations = Vec::new();

        for &domain in EnumDomain::all() {
            violations.extend(self.unmapped_codes(domain).await?);
        }
        for (table, ids) in self.target_references() {
            violations.extend(self.missing_targets(table, ids).await?);
        }

        Ok(violations)
    }

    /// Every Redmine id the run will write as a reference, by lookup table.
    ///
    /// Besides the mapped ids this covers the configured trackers, the time
    /// entry activity (an `enumerations` row) and the default role.
    fn target_references(&self) -> Vec<(&'static str, BTreeSet<i64>)> {
        let redmine = &self.config.redmine;

        let mut references: Vec<_> = EnumDomain::all()
            .iter()
            .map(|&domain| {
                let mut ids = self.mapper.target_ids(domain);
                match domain {
                    EnumDomain::Priority => {
                        ids.insert(redmine.time_entry_activity_id);
                    }
                    EnumDomain::Severity => ids.extend(redmine.tracker_ids.iter().copied()),
                    EnumDomain::Status => {}
                }
                (domain.target_table(), ids)
            })
            .collect();
        references.push(("roles", BTreeSet::from([redmine.default_role_id])));
        references
    }

    async fn unmapped_codes(&self, domain: EnumDomain) -> Result<Vec<Violation>, AppError> {
        tracing::info!("Checking bug {} values", domain);

        let query = format!(
            "SELECT bug_id, {} AS code FROM bugs ORDER BY bug_id",
            domain.source_column()
        );
        let mut rows = sql!(self.source, &query).execute().await?;

        let mut violations = Vec::new();
        while let Some(row) = rows.next().await {
            let row = row?;
            let bug_id: i64 = row.get("bug_id")?;
            let code = row.get_opt::<String>("code")?.unwrap_or_default();

            if self.mapper.lookup(domain, &code).is_some() {
                continue;
            }
            match self.mapper.fallback(domain) {
                Some(fallback) => tracing::warn!(
                    "bug {}: unknown bug {} '{}', using {}",
                    bug_id,
                    domain,
                    code,
                    fallback
                ),
                None => violations.push(Violation::UnmappedCode {
                    domain,
                    bug_id,
                    code,
                }),
            }
        }

        Ok(violations)
    }

    async fn missing_targets(
        &self,
        table: &'static str,
        ids: impl IntoIterator<Item = i64>,
    ) -> Result<Vec<Violation>, AppError> {
        let query = format!("SELECT id FROM {} WHERE id = $1", table);

        let mut violations = Vec::new();
        for id in ids {
            if !sql!(self.target, &query, id).exists().await? {
                violations.push(Violation::MissingTarget { table, id });
            }
        }
        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::FromRef;
    use crate::store::Row;
    use crate::testing::{FakeStore, TestRig};

    fn bug(bug_id: i64, code: &str) -> Row {
        Row::from_pairs([("bug_id", crate::store::Value::Int(bug_id)), ("code", code.into())])
    }

    fn all_targets_exist(store: FakeStore) -> FakeStore {
        store.respond_with("WHERE id = $1", |params| {
            vec![Row::from_pairs([("id", params[0].clone())])]
        })
    }

    fn clean_source() -> FakeStore {
        FakeStore::source()
            .respond("priority AS code", vec![bug(1, "P1"), bug(2, "P2")])
            .respond("bug_status AS code", vec![bug(1, "NEW"), bug(2, "CLOSED")])
            .respond("bug_severity AS code", vec![bug(1, "blocker"), bug(2, "enhancement")])
    }

    #[tokio::test]
    async fn test_clean_run_passes() {
        let rig = TestRig::new(clean_source(), all_targets_exist(FakeStore::target()));
        ValidationGate::from_ref(&rig.ctx).check().await.unwrap();
        assert_eq!(rig.target.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_unmapped_priority_is_reported_with_context() {
        let source = FakeStore::source()
            .respond("priority AS code", vec![bug(1, "P1"), bug(9, "P9")])
            .respond("bug_status AS code", vec![bug(1, "NEW")])
            .respond("bug_severity AS code", vec![bug(1, "blocker")]);
        let rig = TestRig::new(source, all_targets_exist(FakeStore::target()));

        let err = ValidationGate::from_ref(&rig.ctx).check().await.unwrap_err();
        match err {
            AppError::ValidationFailed { count, violations } => {
                assert_eq!(count, 1);
                assert_eq!(
                    violations,
                    vec![Violation::UnmappedCode {
                        domain: EnumDomain::Priority,
                        bug_id: 9,
                        code: "P9".into(),
                    }]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_severity_tolerated_with_default_tracker() {
        let source = clean_source().respond("bug_severity AS code", vec![bug(3, "trivial")]);
        let rig = TestRig::with_default_tracker(source, all_targets_exist(FakeStore::target()), 1);

        let violations = ValidationGate::from_ref(&rig.ctx)
            .collect_violations()
            .await
            .unwrap();
        assert!(violations.is_empty());
    }

    #[tokio::test]
    async fn test_missing_target_rows_are_collected() {
        let target = FakeStore::target().respond_with("WHERE id = $1", |params| {
            if params[0] == crate::store::Value::Int(5) {
                vec![]
            } else {
                vec![Row::from_pairs([("id", params[0].clone())])]
            }
        });
        let rig = TestRig::new(clean_source(), target);

        let violations = ValidationGate::from_ref(&rig.ctx)
            .collect_violations()
            .await
            .unwrap();
        assert_eq!(
            violations,
            vec![Violation::MissingTarget {
                table: "issue_statuses",
                id: 5
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_role_is_a_violation() {
        let target = FakeStore::target().respond_with("WHERE id = $1", |params| {
            vec![Row::from_pairs([("id", params[0].clone())])]
        });
        let target = target.respond("FROM roles", vec![]);
        let rig = TestRig::new(clean_source(), target);

        let violations = ValidationGate::from_ref(&rig.ctx)
            .collect_violations()
            .await
            .unwrap();
        assert_eq!(
            violations,
            vec![Violation::MissingTarget {
                table: "roles",
                id: 4
            }]
        );
    }

    #[tokio::test]
    async fn test_every_violation_is_collected_before_failing() {
        let source = FakeStore::source()
            .respond("priority AS code", vec![bug(1, "P9"), bug(2, "P1"), bug(3, "P2")])
            .respond(
                "bug_status AS code",
                vec![bug(1, "NEW"), bug(2, "REOPENED"), bug(3, "CLOSED")],
            )
            .respond(
                "bug_severity AS code",
                vec![bug(1, "blocker"), bug(2, "enhancement"), bug(3, "trivial")],
            );
        let target = all_targets_exist(FakeStore::target()).respond_with(
            "FROM issue_statuses",
            |params| {
                if params[0] == crate::store::Value::Int(5) {
                    vec![]
                } else {
                    vec![Row::from_pairs([("id", params[0].clone())])]
                }
            },
        );
        let rig = TestRig::new(source, target);

        let err = ValidationGate::from_ref(&rig.ctx).check().await.unwrap_err();
        match err {
            AppError::ValidationFailed { count, violations } => {
                assert_eq!(count, 4);
                assert_eq!(
                    violations,
                    vec![
                        Violation::UnmappedCode {
                            domain: EnumDomain::Priority,
                            bug_id: 1,
                            code: "P9".into(),
                        },
                        Violation::UnmappedCode {
                            domain: EnumDomain::Status,
                            bug_id: 2,
                            code: "REOPENED".into(),
                        },
                        Violation::UnmappedCode {
                            domain: EnumDomain::Severity,
                            bug_id: 3,
                            code: "trivial".into(),
                        },
                        Violation::MissingTarget {
                            table: "issue_statuses",
                            id: 5
                        },
                    ]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(rig.target.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_configured_trackers_and_activity_must_exist() {
        let target = all_targets_exist(FakeStore::target())
            .respond_with("FROM trackers", |params| {
                if params[0] == crate::store::Value::Int(3) {
                    vec![]
                } else {
                    vec![Row::from_pairs([("id", params[0].clone())])]
                }
            })
            .respond_with("FROM enumerations", |params| {
                if params[0] == crate::store::Value::Int(9) {
                    vec![]
                } else {
                    vec![Row::from_pairs([("id", params[0].clone())])]
                }
            });
        let mut config = crate::testing::test_config();
        config.redmine.tracker_ids = vec![1, 3];
        config.redmine.time_entry_activity_id = 9;
        let rig = TestRig::with_config(clean_source(), target, config, None);

        let violations = ValidationGate::from_ref(&rig.ctx)
            .collect_violations()
            .await
            .unwrap();
        assert_eq!(
            violations,
            vec![
                Violation::MissingTarget {
                    table: "enumerations",
                    id: 9
                },
                Violation::MissingTarget {
                    table: "trackers",
                    id: 3
                },
            ]
        );
    }
}

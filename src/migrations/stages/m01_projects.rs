//! Products become projects.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::context::Context;
use crate::di::FromRef;
use crate::error::AppError;
use crate::migrations::stages::clear_tables;
use crate::migrations::{Migration, StageReport};
use crate::models::{ProjectIdentifiers, ProjectStatus};
use crate::services::{Resolver, TreeAllocator};
use crate::sql;

/// Tables cleared together with `projects`.
const PROJECT_TABLES: &[&str] = &[
    "projects",
    "projects_trackers",
    "enabled_modules",
    "boards",
    "custom_fields_projects",
    "documents",
    "news",
    "queries",
    "repositories",
    "time_entries",
    "wiki_content_versions",
    "wiki_contents",
    "wiki_pages",
    "wiki_redirects",
    "wikis",
];

pub struct M01Projects;

impl Migration for M01Projects {
    fn id(&self) -> &'static str {
        "m01_projects"
    }

    fn order(&self) -> u32 {
        1
    }

    fn description(&self) -> &'static str {
        "Products to projects, with trackers and modules"
    }

    fn up<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<StageReport, AppError>> {
        async move {
            let source = &*ctx.source;
            let target = &*ctx.target;
            let redmine = &ctx.config.redmine;
            let resolver = Resolver::from_ref(ctx);

            clear_tables(target, PROJECT_TABLES).await?;

            // Collected up front: the resolver queries the source per product
            let products = sql!(
                source,
                "SELECT p.id, p.name, p.description, p.classification_id \
                 FROM products p JOIN classifications c ON c.id = p.classification_id \
                 ORDER BY p.name"
            )
            .fetch_all()
            .await?;

            let mut allocator = TreeAllocator::new();
            let mut identifiers = ProjectIdentifiers::new();
            let mut report = StageReport::default();

            for product in &products {
                let id: i64 = product.get("id")?;
                let name: String = product.get("name")?;
                let status = ProjectStatus::from_classification(product.get("classification_id")?);
                let created_on = resolver.min_created_at(id).await?;
                let updated_on = resolver.max_activity_at(id).await?;
                let position = allocator.allocate();

                sql!(
                    target,
                    "INSERT INTO projects (id, name, description, is_public, identifier, \
                     created_on, updated_on, status, lft, rgt) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
                    id,
                    &name,
                    product.get_raw("description"),
                    true,
                    identifiers.claim(&name),
                    created_on,
                    updated_on,
                    status.id(),
                    position.lft,
                    position.rgt,
                )
                .run()
                .await?;
                report.records += 1;

                for &tracker_id in &redmine.tracker_ids {
                    sql!(
                        target,
                        "INSERT INTO projects_trackers (project_id, tracker_id) VALUES ($1, $2)",
                        id,
                        tracker_id
                    )
                    .run()
                    .await?;
                    report.secondary += 1;
                }

                for module in &redmine.enabled_modules {
                    sql!(
                        target,
                        "INSERT INTO enabled_modules (project_id, name) VALUES ($1, $2)",
                        id,
                        module
                    )
                    .run()
                    .await?;
                    report.secondary += 1;
                }
            }

            Ok(report)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sentinel_epoch;
    use crate::store::{Row, Value};
    use crate::testing::{FakeStore, TestRig};

    fn product(id: i64, name: &str, classification_id: i64) -> Row {
        Row::from_pairs([
            ("id", Value::Int(id)),
            ("name", name.into()),
            ("description", Value::Null),
            ("classification_id", Value::Int(classification_id)),
        ])
    }

    fn no_activity(store: FakeStore) -> FakeStore {
        store.respond("AS ts", vec![Row::from_pairs([("ts", Value::Null)])])
    }

    #[tokio::test]
    async fn test_single_archived_product() {
        let source = no_activity(FakeStore::source())
            .respond("FROM products", vec![product(5, "Widgets", 1)]);
        let rig = TestRig::new(source, FakeStore::target());

        let report = M01Projects.up(&rig.ctx).await.unwrap();
        assert_eq!(report.records, 1);

        let inserts = rig.target.statements_matching("INSERT INTO projects (");
        assert_eq!(inserts.len(), 1);
        assert_eq!(
            inserts[0],
            vec![
                Value::Int(5),
                Value::Text("Widgets".into()),
                Value::Null,
                Value::Bool(true),
                Value::Text("widgets".into()),
                Value::Timestamp(sentinel_epoch()),
                Value::Timestamp(sentinel_epoch()),
                Value::Int(9),
                Value::Int(1),
                Value::Int(2),
            ]
        );
    }

    #[tokio::test]
    async fn test_clears_before_inserting_and_seeds_links() {
        let source = no_activity(FakeStore::source())
            .respond("FROM products", vec![product(2, "Gadgets", 3), product(7, "Tools", 3)]);
        let rig = TestRig::new(source, FakeStore::target());

        let report = M01Projects.up(&rig.ctx).await.unwrap();

        let mutations = rig.target.mutations();
        assert!(mutations[..PROJECT_TABLES.len()]
            .iter()
            .all(|m| m.starts_with("DELETE FROM")));

        let projects = rig.target.statements_matching("INSERT INTO projects (");
        assert_eq!(projects[1][7], Value::Int(1));
        assert_eq!(
            (projects[1][8].clone(), projects[1][9].clone()),
            (Value::Int(5), Value::Int(6))
        );

        // Three trackers and five modules per project
        assert_eq!(rig.target.statements_matching("projects_trackers (").len(), 6);
        assert_eq!(rig.target.statements_matching("enabled_modules (").len(), 10);
        assert_eq!(report.secondary, 16);
    }

    #[tokio::test]
    async fn test_colliding_product_names_get_distinct_identifiers() {
        let source = no_activity(FakeStore::source()).respond(
            "FROM products",
            vec![product(3, "Core Libs", 2), product(4, "core/libs", 2)],
        );
        let rig = TestRig::new(source, FakeStore::target());

        M01Projects.up(&rig.ctx).await.unwrap();

        let identifiers: Vec<_> = rig
            .target
            .statements_matching("INSERT INTO projects (")
            .into_iter()
            .map(|params| params[4].clone())
            .collect();
        assert_eq!(
            identifiers,
            vec![Value::Text("core-libs".into()), Value::Text("core-libs-2".into())]
        );
    }
}

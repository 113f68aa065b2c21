//! Group memberships and the roles users inherit through them.
//!
//! For every (group, product) control the group becomes a project member
//! with the default role. Each user of that group who is a member of the
//! project then gets the same role, inherited from the group's member role.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::context::Context;
use crate::error::AppError;
use crate::migrations::{Migration, StageReport};
use crate::sql;

pub struct M06MemberRoles;

impl Migration for M06MemberRoles {
    fn id(&self) -> &'static str {
        "m06_member_roles"
    }

    fn order(&self) -> u32 {
        6
    }

    fn description(&self) -> &'static str {
        "Group members, direct and inherited member roles"
    }

    fn up<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<StageReport, AppError>> {
        async move {
            let source = &*ctx.source;
            let target = &*ctx.target;
            let redmine = &ctx.config.redmine;

            // Collected up front: group users are read from the source per pair
            let controls = sql!(
                source,
                "SELECT DISTINCT g.id AS group_id, g.name, gcm.product_id \
                 FROM group_control_map gcm JOIN groups g ON g.id = gcm.group_id \
                 ORDER BY g.name, gcm.product_id"
            )
            .fetch_all()
            .await?;

            let mut report = StageReport::default();
            for control in &controls {
                let bz_group_id: i64 = control.get("group_id")?;
                let name: String = control.get("name")?;
                let product_id: i64 = control.get("product_id")?;

                let group_user_id = sql!(
                    target,
                    "SELECT id FROM users WHERE lastname = $1 AND type = 'Group'",
                    &name
                )
                .fetch_one()
                .await?
                .ok_or_else(|| AppError::Internal(format!("group '{}' was not migrated", name)))?
                .get::<i64>("id")?;

                let member_id = sql!(
                    target,
                    "INSERT INTO members (user_id, project_id, created_on, mail_notification) \
                     VALUES ($1, $2, $3, false) RETURNING id",
                    group_user_id,
                    product_id,
                    redmine.member_created_on,
                )
                .insert_returning_id()
                .await?;

                let group_role_id = sql!(
                    target,
                    "INSERT INTO member_roles (member_id, role_id, inherited_from) \
                     VALUES ($1, $2, NULL) RETURNING id",
                    member_id,
                    redmine.default_role_id,
                )
                .insert_returning_id()
                .await?;
                report.records += 1;

                let users = sql!(
                    source,
                    "SELECT user_id FROM user_group_map WHERE group_id = $1 ORDER BY user_id",
                    bz_group_id
                )
                .fetch_all()
                .await?;

                for user in &users {
                    report.secondary += sql!(
                        target,
                        "INSERT INTO member_roles (member_id, role_id, inherited_from) \
                         SELECT m.id, $1, $2 FROM members m \
                         JOIN users u ON u.id = m.user_id AND u.type = 'User' \
                         WHERE m.project_id = $3 AND m.user_id = $4",
                        redmine.default_role_id,
                        group_role_id,
                        product_id,
                        user.get::<i64>("user_id")?,
                    )
                    .run()
                    .await?;
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
    use crate::store::{Row, Value};
    use crate::testing::{FakeStore, TestRig};

    #[tokio::test]
    async fn test_group_member_and_inherited_roles() {
        let source = FakeStore::source()
            .respond(
                "FROM group_control_map",
                vec![Row::from_pairs([
                    ("group_id", Value::Int(8)),
                    ("name", "editbugs".into()),
                    ("product_id", Value::Int(5)),
                ])],
            )
            .respond(
                "FROM user_group_map",
                vec![
                    Row::from_pairs([("user_id", 10i64)]),
                    Row::from_pairs([("user_id", 11i64)]),
                ],
            );
        let target = FakeStore::target()
            .respond("type = 'Group'", vec![Row::from_pairs([("id", 300i64)])])
            .ids_from(40);
        let rig = TestRig::new(source, target);

        let report = M06MemberRoles.up(&rig.ctx).await.unwrap();
        assert_eq!(report.records, 1);
        assert_eq!(report.secondary, 2);

        let member = rig.target.statements_matching("INSERT INTO members");
        assert_eq!(member[0][0], Value::Int(300));
        assert_eq!(member[0][1], Value::Int(5));

        // Member 40 gets role 4 directly; the role row is 41
        let direct = rig.target.statements_matching("VALUES ($1, $2, NULL)");
        assert_eq!(direct, vec![vec![Value::Int(40), Value::Int(4)]]);

        let inherited = rig.target.statements_matching("SELECT m.id, $1, $2");
        assert_eq!(
            inherited,
            vec![
                vec![Value::Int(4), Value::Int(41), Value::Int(5), Value::Int(10)],
                vec![Value::Int(4), Value::Int(41), Value::Int(5), Value::Int(11)],
            ]
        );
        assert_eq!(
            rig.source.queries_matching("FROM user_group_map"),
            vec![vec![Value::Int(8)]]
        );
    }

    #[tokio::test]
    async fn test_missing_group_is_an_error() {
        let source = FakeStore::source().respond(
            "FROM group_control_map",
            vec![Row::from_pairs([
                ("group_id", Value::Int(8)),
                ("name", "ghosts".into()),
                ("product_id", Value::Int(5)),
            ])],
        );
        let rig = TestRig::new(source, FakeStore::target());

        let err = M06MemberRoles.up(&rig.ctx).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }
}

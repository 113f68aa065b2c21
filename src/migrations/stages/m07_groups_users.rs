//! Group membership closure, derived from inherited member roles.

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::context::Context;
use crate::error::AppError;
use crate::migrations::stages::clear_tables;
use crate::migrations::{Migration, StageReport};
use crate::sql;

pub struct M07GroupsUsers;

impl Migration for M07GroupsUsers {
    fn id(&self) -> &'static str {
        "m07_groups_users"
    }

    fn order(&self) -> u32 {
        7
    }

    fn description(&self) -> &'static str {
        "Group membership from inherited roles"
    }

    fn up<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<StageReport, AppError>> {
        async move {
            let target = &*ctx.target;
            clear_tables(target, &["groups_users"]).await?;

            // A user's inherited role points at the group's own member role
            let inserted = sql!(
                target,
                "INSERT INTO groups_users (group_id, user_id) \
                 SELECT DISTINCT gm.user_id, m.user_id \
                 FROM member_roles mr \
                 JOIN members m ON m.id = mr.member_id \
                 JOIN member_roles gmr ON gmr.id = mr.inherited_from \
                 JOIN members gm ON gm.id = gmr.member_id"
            )
            .run()
            .await?;

            Ok(StageReport::records(inserted))
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeStore, TestRig};

    #[tokio::test]
    async fn test_closure_is_one_statement() {
        let rig = TestRig::new(FakeStore::source(), FakeStore::target());

        M07GroupsUsers.up(&rig.ctx).await.unwrap();

        let mutations = rig.target.mutations();
        assert_eq!(mutations.len(), 2);
        assert_eq!(mutations[0], "DELETE FROM groups_users");
        assert!(mutations[1].starts_with("INSERT INTO groups_users"));
        assert!(rig.source.recorded().is_empty());
    }
}

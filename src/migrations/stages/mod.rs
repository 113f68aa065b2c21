//! Pipeline stages, one per Redmine entity family.

mod m01_projects;
mod m02_versions;
mod m03_users;
mod m04_groups;
mod m05_members;
mod m06_member_roles;
mod m07_groups_users;
mod m08_categories;
mod m09_issues;
mod m10_time_entries;
mod m11_watchers;
mod m12_issue_relations;
mod m13_attachments;
mod m14_sequences;

pub use m01_projects::M01Projects;
pub use m02_versions::M02Versions;
pub use m03_users::M03Users;
pub use m04_groups::M04Groups;
pub use m05_members::M05Members;
pub use m06_member_roles::M06MemberRoles;
pub use m07_groups_users::M07GroupsUsers;
pub use m08_categories::M08Categories;
pub use m09_issues::M09Issues;
pub use m10_time_entries::M10TimeEntries;
pub use m11_watchers::M11Watchers;
pub use m12_issue_relations::M12IssueRelations;
pub use m13_attachments::M13Attachments;
pub use m14_sequences::M14Sequences;

use crate::error::AppError;
use crate::migrations::traits::Register;
use crate::sql;
use crate::store::StatementExecutor;

/// Create the stage register in pipeline order.
pub fn create_register() -> Register {
    Register::new()
        .register(M01Projects)
        .register(M02Versions)
        .register(M03Users)
        .register(M04Groups)
        .register(M05Members)
        .register(M06MemberRoles)
        .register(M07GroupsUsers)
        .register(M08Categories)
        .register(M09Issues)
        .register(M10TimeEntries)
        .register(M11Watchers)
        .register(M12IssueRelations)
        .register(M13Attachments)
        .register(M14Sequences)
}

/// Deletes every row of each table, in the order given.
pub(crate) async fn clear_tables(
    target: &dyn StatementExecutor,
    tables: &[&str],
) -> Result<(), AppError> {
    for table in tables {
        let deleted = sql!(target, &format!("DELETE FROM {}", table)).run().await?;
        tracing::debug!("Cleared {} ({} rows)", table, deleted);
    }
    Ok(())
}

/// Moves a table's id sequence past the largest carried-over id.
pub(crate) async fn resync_sequence(
    target: &dyn StatementExecutor,
    table: &str,
) -> Result<(), AppError> {
    let statement = format!(
        "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
         COALESCE((SELECT MAX(id) FROM {table}), 0) + 1, false)"
    );
    sql!(target, &statement).run().await?;
    tracing::debug!("Resynchronised {} id sequence", table);
    Ok(())
}

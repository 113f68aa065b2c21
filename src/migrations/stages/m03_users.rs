//! Bugzilla profiles become Redmine users.

use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};

use crate::context::Context;
use crate::error::AppError;
use crate::migrations::stages::{clear_tables, resync_sequence};
use crate::migrations::{Migration, StageReport};
use crate::models::{hash_password, PersonName, UserStatus};
use crate::sql;
use crate::store::StatementExecutor;

/// Tables cleared together with `users`.
const USER_TABLES: &[&str] = &[
    "users",
    "email_addresses",
    "user_preferences",
    "members",
    "member_roles",
    "groups_users",
    "messages",
    "tokens",
    "watchers",
];

const MAIL_NOTIFICATION: &str = "only_my_events";

/// Serialized preferences: oldest comments first, no self notification.
const PREFERENCES: &str = "---\n:comments_sorting: asc\n:no_self_notified: true\n";

pub struct M03Users;

impl Migration for M03Users {
    fn id(&self) -> &'static str {
        "m03_users"
    }

    fn order(&self) -> u32 {
        3
    }

    fn description(&self) -> &'static str {
        "Profiles to users, preferences and email addresses"
    }

    fn up<'a>(&'a self, ctx: &'a Context) -> BoxFuture<'a, Result<StageReport, AppError>> {
        async move {
            let target = &*ctx.target;
            let redmine = &ctx.config.redmine;
            let hashed_password = hash_password(&redmine.password_salt, &redmine.default_password);

            // Both must be present for directory accounts
            let directory = match (&ctx.directory, &ctx.config.directory) {
                (Some(directory), Some(settings)) => Some((directory, settings.auth_source_id)),
                _ => None,
            };

            clear_tables(target, USER_TABLES).await?;

            let mut rows = sql!(
                ctx.source,
                "SELECT userid, login_name, realname, disabledtext, extern_id \
                 FROM profiles ORDER BY userid"
            )
            .execute()
            .await?;

            let mut report = StageReport::default();
            while let Some(row) = rows.next().await {
                let row = row?;
                let user_id: i64 = row.get("userid")?;
                let email: String = row.get("login_name")?;
                let realname: Option<String> = row.get_opt("realname")?;
                let disabled: Option<String> = row.get_opt("disabledtext")?;
                let extern_id: Option<String> = row.get_opt("extern_id")?;

                let name = PersonName::from_realname(realname.as_deref());
                let status = UserStatus::from_disabled_text(disabled.as_deref());

                let mut external = None;
                if let (Some(_), Some((directory, auth_source_id))) = (&extern_id, directory) {
                    tracing::info!("Searching directory for {}", email);
                    external = directory
                        .resolve_login(&email)
                        .await?
                        .map(|login| (login, auth_source_id));
                }

                match external {
                    Some((login, auth_source_id)) => {
                        tracing::info!("User {} found in directory as {}", email, login);
                        sql!(
                            target,
                            "INSERT INTO users (id, login, firstname, lastname, language, \
                             mail_notification, status, type, auth_source_id) \
                             VALUES ($1, $2, $3, $4, $5, $6, $7, 'User', $8)",
                            user_id,
                            login,
                            &name.firstname,
                            &name.lastname,
                            &redmine.default_language,
                            MAIL_NOTIFICATION,
                            status.id(),
                            auth_source_id,
                        )
                        .run()
                        .await?;
                    }
                    None => {
                        sql!(
                            target,
                            "INSERT INTO users (id, login, firstname, lastname, language, \
                             mail_notification, status, type, hashed_password, salt) \
                             VALUES ($1, $2, $3, $4, $5, $6, $7, 'User', $8, $9)",
                            user_id,
                            &email,
                            &name.firstname,
                            &name.lastname,
                            &redmine.default_language,
                            MAIL_NOTIFICATION,
                            status.id(),
                            &hashed_password,
                            &redmine.password_salt,
                        )
                        .run()
                        .await?;
                    }
                }
                report.records += 1;

                insert_user_extras(target, user_id, &email).await?;
                report.secondary += 2;
            }

            // Group rows take store-assigned ids next
            resync_sequence(target, "users").await?;

            Ok(report)
        }
        .boxed()
    }
}

async fn insert_user_extras(
    target: &dyn StatementExecutor,
    user_id: i64,
    email: &str,
) -> Result<(), AppError> {
    sql!(
        target,
        "INSERT INTO user_preferences (user_id, others) VALUES ($1, $2)",
        user_id,
        PREFERENCES
    )
    .run()
    .await?;

    sql!(
        target,
        "INSERT INTO email_addresses (user_id, address, is_default, notify, created_on, updated_on) \
         VALUES ($1, $2, true, true, now(), now())",
        user_id,
        email
    )
    .run()
    .await?;

    Ok(())
}

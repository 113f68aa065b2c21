//! Macro for convenient SQL statement construction.

/// Macro for inline SQL statements with positional parameters.
///
/// Arguments bind to `$1`, `$2`, ... in the order given.
///
/// # Usage
///
/// ```ignore
/// use bz2redmine::sql;
///
/// // Statement without parameters
/// sql!(target, "DELETE FROM watchers").run().await?;
///
/// // Statement with parameters
/// sql!(
///     target,
///     "INSERT INTO watchers (watchable_type, watchable_id, user_id) VALUES ($1, $2, $3)",
///     "Issue",
///     bug_id,
///     who,
/// )
/// .run()
/// .await?;
/// ```
#[macro_export]
macro_rules! sql {
    // Statement without parameters
    ($store:expr, $sql:expr) => {
        $crate::store::QueryExt::query(&*$store, $sql)
    };
    // Statement with parameters
    ($store:expr, $sql:expr, $($value:expr),+ $(,)?) => {
        $crate::store::QueryExt::query(&*$store, $sql)$(.bind($value))+
    };
}

//! External login directory.
//!
//! Bugzilla profiles with an `extern_id` authenticated against a directory.
//! During migration the directory is asked for the canonical login of each
//! such user; users it does not know become local accounts.
//!
//! Two directories are available: [`LdapDirectory`] searches a live server,
//! [`StaticDirectory`] reads an exported TOML file.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use figment::{
    providers::{Format, Toml},
    Figment,
};
use ldap3::{ldap_escape, Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use serde::Deserialize;

use crate::config::{DirectoryConfig, LdapConfig};
use crate::error::AppError;

const LDAP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves the canonical login for an email address.
#[async_trait]
pub trait LoginDirectory: Send + Sync {
    /// Returns the directory login for `email`, or `None` if unknown.
    async fn resolve_login(&self, email: &str) -> Result<Option<String>, AppError>;
}

/// Opens the directory named by the configuration.
///
/// # Errors
///
/// [`AppError::ExternalDirectoryUnavailable`] when the server cannot be
/// reached or bound, or the export cannot be read.
pub async fn open_directory(
    config: &DirectoryConfig,
) -> Result<Arc<dyn LoginDirectory>, AppError> {
    match (&config.ldap, &config.logins_file) {
        (Some(ldap), _) => Ok(Arc::new(LdapDirectory::connect(ldap).await?)),
        (None, Some(path)) => Ok(Arc::new(StaticDirectory::open(path)?)),
        (None, None) => Err(AppError::ExternalDirectoryUnavailable(
            "no LDAP server or logins file configured".to_string(),
        )),
    }
}

/// Directory backed by an LDAP server.
///
/// Binds once with the configured reader account; each lookup searches the
/// base subtree for `email_attr = email` and returns the first entry's
/// `login_attr`.
pub struct LdapDirectory {
    ldap: Ldap,
    base: String,
    email_attr: String,
    login_attr: String,
}

impl LdapDirectory {
    /// Connects and binds.
    ///
    /// # Errors
    ///
    /// [`AppError::ExternalDirectoryUnavailable`] when the connection or the
    /// bind fails.
    pub async fn connect(config: &LdapConfig) -> Result<Self, AppError> {
        let url = config.url();
        let unavailable =
            |e: ldap3::LdapError| AppError::ExternalDirectoryUnavailable(format!("{}: {}", url, e));

        let settings = LdapConnSettings::new().set_conn_timeout(LDAP_CONNECT_TIMEOUT);
        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(unavailable)?;
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::warn!("LDAP connection closed: {}", e);
            }
        });

        ldap.simple_bind(&config.bind_user, &config.bind_pass)
            .await
            .and_then(|result| result.success())
            .map_err(|e| {
                AppError::ExternalDirectoryUnavailable(format!(
                    "LDAP bind as {} failed: {}",
                    config.bind_user, e
                ))
            })?;

        tracing::info!("Bound to LDAP server {} as {}", url, config.bind_user);
        Ok(Self {
            ldap,
            base: config.base.clone(),
            email_attr: config.email_attr.clone(),
            login_attr: config.login_attr.clone(),
        })
    }
}

#[async_trait]
impl LoginDirectory for LdapDirectory {
    async fn resolve_login(&self, email: &str) -> Result<Option<String>, AppError> {
        let filter = search_filter(&self.email_attr, email);
        tracing::debug!("Searching LDAP under {} for {}", self.base, filter);

        let mut ldap = self.ldap.clone();
        let (entries, _) = ldap
            .search(&self.base, Scope::Subtree, &filter, vec![self.login_attr.as_str()])
            .await
            .and_then(|result| result.success())
            .map_err(|e| {
                AppError::ExternalDirectoryUnavailable(format!(
                    "LDAP search {} failed: {}",
                    filter, e
                ))
            })?;

        Ok(first_login(
            entries.into_iter().map(SearchEntry::construct),
            &self.login_attr,
        ))
    }
}

/// Equality filter with the value escaped.
fn search_filter(attr: &str, value: &str) -> String {
    format!("({}={})", attr, ldap_escape(value))
}

/// First value of `attr` among the entries. Attribute names are case-insensitive.
fn first_login(entries: impl IntoIterator<Item = SearchEntry>, attr: &str) -> Option<String> {
    entries.into_iter().find_map(|entry| {
        entry
            .attrs
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attr))
            .and_then(|(_, values)| values.into_iter().next())
    })
}

#[derive(Debug, Deserialize)]
struct LoginExport {
    #[serde(default)]
    logins: HashMap<String, String>,
}

/// Directory backed by an exported TOML file.
///
/// ```toml
/// [logins]
/// "ada@example.com" = "alovelace"
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    logins: HashMap<String, String>,
}

impl StaticDirectory {
    /// Opens the export.
    ///
    /// # Errors
    ///
    /// [`AppError::ExternalDirectoryUnavailable`] when the file is missing or
    /// malformed; the run cannot decide between local and external accounts.
    pub fn open(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Err(AppError::ExternalDirectoryUnavailable(format!(
                "{} does not exist",
                path.display()
            )));
        }

        let export: LoginExport = Figment::new()
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| {
                AppError::ExternalDirectoryUnavailable(format!("{}: {}", path.display(), e))
            })?;

        tracing::info!(
            "Opened login directory {} ({} entries)",
            path.display(),
            export.logins.len()
        );
        Ok(Self::from_logins(export.logins))
    }

    /// Builds a directory from email to login pairs. Emails match case-insensitively.
    pub fn from_logins(logins: HashMap<String, String>) -> Self {
        Self {
            logins: logins
                .into_iter()
                .map(|(email, login)| (email.to_lowercase(), login))
                .collect(),
        }
    }
}

#[async_trait]
impl LoginDirectory for StaticDirectory {
    async fn resolve_login(&self, email: &str) -> Result<Option<String>, AppError> {
        tracing::debug!("Searching directory for {}", email);
        Ok(self.logins.get(&email.to_lowercase()).cloned())
    }
}

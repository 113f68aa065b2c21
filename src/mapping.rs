//! Enumeration mapper: Bugzilla codes to Redmine ids.
//!
//! The three tables come from configuration and are fixed for the run.
//! Lookups are exact; there is no partial or case-insensitive matching.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::MappingConfig;
use crate::error::AppError;
use crate::models::EnumDomain;

/// Translates enumeration codes for one run.
#[derive(Debug, Clone)]
pub struct EnumMapper {
    priorities: BTreeMap<String, i64>,
    trackers: BTreeMap<String, i64>,
    statuses: BTreeMap<String, i64>,
    default_tracker_id: Option<i64>,
}

impl EnumMapper {
    /// Builds the mapper from the configured tables.
    pub fn new(config: &MappingConfig) -> Self {
        Self {
            priorities: config.priorities.clone(),
            trackers: config.trackers.clone(),
            statuses: config.statuses.clone(),
            default_tracker_id: config.default_tracker_id,
        }
    }

    fn table(&self, domain: EnumDomain) -> &BTreeMap<String, i64> {
        match domain {
            EnumDomain::Priority => &self.priorities,
            EnumDomain::Severity => &self.trackers,
            EnumDomain::Status => &self.statuses,
        }
    }

    /// Looks up `code` in the table for `domain`, with no fallback.
    pub fn lookup(&self, domain: EnumDomain, code: &str) -> Option<i64> {
        self.table(domain).get(code).copied()
    }

    /// Maps a code, applying the severity fallback when configured.
    ///
    /// # Errors
    ///
    /// [`AppError::UnmappedEnumeration`] when the code has no mapping and the
    /// domain has no fallback. `entity_id` is the bug being migrated.
    pub fn map(&self, domain: EnumDomain, entity_id: i64, code: &str) -> Result<i64, AppError> {
        self.lookup(domain, code)
            .or_else(|| self.fallback(domain))
            .ok_or_else(|| AppError::UnmappedEnumeration {
                domain,
                entity_id,
                code: code.to_string(),
            })
    }

    /// Fallback target for unknown codes; only severity has one.
    pub fn fallback(&self, domain: EnumDomain) -> Option<i64> {
        match domain {
            EnumDomain::Severity => self.default_tracker_id,
            EnumDomain::Priority | EnumDomain::Status => None,
        }
    }

    pub fn map_priority(&self, bug_id: i64, priority: &str) -> Result<i64, AppError> {
        self.map(EnumDomain::Priority, bug_id, priority)
    }

    pub fn map_tracker(&self, bug_id: i64, severity: &str) -> Result<i64, AppError> {
        self.map(EnumDomain::Severity, bug_id, severity)
    }

    pub fn map_status(&self, bug_id: i64, status: &str) -> Result<i64, AppError> {
        self.map(EnumDomain::Status, bug_id, status)
    }

    /// Configured source codes for a domain, sorted.
    pub fn codes(&self, domain: EnumDomain) -> impl Iterator<Item = &str> {
        self.table(domain).keys().map(String::as_str)
    }

    /// Every distinct target id a domain can produce, including its fallback.
    pub fn target_ids(&self, domain: EnumDomain) -> BTreeSet<i64> {
        self.table(domain)
            .values()
            .copied()
            .chain(self.fallback(domain))
            .collect()
    }
}

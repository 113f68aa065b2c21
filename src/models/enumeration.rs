//! Enumeration domains translated from Bugzilla codes to Redmine ids.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The three Bugzilla fields mapped through configured lookup tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnumDomain {
    Priority,
    Severity,
    Status,
}

impl EnumDomain {
    /// Returns all domains in gate order.
    pub fn all() -> &'static [EnumDomain] {
        &[EnumDomain::Priority, EnumDomain::Status, EnumDomain::Severity]
    }

    /// Column of `bugs` holding the code.
    pub fn source_column(&self) -> &'static str {
        match self {
            EnumDomain::Priority => "priority",
            EnumDomain::Severity => "bug_severity",
            EnumDomain::Status => "bug_status",
        }
    }

    /// Redmine table the mapped ids must exist in.
    pub fn target_table(&self) -> &'static str {
        match self {
            EnumDomain::Priority => "enumerations",
            EnumDomain::Severity => "trackers",
            EnumDomain::Status => "issue_statuses",
        }
    }
}

impl std::fmt::Display for EnumDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnumDomain::Priority => write!(f, "priority"),
            EnumDomain::Severity => write!(f, "severity"),
            EnumDomain::Status => write!(f, "status"),
        }
    }
}

impl FromStr for EnumDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "priority" | "priorities" => Ok(EnumDomain::Priority),
            "severity" | "tracker" | "trackers" => Ok(EnumDomain::Severity),
            "status" | "statuses" => Ok(EnumDomain::Status),
            _ => Err(format!(
                "Invalid enumeration domain '{}'. Valid values: priority, severity, status",
                s
            )),
        }
    }
}

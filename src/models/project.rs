//! Project-level derivations from Bugzilla products.

use std::collections::HashSet;

/// Bugzilla's built-in "Unclassified" classification.
const UNCLASSIFIED: i64 = 1;

/// Redmine project status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum ProjectStatus {
    Active = 1,
    Archived = 9,
}

impl ProjectStatus {
    /// Products left in the default classification are archived.
    pub fn from_classification(classification_id: i64) -> Self {
        if classification_id == UNCLASSIFIED {
            ProjectStatus::Archived
        } else {
            ProjectStatus::Active
        }
    }

    pub fn id(self) -> i64 {
        self as i64
    }
}

/// Redmine project identifier derived from a product name.
///
/// Lower-cased; characters Redmine rejects in identifiers become `-`.
/// Redmine refuses empty and all-digit identifiers, so those get a
/// `project` prefix.
pub fn project_identifier(name: &str) -> String {
    let identifier: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();

    if identifier.is_empty() {
        "project".to_string()
    } else if identifier.chars().all(|c| c.is_ascii_digit()) {
        format!("project-{}", identifier)
    } else {
        identifier
    }
}

/// Hands out project identifiers, unique within one run.
///
/// Distinct product names can sanitise to the same identifier
/// ("Core Libs" and "core/libs"); later ones get a numeric suffix.
#[derive(Debug, Default)]
pub struct ProjectIdentifiers {
    taken: HashSet<String>,
}

impl ProjectIdentifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifier for `name`, suffixed with `-2`, `-3`, ... when already taken.
    pub fn claim(&mut self, name: &str) -> String {
        let base = project_identifier(name);
        let mut identifier = base.clone();
        let mut n = 2;
        while self.taken.contains(&identifier) {
            identifier = format!("{}-{}", base, n);
            n += 1;
        }

        if identifier != base {
            tracing::warn!(
                "Product '{}' maps to taken identifier '{}', using '{}'",
                name,
                base,
                identifier
            );
        }
        self.taken.insert(identifier.clone());
        identifier
    }
}

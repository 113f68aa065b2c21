//! Folds a sorted parent/child join into primary and secondary records.
//!
//! Bugzilla stores a bug's description as its first comment, so the join of
//! `bugs` with `longdescs` repeats the bug columns on every comment row. The
//! first row of each bug creates the issue; every later row becomes a journal.

use std::cmp::Ordering;
use std::fmt;

use async_stream::try_stream;
use futures::{Stream, StreamExt};

use crate::error::AppError;
use crate::store::{Row, RowStream, Value};

/// Identity of a group: the value of the declared key column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKey {
    Int(i64),
    Text(String),
}

impl GroupKey {
    fn from_value(column: &str, value: Option<&Value>) -> Result<Self, AppError> {
        match value {
            Some(Value::Int(v)) => Ok(GroupKey::Int(*v)),
            Some(Value::Text(v)) => Ok(GroupKey::Text(v.clone())),
            Some(other) => Err(AppError::Internal(format!(
                "group key '{}' has unsupported type {}",
                column,
                other.kind()
            ))),
            None => Err(AppError::Internal(format!(
                "group key column '{}' missing from row",
                column
            ))),
        }
    }

    /// Integer key, for groups keyed by a numeric id.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            GroupKey::Int(v) => Some(*v),
            GroupKey::Text(_) => None,
        }
    }

    fn compare(&self, other: &GroupKey) -> Option<Ordering> {
        match (self, other) {
            (GroupKey::Int(a), GroupKey::Int(b)) => Some(a.cmp(b)),
            (GroupKey::Text(a), GroupKey::Text(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Int(v) => write!(f, "{}", v),
            GroupKey::Text(v) => write!(f, "{}", v),
        }
    }
}

/// What to create for one input row.
#[derive(Debug, Clone, PartialEq)]
pub enum FoldAction {
    /// First row of a group: create the parent.
    Primary { key: GroupKey, row: Row },
    /// Any later row of the same group: create a child of `key`.
    Secondary { key: GroupKey, row: Row },
}

impl FoldAction {
    pub fn key(&self) -> &GroupKey {
        match self {
            FoldAction::Primary { key, .. } | FoldAction::Secondary { key, .. } => key,
        }
    }

    pub fn row(&self) -> &Row {
        match self {
            FoldAction::Primary { row, .. } | FoldAction::Secondary { row, .. } => row,
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, FoldAction::Primary { .. })
    }
}

/// Groups consecutive rows sharing a key column.
///
/// The input must be sorted ascending by the key. A key lower than its
/// predecessor fails with [`AppError::StreamOrderingViolation`].
#[derive(Debug, Clone)]
pub struct GroupFold {
    key_column: String,
    current: Option<GroupKey>,
}

impl GroupFold {
    /// Declares the column the input is grouped and sorted by.
    pub fn new(key_column: impl Into<String>) -> Self {
        Self {
            key_column: key_column.into(),
            current: None,
        }
    }

    pub fn key_column(&self) -> &str {
        &self.key_column
    }

    /// Classifies the next row.
    pub fn step(&mut self, row: Row) -> Result<FoldAction, AppError> {
        let key = GroupKey::from_value(&self.key_column, row.get_raw(&self.key_column))?;

        let ordering = match &self.current {
            None => Ordering::Greater,
            Some(previous) => key.compare(previous).ok_or_else(|| {
                AppError::Internal(format!(
                    "group key '{}' changed type mid-stream",
                    self.key_column
                ))
            })?,
        };

        match ordering {
            Ordering::Equal => Ok(FoldAction::Secondary { key, row }),
            Ordering::Greater => {
                self.current = Some(key.clone());
                Ok(FoldAction::Primary { key, row })
            }
            Ordering::Less => Err(AppError::StreamOrderingViolation {
                column: self.key_column.clone(),
                previous: self
                    .current
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
                found: key.to_string(),
            }),
        }
    }

    /// Folds a whole row stream, stopping at the first error.
    pub fn fold<'a>(
        mut self,
        mut rows: RowStream<'a>,
    ) -> impl Stream<Item = Result<FoldAction, AppError>> + Send + 'a {
        try_stream! {
            while let Some(row) = rows.next().await {
                yield self.step(row?)?;
            }
        }
    }
}

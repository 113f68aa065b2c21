//! Nested-set coordinates.

use serde::{Deserialize, Serialize};

/// A `(lft, rgt)` pair in a nested-set tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TreePosition {
    pub lft: i64,
    pub rgt: i64,
}

impl TreePosition {
    /// Position of a node that is the only member of its own tree.
    pub const ROOT: TreePosition = TreePosition { lft: 1, rgt: 2 };

    /// True if the two intervals share no coordinate.
    pub fn is_disjoint(&self, other: &TreePosition) -> bool {
        self.rgt < other.lft || other.rgt < self.lft
    }
}

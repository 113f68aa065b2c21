//! Nested-set coordinates for migrated projects.

use crate::models::TreePosition;

/// Distance between consecutive `lft` values.
pub const TREE_STEP: i64 = 4;

/// Hands out `(lft, rgt)` pairs in creation order.
///
/// Every project is a root; the gap left after each pair is reserved for one
/// level of children and never compacted.
#[derive(Debug, Clone)]
pub struct TreeAllocator {
    next_lft: i64,
}

impl TreeAllocator {
    pub fn new() -> Self {
        Self {
            next_lft: TreePosition::ROOT.lft,
        }
    }

    pub fn allocate(&mut self) -> TreePosition {
        let position = TreePosition {
            lft: self.next_lft,
            rgt: self.next_lft + 1,
        };
        self.next_lft += TREE_STEP;
        position
    }
}

impl Default for TreeAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_position_is_root() {
        assert_eq!(TreeAllocator::new().allocate(), TreePosition::ROOT);
    }

    #[test]
    fn test_positions_are_disjoint_and_increasing() {
        let mut allocator = TreeAllocator::new();
        let positions: Vec<_> = (0..50).map(|_| allocator.allocate()).collect();

        for pair in positions.windows(2) {
            assert!(pair[0].rgt < pair[1].lft);
            assert_eq!(pair[1].lft - pair[0].lft, TREE_STEP);
        }
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                assert!(a.is_disjoint(b));
            }
        }
    }

    #[test]
    fn test_fixed_step_regardless_of_children() {
        let mut allocator = TreeAllocator::new();
        let leaf = allocator.allocate();
        let parent = allocator.allocate();
        let next = allocator.allocate();

        assert_eq!((leaf.lft, leaf.rgt), (1, 2));
        assert_eq!((parent.lft, parent.rgt), (5, 6));
        assert_eq!((next.lft, next.rgt), (9, 10));
    }
}

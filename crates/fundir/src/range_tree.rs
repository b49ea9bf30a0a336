//! Nested-interval trees over coverage ranges.
//!
//! A `RangeTree` is the working representation of one function's range
//! coverage: every node owns a half-open `[start, end)` interval, a signed
//! `delta` (its count relative to its parent) and its children. Trees are
//! built fresh from a flat range list, merged, normalized and flattened
//! back; they never outlive a merge operation.

use crate::types::RangeCov;

/// A node of a nested-interval tree
///
/// Children are pairwise disjoint, pre-order sorted and strictly contained
/// in their parent. The absolute count at a node is the sum of `delta`
/// along the path from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeTree {
    /// Start offset (inclusive)
    pub start: u32,
    /// End offset (exclusive)
    pub end: u32,
    /// Count relative to the parent node (absolute count for the root)
    pub delta: i64,
    /// Nested child ranges, pre-order sorted
    pub children: Vec<RangeTree>,
}

impl RangeTree {
    /// Create a new node
    #[must_use]
    pub fn new(start: u32, end: u32, delta: i64, children: Vec<RangeTree>) -> Self {
        Self {
            start,
            end,
            delta,
            children,
        }
    }

    /// Build a tree from a pre-order sorted, well-nested range list
    ///
    /// Returns `None` for an empty list. The preconditions (sorted per
    /// [`crate::compare::compare_range_covs`], well nested) are not
    /// validated here; [`crate::FunctionCov::validate`] is the fail-fast
    /// path for untrusted input.
    ///
    /// Uses an explicit ancestor stack instead of recursive descent so
    /// that deeply nested inputs cannot exhaust the call stack.
    #[must_use]
    pub fn from_sorted_ranges(ranges: &[RangeCov]) -> Option<RangeTree> {
        // Stack of open nodes and their absolute counts. Nodes attach to
        // their parent when they close (a later range starts at or past
        // their end) or when the whole list is consumed.
        let mut stack: Vec<(RangeTree, u64)> = Vec::new();
        for range in ranges {
            while stack.len() > 1 {
                let top_is_closed = match stack.last() {
                    Some((top, _)) => top.end <= range.start_offset,
                    None => false,
                };
                if !top_is_closed {
                    break;
                }
                close_top(&mut stack);
            }
            let mut node = RangeTree::new(
                range.start_offset,
                range.end_offset,
                range.count as i64,
                Vec::new(),
            );
            if let Some((_, parent_count)) = stack.last() {
                node.delta -= *parent_count as i64;
            }
            stack.push((node, range.count));
        }
        while stack.len() > 1 {
            close_top(&mut stack);
        }
        stack.pop().map(|(root, _)| root)
    }

    /// Normalize the tree into its canonical minimal form
    ///
    /// Children are normalized first; then maximal runs of contiguous
    /// siblings sharing a `delta` are coalesced into one node (the absorbed
    /// nodes' children are rebased so absolute counts are preserved);
    /// finally a sole child spanning the parent exactly is collapsed into
    /// the parent. Idempotent.
    pub fn normalize(&mut self) {
        for child in &mut self.children {
            child.normalize();
        }
        self.coalesce();
    }

    /// Coalesce same-delta sibling runs and collapse a full-span sole child
    ///
    /// Assumes every child is already internally canonical; only this
    /// node's child list is reshaped (recursing into freshly merged nodes).
    fn coalesce(&mut self) {
        let old_children = std::mem::take(&mut self.children);
        let mut children: Vec<RangeTree> = Vec::with_capacity(old_children.len());
        let mut chain: Vec<RangeTree> = Vec::new();
        let mut cur_end = 0u32;
        for child in old_children {
            let extends_chain = match chain.first() {
                Some(head) => child.delta == head.delta && child.start == cur_end,
                None => false,
            };
            if !extends_chain && !chain.is_empty() {
                end_chain(&mut chain, &mut children);
            }
            cur_end = child.end;
            chain.push(child);
        }
        if !chain.is_empty() {
            end_chain(&mut chain, &mut children);
        }

        if children.len() == 1 && children[0].start == self.start && children[0].end == self.end {
            if let Some(child) = children.pop() {
                self.delta += child.delta;
                self.children = child.children;
                return;
            }
        }
        self.children = children;
    }

    /// Split this node at `value`, returning the right part
    ///
    /// Precondition: `self.start < value < self.end`. `self` is truncated
    /// to `[start, value)`; the returned node covers `[value, end)` with
    /// the same `delta`. A child straddling `value` is split recursively;
    /// children at or after `value` move to the right part.
    pub fn split(&mut self, value: u32) -> RangeTree {
        debug_assert!(self.start < value && value < self.end);
        let mut left_child_len = self.children.len();
        let mut mid: Option<RangeTree> = None;
        for (index, child) in self.children.iter_mut().enumerate() {
            if child.start < value && value < child.end {
                mid = Some(child.split(value));
                left_child_len = index + 1;
                break;
            }
            if child.start >= value {
                left_child_len = index;
                break;
            }
        }
        let mut right_children = self.children.split_off(left_child_len);
        if let Some(mid) = mid {
            right_children.insert(0, mid);
        }
        let right = RangeTree::new(value, self.end, self.delta, right_children);
        self.end = value;
        right
    }

    /// Flatten the tree to a pre-order sorted range list
    ///
    /// Counts are absolute (cumulative delta from the root).
    #[must_use]
    pub fn to_ranges(&self) -> Vec<RangeCov> {
        let mut ranges = Vec::new();
        // Stack of nodes and parent counts, pushed in reverse for pre-order.
        let mut stack: Vec<(&RangeTree, i64)> = vec![(self, 0)];
        while let Some((cur, parent_count)) = stack.pop() {
            let count = parent_count + cur.delta;
            debug_assert!(count >= 0, "absolute counts are non-negative");
            ranges.push(RangeCov {
                start_offset: cur.start,
                end_offset: cur.end,
                count: count.max(0) as u64,
            });
            for child in cur.children.iter().rev() {
                stack.push((child, count));
            }
        }
        ranges
    }
}

/// Pop the top open node and attach it to the node below
fn close_top(stack: &mut Vec<(RangeTree, u64)>) {
    if let Some((closed, _)) = stack.pop() {
        if let Some((parent, _)) = stack.last_mut() {
            parent.children.push(closed);
        }
    }
}

/// Merge a run of contiguous same-delta siblings into its head and emit it
///
/// The head's span is extended over the whole run; the absorbed nodes'
/// children are adopted with `delta` rebased by the difference between
/// their old and new parents, preserving absolute counts.
fn end_chain(chain: &mut Vec<RangeTree>, out: &mut Vec<RangeTree>) {
    let mut drained = chain.drain(..);
    let Some(mut head) = drained.next() else {
        return;
    };
    let mut absorbed_tail = false;
    for tail in drained {
        absorbed_tail = true;
        head.end = tail.end;
        for mut sub_child in tail.children {
            sub_child.delta += tail.delta - head.delta;
            head.children.push(sub_child);
        }
    }
    if absorbed_tail {
        // The adopted children may form new runs at the head's level.
        head.coalesce();
    }
    out.push(head);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start_offset: u32, end_offset: u32, count: u64) -> RangeCov {
        RangeCov {
            start_offset,
            end_offset,
            count,
        }
    }

    #[test]
    fn test_from_sorted_ranges_empty() {
        assert!(RangeTree::from_sorted_ranges(&[]).is_none());
    }

    #[test]
    fn test_from_sorted_ranges_single() {
        let tree = RangeTree::from_sorted_ranges(&[range(0, 10, 3)]).unwrap();
        assert_eq!(tree, RangeTree::new(0, 10, 3, vec![]));
    }

    #[test]
    fn test_from_sorted_ranges_builds_deltas() {
        let ranges = [
            range(0, 100, 2),
            range(10, 50, 5),
            range(20, 30, 1),
            range(60, 90, 0),
        ];
        let tree = RangeTree::from_sorted_ranges(&ranges).unwrap();
        assert_eq!(
            tree,
            RangeTree::new(
                0,
                100,
                2,
                vec![
                    RangeTree::new(10, 50, 3, vec![RangeTree::new(20, 30, -4, vec![])]),
                    RangeTree::new(60, 90, -2, vec![]),
                ]
            )
        );
    }

    #[test]
    fn test_from_sorted_ranges_closes_siblings_at_shared_boundary() {
        let ranges = [range(0, 10, 1), range(2, 5, 0), range(5, 8, 2)];
        let tree = RangeTree::from_sorted_ranges(&ranges).unwrap();
        assert_eq!(tree.children.len(), 2);
        assert_eq!(tree.children[0].end, 5);
        assert_eq!(tree.children[1].start, 5);
    }

    #[test]
    fn test_to_ranges_round_trips_construction() {
        let ranges = vec![
            range(0, 100, 2),
            range(10, 50, 5),
            range(20, 30, 1),
            range(60, 90, 0),
        ];
        let tree = RangeTree::from_sorted_ranges(&ranges).unwrap();
        assert_eq!(tree.to_ranges(), ranges);
    }

    #[test]
    fn test_normalize_coalesces_contiguous_same_count_siblings() {
        let ranges = [range(0, 10, 1), range(2, 5, 4), range(5, 8, 4)];
        let mut tree = RangeTree::from_sorted_ranges(&ranges).unwrap();
        tree.normalize();
        assert_eq!(tree.to_ranges(), vec![range(0, 10, 1), range(2, 8, 4)]);
    }

    #[test]
    fn test_normalize_does_not_coalesce_across_gaps() {
        let ranges = [range(0, 10, 1), range(2, 5, 4), range(6, 8, 4)];
        let mut tree = RangeTree::from_sorted_ranges(&ranges).unwrap();
        tree.normalize();
        assert_eq!(
            tree.to_ranges(),
            vec![range(0, 10, 1), range(2, 5, 4), range(6, 8, 4)]
        );
    }

    #[test]
    fn test_normalize_rebases_absorbed_children() {
        // The [5, 8) sibling joins the [2, 5) chain; its nested [6, 7)
        // child must keep its absolute count of 9 under the new parent.
        let ranges = [
            range(0, 10, 1),
            range(2, 5, 4),
            range(5, 8, 4),
            range(6, 7, 9),
        ];
        let mut tree = RangeTree::from_sorted_ranges(&ranges).unwrap();
        tree.normalize();
        assert_eq!(
            tree.to_ranges(),
            vec![range(0, 10, 1), range(2, 8, 4), range(6, 7, 9)]
        );
    }

    #[test]
    fn test_normalize_collapses_full_span_sole_child() {
        let ranges = [range(0, 10, 1), range(0, 10, 3)];
        let mut tree = RangeTree::from_sorted_ranges(&ranges).unwrap();
        tree.normalize();
        assert_eq!(tree.to_ranges(), vec![range(0, 10, 3)]);
    }

    #[test]
    fn test_normalize_children_before_coalescing() {
        // [0, 4) only reaches count 5 after its own sole-child collapse;
        // the run with [4, 8) must still be detected afterwards.
        let ranges = [
            range(0, 10, 5),
            range(0, 4, 2),
            range(0, 4, 5),
            range(4, 8, 5),
        ];
        let mut tree = RangeTree::from_sorted_ranges(&ranges).unwrap();
        tree.normalize();
        assert_eq!(tree.to_ranges(), vec![range(0, 10, 5), range(0, 8, 5)]);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let ranges = [
            range(0, 100, 2),
            range(10, 20, 4),
            range(20, 30, 4),
            range(30, 60, 4),
            range(35, 40, 4),
            range(70, 80, 2),
        ];
        let mut tree = RangeTree::from_sorted_ranges(&ranges).unwrap();
        tree.normalize();
        let once = tree.clone();
        tree.normalize();
        assert_eq!(tree, once);
    }

    #[test]
    fn test_split_plain() {
        let mut tree = RangeTree::from_sorted_ranges(&[range(0, 10, 2)]).unwrap();
        let right = tree.split(4);
        assert_eq!(tree, RangeTree::new(0, 4, 2, vec![]));
        assert_eq!(right, RangeTree::new(4, 10, 2, vec![]));
    }

    #[test]
    fn test_split_moves_right_children() {
        let ranges = [range(0, 10, 1), range(1, 3, 2), range(6, 9, 3)];
        let mut tree = RangeTree::from_sorted_ranges(&ranges).unwrap();
        let right = tree.split(5);
        assert_eq!(tree.to_ranges(), vec![range(0, 5, 1), range(1, 3, 2)]);
        assert_eq!(right.to_ranges(), vec![range(5, 10, 1), range(6, 9, 3)]);
    }

    #[test]
    fn test_split_straddling_child_recursively() {
        let ranges = [range(0, 10, 1), range(2, 8, 5), range(3, 7, 2)];
        let mut tree = RangeTree::from_sorted_ranges(&ranges).unwrap();
        let right = tree.split(5);
        assert_eq!(
            tree.to_ranges(),
            vec![range(0, 5, 1), range(2, 5, 5), range(3, 5, 2)]
        );
        assert_eq!(
            right.to_ranges(),
            vec![range(5, 10, 1), range(5, 8, 5), range(5, 7, 2)]
        );
    }
}

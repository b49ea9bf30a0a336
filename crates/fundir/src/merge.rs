//! Merging of coverage samples.
//!
//! Coverage produced by independent instrumented runs of the same program
//! is combined here at three nesting levels: processes (scripts grouped by
//! URL), scripts (functions grouped by identical root range) and functions
//! (range trees merged offset by offset). The merged counts are the sum of
//! all observed executions at every offset.
//!
//! Merging consumes its inputs. The results are normalized.

use crate::compare::compare_function_covs;
use crate::normalize::{
    deep_normalize_process_cov, deep_normalize_script_cov, normalize_function_cov,
    normalize_process_cov,
};
use crate::range_tree::RangeTree;
use crate::types::{FunctionCov, ProcessCov, ScriptCov};
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::{debug, trace};

/// Merges a list of process coverages
///
/// Scripts with the same `url` are merged; the result is sorted by URL and
/// script ids are reassigned sequentially (`"0"`, `"1"`, …). An empty input
/// yields an empty process coverage.
#[must_use]
pub fn merge_process_covs(process_covs: Vec<ProcessCov>) -> ProcessCov {
    debug!(samples = process_covs.len(), "merging process coverages");
    if process_covs.len() <= 1 {
        let mut merged = process_covs.into_iter().next().unwrap_or_default();
        deep_normalize_process_cov(&mut merged);
        return merged;
    }

    let mut url_to_scripts: HashMap<String, Vec<ScriptCov>> = HashMap::new();
    for process_cov in process_covs {
        for script_cov in process_cov.result {
            url_to_scripts
                .entry(script_cov.url.clone())
                .or_default()
                .push(script_cov);
        }
    }

    let mut result: Vec<ScriptCov> = Vec::with_capacity(url_to_scripts.len());
    for (_, scripts) in url_to_scripts {
        if let Some(merged) = merge_script_covs(scripts) {
            result.push(merged);
        }
    }

    let mut merged = ProcessCov { result };
    normalize_process_cov(&mut merged);
    merged
}

/// Merges a list of matching script coverages
///
/// Scripts are matching if they have the same `url`; the first entry's
/// `script_id` and `url` are kept. Functions sharing a root range are
/// merged, with block-level granularity preferred over function-level (a
/// block-level entry discards any previously grouped function-level
/// entries for the same range, and function-level entries arriving after
/// block-level ones are dropped). Returns `None` for an empty input.
#[must_use]
pub fn merge_script_covs(script_covs: Vec<ScriptCov>) -> Option<ScriptCov> {
    if script_covs.len() <= 1 {
        let mut merged = script_covs.into_iter().next()?;
        deep_normalize_script_cov(&mut merged);
        return Some(merged);
    }

    let script_id = script_covs[0].script_id.clone();
    let url = script_covs[0].url.clone();
    trace!(url = %url, scripts = script_covs.len(), "merging script coverages");

    let mut range_to_funcs: HashMap<(u32, u32), Vec<FunctionCov>> = HashMap::new();
    for script_cov in script_covs {
        for func_cov in script_cov.functions {
            let root_range = match func_cov.root_range() {
                Some(root) => (root.start_offset, root.end_offset),
                None => continue,
            };
            match range_to_funcs.get_mut(&root_range) {
                None => {
                    range_to_funcs.insert(root_range, vec![func_cov]);
                }
                Some(group) => {
                    let group_is_block = group.first().is_some_and(|f| f.is_block_coverage);
                    if !group_is_block && func_cov.is_block_coverage {
                        // Block-level data supersedes whole-function counts
                        // collected so far for this range.
                        group.clear();
                        group.push(func_cov);
                    } else if group_is_block && !func_cov.is_block_coverage {
                        // Whole-function counts arriving after block-level
                        // data are dropped.
                    } else {
                        group.push(func_cov);
                    }
                }
            }
        }
    }

    let mut functions: Vec<FunctionCov> = Vec::with_capacity(range_to_funcs.len());
    for (_, group) in range_to_funcs {
        if let Some(merged) = merge_function_covs(group) {
            functions.push(merged);
        }
    }
    functions.sort_by(compare_function_covs);

    Some(ScriptCov {
        script_id,
        url,
        functions,
    })
}

/// Merges a list of matching function coverages
///
/// Functions are matching if their root ranges have the same span; the
/// first entry's `function_name` is kept. The merged `is_block_coverage`
/// is `false` only when the result is a single never-executed root range.
/// Returns `None` for an empty input.
#[must_use]
pub fn merge_function_covs(func_covs: Vec<FunctionCov>) -> Option<FunctionCov> {
    if func_covs.len() <= 1 {
        let mut merged = func_covs.into_iter().next()?;
        normalize_function_cov(&mut merged);
        return Some(merged);
    }

    let function_name = func_covs
        .first()
        .map(|f| f.function_name.clone())
        .unwrap_or_default();
    let mut trees: Vec<RangeTree> = Vec::with_capacity(func_covs.len());
    for func_cov in &func_covs {
        if let Some(tree) = RangeTree::from_sorted_ranges(&func_cov.ranges) {
            trees.push(tree);
        }
    }

    let mut merged_tree = merge_range_trees(trees)?;
    merged_tree.normalize();
    let ranges = merged_tree.to_ranges();
    let is_block_coverage = !(ranges.len() == 1 && ranges[0].count == 0);

    Some(FunctionCov {
        function_name,
        ranges,
        is_block_coverage,
    })
}

/// Merges trees sharing the same `[start, end)` span into one
///
/// The root `delta` is the sum of the input deltas; children are combined
/// by a sweep over their start offsets. A list of length zero or one is
/// returned unchanged.
#[must_use]
pub fn merge_range_trees(trees: Vec<RangeTree>) -> Option<RangeTree> {
    if trees.len() <= 1 {
        return trees.into_iter().next();
    }
    let start = trees[0].start;
    let end = trees[0].end;
    debug_assert!(
        trees.iter().all(|tree| tree.start == start && tree.end == end),
        "merged trees must share the same span"
    );
    let delta = trees.iter().map(|tree| tree.delta).sum();
    let children = merge_range_tree_children(trees);
    Some(RangeTree::new(start, end, delta, children))
}

/// A child tree tagged with the index of the parent that contributed it
struct RangeTreeWithParent {
    parent_index: usize,
    tree: RangeTree,
}

/// All trees starting at one offset
struct StartEvent {
    offset: u32,
    trees: Vec<RangeTreeWithParent>,
}

/// Start events ordered by offset, with a side buffer for trees split
/// mid-sweep
///
/// The queue is sorted once at construction and consumed front to back.
/// Right remainders produced by `split` re-enter through the pending
/// buffer, which always targets the close offset of the currently open
/// range, so a full re-sort is never needed.
struct StartEventQueue {
    queue: VecDeque<StartEvent>,
    pending_offset: u32,
    pending_trees: Option<Vec<RangeTreeWithParent>>,
}

impl StartEventQueue {
    fn from_parent_trees(parent_trees: Vec<RangeTree>) -> Self {
        let mut start_to_trees: BTreeMap<u32, Vec<RangeTreeWithParent>> = BTreeMap::new();
        for (parent_index, parent) in parent_trees.into_iter().enumerate() {
            for child in parent.children {
                start_to_trees
                    .entry(child.start)
                    .or_default()
                    .push(RangeTreeWithParent {
                        parent_index,
                        tree: child,
                    });
            }
        }
        let queue: VecDeque<StartEvent> = start_to_trees
            .into_iter()
            .map(|(offset, trees)| StartEvent { offset, trees })
            .collect();
        Self {
            queue,
            pending_offset: 0,
            pending_trees: None,
        }
    }

    fn set_pending_offset(&mut self, offset: u32) {
        self.pending_offset = offset;
    }

    fn push_pending_tree(&mut self, tree: RangeTreeWithParent) {
        self.pending_trees.get_or_insert_with(Vec::new).push(tree);
    }

    fn next(&mut self) -> Option<StartEvent> {
        match self.pending_trees.take() {
            None => self.queue.pop_front(),
            Some(pending) => {
                let front_offset = self.queue.front().map(|event| event.offset);
                match front_offset {
                    Some(offset) if offset <= self.pending_offset => {
                        let mut event = self.queue.pop_front()?;
                        if self.pending_offset == offset {
                            event.trees.extend(pending);
                        } else {
                            // The pending trees start later; keep buffering.
                            self.pending_trees = Some(pending);
                        }
                        Some(event)
                    }
                    _ => Some(StartEvent {
                        offset: self.pending_offset,
                        trees: pending,
                    }),
                }
            }
        }
    }
}

/// Sweep the children of all parents into one combined child list
///
/// Keeps a single open output range at a time. Trees extending past the
/// open range's end are split there and the right part re-queued; each
/// tree occurring inside the open range is filed under its parent's index
/// until the range closes and emits one merged child.
fn merge_range_tree_children(parent_trees: Vec<RangeTree>) -> Vec<RangeTree> {
    let parent_count = parent_trees.len();
    let mut result: Vec<RangeTree> = Vec::new();
    let mut start_event_queue = StartEventQueue::from_parent_trees(parent_trees);
    let mut parent_to_nested: Vec<Vec<RangeTree>> = Vec::new();
    parent_to_nested.resize_with(parent_count, Vec::new);
    let mut open_range: Option<(u32, u32)> = None;

    while let Some(event) = start_event_queue.next() {
        if let Some((open_start, open_end)) = open_range {
            if open_end <= event.offset {
                if let Some(child) = next_child(open_start, open_end, &mut parent_to_nested) {
                    result.push(child);
                }
                open_range = None;
            }
        }
        match open_range {
            None => {
                let mut open_range_end = event.offset + 1;
                for RangeTreeWithParent { parent_index, tree } in event.trees {
                    open_range_end = open_range_end.max(tree.end);
                    parent_to_nested[parent_index].push(tree);
                }
                start_event_queue.set_pending_offset(open_range_end);
                open_range = Some((event.offset, open_range_end));
            }
            Some((_, open_end)) => {
                for RangeTreeWithParent {
                    parent_index,
                    mut tree,
                } in event.trees
                {
                    if tree.end > open_end {
                        let right = tree.split(open_end);
                        start_event_queue.push_pending_tree(RangeTreeWithParent {
                            parent_index,
                            tree: right,
                        });
                    }
                    parent_to_nested[parent_index].push(tree);
                }
            }
        }
    }
    if let Some((open_start, open_end)) = open_range {
        if let Some(child) = next_child(open_start, open_end, &mut parent_to_nested) {
            result.push(child);
        }
    }
    result
}

/// Emit the merged child for a closed output range
///
/// A parent that contributed exactly one tree spanning the range exactly
/// is represented by that tree unchanged; any other contribution is
/// wrapped in a zero-delta node spanning the range. The per-parent
/// representatives are then merged recursively.
fn next_child(start: u32, end: u32, parent_to_nested: &mut [Vec<RangeTree>]) -> Option<RangeTree> {
    let mut matching_trees: Vec<RangeTree> = Vec::new();
    for nested in parent_to_nested.iter_mut() {
        if nested.is_empty() {
            continue;
        }
        if nested.len() == 1 && nested[0].start == start && nested[0].end == end {
            matching_trees.extend(nested.drain(..));
        } else {
            matching_trees.push(RangeTree::new(start, end, 0, std::mem::take(nested)));
        }
    }
    merge_range_trees(matching_trees)
}

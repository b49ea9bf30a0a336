//! ASCII drawings of range forests.
//!
//! Debug visualization for [`RangeTree`] values, and the notation the test
//! suite uses to state range fixtures legibly. A forest is drawn as a
//! header row of offsets followed by one block per tree, one row per
//! nesting depth, every range rendered as `[count----)` under its offsets:
//!
//! ```text
//! 0    3    7    10
//! [1------------)
//!      [3--)
//! ```

use crate::compare::compare_range_covs;
use crate::range_tree::RangeTree;
use crate::result::{FundirError, FundirResult};
use crate::types::RangeCov;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Draw a forest of range trees as one string
#[must_use]
pub fn emit_forest(trees: &[RangeTree]) -> String {
    emit_forest_lines(trees).join("\n")
}

/// Draw a forest of range trees, one string per tree plus a header
///
/// The first element is the offset header; each following element is one
/// tree's block (its layers joined with newlines).
#[must_use]
pub fn emit_forest_lines(trees: &[RangeTree]) -> Vec<String> {
    let col_map = get_col_map(trees);
    let mut lines = vec![emit_offsets(&col_map)];
    for tree in trees {
        lines.push(emit_tree(tree, &col_map).join("\n"));
    }
    lines
}

/// Map every offset occurring in the forest to its drawing column
fn get_col_map(trees: &[RangeTree]) -> BTreeMap<u32, usize> {
    let mut events: BTreeSet<u32> = BTreeSet::new();
    for tree in trees {
        let mut stack: Vec<&RangeTree> = vec![tree];
        while let Some(cur) = stack.pop() {
            events.insert(cur.start);
            events.insert(cur.end);
            stack.extend(cur.children.iter());
        }
    }
    let max_digits = events
        .iter()
        .map(|event| event.to_string().len())
        .max()
        .unwrap_or(1);
    let col_width = max_digits + 3;
    events
        .into_iter()
        .enumerate()
        .map(|(index, event)| (event, index * col_width))
        .collect()
}

/// Draw one tree as a list of layer lines, root layer first
fn emit_tree(tree: &RangeTree, col_map: &BTreeMap<u32, usize>) -> Vec<String> {
    let mut lines = Vec::new();
    // Breadth-first layers carrying absolute counts.
    let mut next_layer: Vec<(&RangeTree, i64)> = vec![(tree, 0)];
    while !next_layer.is_empty() {
        let mut layer: Vec<(u32, u32, i64)> = Vec::with_capacity(next_layer.len());
        let mut following: Vec<(&RangeTree, i64)> = Vec::new();
        for (node, parent_count) in next_layer {
            let count = parent_count + node.delta;
            layer.push((node.start, node.end, count));
            for child in &node.children {
                following.push((child, count));
            }
        }
        lines.push(emit_tree_layer(&layer, col_map));
        next_layer = following;
    }
    lines
}

/// Draw one layer of sorted disjoint ranges
fn emit_tree_layer(layer: &[(u32, u32, i64)], col_map: &BTreeMap<u32, usize>) -> String {
    let mut line = String::new();
    for &(start, end, count) in layer {
        let (Some(&start_idx), Some(&end_idx)) = (col_map.get(&start), col_map.get(&end)) else {
            continue;
        };
        if start_idx > line.len() {
            line.push_str(&" ".repeat(start_idx - line.len()));
        }
        line.push_str(&emit_range(count, end_idx - start_idx));
    }
    line
}

/// Draw a single `[count----)` cell of the given width
fn emit_range(count: i64, len: usize) -> String {
    let range_start = format!("[{count}");
    let hyphens_len = len.saturating_sub(range_start.len() + 1);
    format!("{range_start}{})", "-".repeat(hyphens_len))
}

/// Draw the offset header row
fn emit_offsets(col_map: &BTreeMap<u32, usize>) -> String {
    let mut line = String::new();
    for (&event, &col) in col_map {
        if line.len() < col {
            line.push_str(&" ".repeat(col - line.len()));
        }
        line.push_str(&event.to_string());
    }
    line
}

/// Parse an offset header row into a column-to-offset map
#[must_use]
pub fn parse_offsets(text: &str) -> BTreeMap<usize, u32> {
    let regex = Regex::new(r"\d+").unwrap();
    regex
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<u32>().ok().map(|offset| (m.start(), offset)))
        .collect()
}

/// Parse drawn range layers back into a pre-order sorted range list
///
/// `offset_map` is the result of [`parse_offsets`] on the header row.
/// A range whose brackets do not line up with a known column is an error.
pub fn parse_function_ranges(
    text: &str,
    offset_map: &BTreeMap<usize, u32>,
) -> FundirResult<Vec<RangeCov>> {
    let mut result: Vec<RangeCov> = Vec::new();
    for line in text.split('\n') {
        result.extend(parse_tree_layer(line, offset_map)?);
    }
    result.sort_by(compare_range_covs);
    Ok(result)
}

/// Parse one drawn layer line
fn parse_tree_layer(text: &str, offset_map: &BTreeMap<usize, u32>) -> FundirResult<Vec<RangeCov>> {
    let regex = Regex::new(r"\[(\d+)-*\)").unwrap();
    let mut result: Vec<RangeCov> = Vec::new();
    for captures in regex.captures_iter(text) {
        let (Some(whole), Some(digits)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let invalid = || FundirError::AsciiOffsets {
            text: text.to_string(),
        };
        let count: u64 = digits.as_str().parse().map_err(|_| invalid())?;
        let start_offset = *offset_map.get(&whole.start()).ok_or_else(invalid)?;
        let end_offset = *offset_map.get(&whole.end()).ok_or_else(invalid)?;
        result.push(RangeCov {
            start_offset,
            end_offset,
            count,
        });
    }
    Ok(result)
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
    fn test_emit_forest_draws_layers() {
        let tree = RangeTree::new(0, 10, 1, vec![RangeTree::new(3, 7, 2, vec![])]);
        let drawing = emit_forest(&[tree]);
        assert_eq!(
            drawing,
            "0    3    7    10\n[1------------)\n     [3--)"
        );
    }

    #[test]
    fn test_emit_forest_shares_header_across_trees() {
        let first = RangeTree::new(0, 5, 2, vec![]);
        let second = RangeTree::new(5, 9, 0, vec![]);
        let lines = emit_forest_lines(&[first, second]);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "0   5   9");
        assert_eq!(lines[1], "[2-)");
        assert_eq!(lines[2], "    [0-)");
    }

    #[test]
    fn test_parse_offsets_maps_columns() {
        let offsets = parse_offsets("0    3    7    10");
        let expected: BTreeMap<usize, u32> =
            [(0, 0), (5, 3), (10, 7), (15, 10)].into_iter().collect();
        assert_eq!(offsets, expected);
    }

    #[test]
    fn test_parse_function_ranges_reads_layers() {
        let offsets = parse_offsets("0    3    7    10");
        let ranges =
            parse_function_ranges("[1------------)\n     [3--)", &offsets).unwrap();
        assert_eq!(ranges, vec![range(0, 10, 1), range(3, 7, 3)]);
    }

    #[test]
    fn test_parse_function_ranges_rejects_unknown_columns() {
        let offsets = parse_offsets("0    3");
        let result = parse_function_ranges("  [1--)", &offsets);
        assert!(matches!(result, Err(FundirError::AsciiOffsets { .. })));
    }

    #[test]
    fn test_drawing_round_trips_through_parser() {
        let tree = RangeTree::new(
            0,
            40,
            2,
            vec![
                RangeTree::new(4, 12, 3, vec![RangeTree::new(6, 9, -5, vec![])]),
                RangeTree::new(20, 31, 0, vec![]),
            ],
        );
        let lines = emit_forest_lines(&[tree.clone()]);
        let offsets = parse_offsets(&lines[0]);
        let ranges = parse_function_ranges(&lines[1], &offsets).unwrap();
        assert_eq!(ranges, tree.to_ranges());
    }
}

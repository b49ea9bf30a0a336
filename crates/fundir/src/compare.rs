//! Ordering helpers for coverage values.
//!
//! Ranges sort pre-order: ascending `start_offset`, ties broken by
//! descending `end_offset`, so an enclosing range always precedes the
//! ranges nested inside it. Functions sort by their root range and scripts
//! sort alphabetically by URL.

use crate::types::{FunctionCov, RangeCov, ScriptCov};
use std::cmp::Ordering;

/// Compares two script coverages by `url` (alphabetical)
#[must_use]
pub fn compare_script_covs(a: &ScriptCov, b: &ScriptCov) -> Ordering {
    a.url.cmp(&b.url)
}

/// Compares two function coverages by their root ranges
///
/// A function without ranges sorts before any function with ranges; such
/// values are invalid but must not panic inside a sort.
#[must_use]
pub fn compare_function_covs(a: &FunctionCov, b: &FunctionCov) -> Ordering {
    match (a.ranges.first(), b.ranges.first()) {
        (Some(a), Some(b)) => compare_range_covs(a, b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compares two range coverages pre-order
///
/// Ascending `start_offset`, then descending `end_offset`. This corresponds
/// to a pre-order tree traversal.
#[must_use]
pub fn compare_range_covs(a: &RangeCov, b: &RangeCov) -> Ordering {
    a.start_offset
        .cmp(&b.start_offset)
        .then_with(|| b.end_offset.cmp(&a.end_offset))
}

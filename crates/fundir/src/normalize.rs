//! Normalization-only call paths.
//!
//! Used when a single coverage sample is handed over: the canonical
//! ordering and shape are still enforced, without the cost of a merge
//! sweep. All functions mutate in place.

use crate::compare::{compare_function_covs, compare_range_covs, compare_script_covs};
use crate::range_tree::RangeTree;
use crate::types::{FunctionCov, ProcessCov, ScriptCov};

/// Normalizes a process coverage
///
/// Sorts the scripts alphabetically by `url` and reassigns script ids
/// sequentially (`"0"`, `"1"`, …). Does not descend into the scripts.
pub fn normalize_process_cov(process_cov: &mut ProcessCov) {
    process_cov.result.sort_by(compare_script_covs);
    for (script_index, script_cov) in process_cov.result.iter_mut().enumerate() {
        script_cov.script_id = script_index.to_string();
    }
}

/// Normalizes a process coverage deeply
///
/// Normalizes the script coverages deeply, then the process coverage
/// itself.
pub fn deep_normalize_process_cov(process_cov: &mut ProcessCov) {
    for script_cov in &mut process_cov.result {
        deep_normalize_script_cov(script_cov);
    }
    normalize_process_cov(process_cov);
}

/// Normalizes a script coverage
///
/// Sorts the functions by root range (pre-order sort). Does not descend
/// into the function coverages.
pub fn normalize_script_cov(script_cov: &mut ScriptCov) {
    script_cov.functions.sort_by(compare_function_covs);
}

/// Normalizes a script coverage deeply
///
/// Normalizes the function coverages, then the script coverage itself.
pub fn deep_normalize_script_cov(script_cov: &mut ScriptCov) {
    for func_cov in &mut script_cov.functions {
        normalize_function_cov(func_cov);
    }
    normalize_script_cov(script_cov);
}

/// Normalizes a function coverage
///
/// Sorts the ranges pre-order, then rebuilds them through a normalized
/// range tree so the result is canonical and minimal.
pub fn normalize_function_cov(func_cov: &mut FunctionCov) {
    func_cov.ranges.sort_by(compare_range_covs);
    if let Some(mut tree) = RangeTree::from_sorted_ranges(&func_cov.ranges) {
        tree.normalize();
        func_cov.ranges = tree.to_ranges();
    }
}

//! V8 process coverage wire types.
//!
//! These mirror the JSON emitted by the V8 Profiler domain
//! (`Profiler.takePreciseCoverage`): a process coverage holds script
//! coverages, a script coverage holds function coverages, and a function
//! coverage is a pre-order sorted list of `[start, end)` hit-count ranges
//! whose first element spans the whole function.
//!
//! All types are plain owned data. Deep copies are `Clone`.

use crate::compare::compare_range_covs;
use crate::result::{FundirError, FundirResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A range of a script that was covered, with its hit count
///
/// The interval is half-open: `[start_offset, end_offset)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeCov {
    /// Start offset (inclusive)
    pub start_offset: u32,
    /// End offset (exclusive)
    pub end_offset: u32,
    /// Number of times this range was executed
    ///
    /// Widened to `u64` so that merging many samples cannot overflow.
    pub count: u64,
}

/// Coverage data for a single function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCov {
    /// Function name (may be empty for anonymous functions)
    pub function_name: String,
    /// Pre-order sorted ranges; `ranges[0]` spans the whole function
    pub ranges: Vec<RangeCov>,
    /// Whether the ranges carry block-level granularity
    ///
    /// `false` means the function only has a single whole-function count.
    pub is_block_coverage: bool,
}

impl FunctionCov {
    /// The root range, spanning the whole function body
    #[must_use]
    pub fn root_range(&self) -> Option<&RangeCov> {
        self.ranges.first()
    }

    /// Check the structural invariants the merge engine relies on
    ///
    /// Verifies that the range list is non-empty, strictly pre-order sorted
    /// and well nested (every range is either disjoint from or fully inside
    /// its predecessors). Use this to fail fast on untrusted input; the
    /// merge entry points themselves do not re-validate.
    pub fn validate(&self) -> FundirResult<()> {
        let root = self.ranges.first().ok_or_else(|| FundirError::MissingRootRange {
            function_name: self.function_name.clone(),
        })?;
        let mut open: Vec<(u32, u32)> = Vec::new();
        let mut prev: Option<&RangeCov> = None;
        for (index, range) in self.ranges.iter().enumerate() {
            if range.start_offset >= range.end_offset {
                return Err(FundirError::InvalidRange {
                    index,
                    start: range.start_offset,
                    end: range.end_offset,
                });
            }
            if let Some(prev) = prev {
                if compare_range_covs(prev, range) != Ordering::Less {
                    return Err(FundirError::UnsortedRanges {
                        index,
                        start: range.start_offset,
                        end: range.end_offset,
                        count: range.count,
                    });
                }
            }
            while let Some(&(_, end)) = open.last() {
                if end <= range.start_offset {
                    open.pop();
                } else {
                    break;
                }
            }
            match open.last() {
                Some(&(parent_start, parent_end)) => {
                    if range.end_offset > parent_end {
                        return Err(FundirError::RangeNotNested {
                            index,
                            start: range.start_offset,
                            end: range.end_offset,
                            parent_start,
                            parent_end,
                        });
                    }
                }
                None if index > 0 => {
                    // Escapes the root range entirely.
                    return Err(FundirError::RangeNotNested {
                        index,
                        start: range.start_offset,
                        end: range.end_offset,
                        parent_start: root.start_offset,
                        parent_end: root.end_offset,
                    });
                }
                None => {}
            }
            open.push((range.start_offset, range.end_offset));
            prev = Some(range);
        }
        Ok(())
    }
}

/// Coverage data for a single script (one source file)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptCov {
    /// Script ID from the profiler
    pub script_id: String,
    /// Script URL
    pub url: String,
    /// Functions in this script
    pub functions: Vec<FunctionCov>,
}

impl ScriptCov {
    /// Check the structural invariants of every function coverage
    pub fn validate(&self) -> FundirResult<()> {
        for function in &self.functions {
            function.validate()?;
        }
        Ok(())
    }
}

/// Complete coverage for one execution context
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcessCov {
    /// Coverage data per script
    pub result: Vec<ScriptCov>,
}

impl ProcessCov {
    /// Check the structural invariants of every script coverage
    pub fn validate(&self) -> FundirResult<()> {
        for script in &self.result {
            script.validate()?;
        }
        Ok(())
    }
}

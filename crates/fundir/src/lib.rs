//! Fundir: V8 Coverage Merging
//!
//! Fundir (Spanish: "to fuse/merge") combines code-coverage reports
//! produced by independent instrumented executions of the same program.
//! Multiple V8 process coverage samples are merged into a single
//! consistent report whose counts are the sum of all observed executions,
//! while preserving the strict nesting that range coverage requires.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    FUNDIR Architecture                           │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ProcessCov samples → group by URL → group by root range        │
//! │                                            ↓                     │
//! │          flat ranges ⇄ RangeTree → merge sweep → normalize      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use fundir::{merge_process_covs, FunctionCov, ProcessCov, RangeCov, ScriptCov};
//!
//! let sample = |count| ProcessCov {
//!     result: vec![ScriptCov {
//!         script_id: "0".to_string(),
//!         url: "/lib.js".to_string(),
//!         functions: vec![FunctionCov {
//!             function_name: "main".to_string(),
//!             ranges: vec![RangeCov { start_offset: 0, end_offset: 4, count }],
//!             is_block_coverage: true,
//!         }],
//!     }],
//! };
//!
//! let merged = merge_process_covs(vec![sample(1), sample(2)]);
//! assert_eq!(merged.result[0].functions[0].ranges[0].count, 3);
//! ```
//!
//! Merging consumes its inputs; callers that still need a sample afterwards
//! should pass a clone. The engine is purely synchronous and holds no state
//! between invocations, so independent merges may run on separate threads
//! without coordination.

#![warn(missing_docs)]

/// ASCII drawings of range forests (debug visualization)
pub mod ascii;
mod compare;
mod merge;
mod normalize;
mod range_tree;
mod result;
mod types;

pub use compare::{compare_function_covs, compare_range_covs, compare_script_covs};
pub use merge::{
    merge_function_covs, merge_process_covs, merge_range_trees, merge_script_covs,
};
pub use normalize::{
    deep_normalize_process_cov, deep_normalize_script_cov, normalize_function_cov,
    normalize_process_cov, normalize_script_cov,
};
pub use range_tree::RangeTree;
pub use result::{FundirError, FundirResult};
pub use types::{FunctionCov, ProcessCov, RangeCov, ScriptCov};

//! Result and error types for Fundir.

use thiserror::Error;

/// Result type for Fundir operations
pub type FundirResult<T> = Result<T, FundirError>;

/// Errors that can occur in Fundir
#[derive(Debug, Error)]
pub enum FundirError {
    /// Function coverage has no ranges at all
    #[error("function coverage {function_name:?} has no ranges")]
    MissingRootRange {
        /// Name of the offending function
        function_name: String,
    },

    /// Ranges are not pre-order sorted
    #[error("ranges are not pre-order sorted at index {index}: [{start}, {end}) count {count}")]
    UnsortedRanges {
        /// Index of the first out-of-order range
        index: usize,
        /// Start offset of the offending range
        start: u32,
        /// End offset of the offending range
        end: u32,
        /// Count of the offending range
        count: u64,
    },

    /// A range crosses a boundary instead of nesting inside it
    #[error("range [{start}, {end}) at index {index} is not nested inside [{parent_start}, {parent_end})")]
    RangeNotNested {
        /// Index of the offending range
        index: usize,
        /// Start offset of the offending range
        start: u32,
        /// End offset of the offending range
        end: u32,
        /// Start offset of the enclosing range
        parent_start: u32,
        /// End offset of the enclosing range
        parent_end: u32,
    },

    /// A range is empty or inverted
    #[error("range [{start}, {end}) at index {index} is empty or inverted")]
    InvalidRange {
        /// Index of the offending range
        index: usize,
        /// Start offset of the offending range
        start: u32,
        /// End offset of the offending range
        end: u32,
    },

    /// ASCII forest drawing refers to a column with no offset in the header
    #[error("invalid offsets for ascii layer: {text:?}")]
    AsciiOffsets {
        /// The layer line that failed to parse
        text: String,
    },
}

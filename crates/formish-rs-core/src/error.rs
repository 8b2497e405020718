//! Error types for dotted-key structure manipulation.
//!
//! These cover the structural failure modes of the dotted-key codec:
//! lookups that miss, assignments that would make a path simultaneously a
//! scalar and a container, and sequence indices that would leave gaps.

use thiserror::Error;

/// Errors raised while reading or writing nested data through dotted keys.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DottedError {
    /// A dotted lookup did not resolve. Recoverable by supplying a default.
    #[error("dotted key {key:?} does not exist")]
    KeyNotFound {
        /// The full dotted key that was requested.
        key: String,
    },

    /// A dotted key and its un-dotted prefix may not both resolve to a
    /// scalar; an assignment that would replace a container with a value
    /// (or descend through a value) is rejected.
    #[error("conflicting assignment at {key:?}: a value and nested children cannot share a path")]
    Conflict {
        /// The full dotted key whose assignment was rejected.
        key: String,
    },

    /// Sequence indices must be contiguous from zero. Assigning past the
    /// end of a sequence is an error rather than an implicit fill.
    #[error("index {index} in {key:?} leaves a gap; sequence indices must be contiguous from 0")]
    SparseIndex {
        /// The full dotted key whose assignment was rejected.
        key: String,
        /// The offending index segment.
        index: usize,
    },
}

/// A convenience type alias for `Result<T, DottedError>`.
pub type DottedResult<T> = Result<T, DottedError>;

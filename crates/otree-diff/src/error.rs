//! Error types for the diff crate.

use otree_types::TreeError;

/// Errors that can occur during diff and write-back operations.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DiffError {
    /// An accessor, distance function or transform failed. The error is
    /// tagged with the position where it surfaced.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// The distance function returned a negative or NaN value.
    #[error("invalid distance {distance} between {before} and {after}")]
    InvalidDistance {
        before: String,
        after: String,
        distance: f64,
    },

    /// A sibling aligner produced an alignment the engine cannot follow.
    #[error("invalid sibling alignment under {path}: {reason}")]
    Alignment { path: String, reason: String },
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;

//! Error types for the rewrite crate.

use otree_types::TreeError;

/// Errors that can occur while rewriting a tree.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RewriteError {
    /// A rule or the accessor failed. The error is tagged with its position.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// Every allowed pass still changed the tree.
    #[error("rewrite did not converge within {limit} passes")]
    PassLimit { limit: usize },

    /// Cancellation was requested between passes.
    #[error("rewrite cancelled after {passes} passes")]
    Cancelled { passes: usize },
}

/// Convenience alias for rewrite results.
pub type RewriteResult<T> = Result<T, RewriteError>;

use thiserror::Error;

use otree_diff::DiffError;
use otree_rewrite::RewriteError;
use otree_types::TreeError;

/// Errors surfaced by the [`Otree`](crate::Otree) engine.
#[derive(Debug, Error)]
pub enum SdkError {
    /// A located failure from child access, traversal or merge.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// The rewrite engine failed or was cancelled.
    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    /// Diff computation failed.
    #[error(transparent)]
    Diff(#[from] DiffError),

    /// The engine configuration could not be read or is invalid.
    #[error("config error: {0}")]
    Config(String),
}

impl SdkError {
    /// The located tree error behind this failure, if there is one.
    pub fn tree_error(&self) -> Option<&TreeError> {
        match self {
            SdkError::Tree(e)
            | SdkError::Rewrite(RewriteError::Tree(e))
            | SdkError::Diff(DiffError::Tree(e)) => Some(e),
            _ => None,
        }
    }
}

/// Result alias for engine operations.
pub type SdkResult<T> = Result<T, SdkError>;

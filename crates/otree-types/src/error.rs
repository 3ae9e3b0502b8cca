//! Error types shared by every otree engine.

use std::fmt;

use thiserror::Error;

use crate::path::Path;

/// Errors raised by child accessors, rules, transforms and distance
/// functions.
///
/// Collaborators construct the variant that matches the capability that
/// failed; the engines wrap it in [`TreeError::At`] with the position where
/// it surfaced.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// Enumerating a node's children failed.
    #[error("child enumeration failed: {0}")]
    Enumeration(String),

    /// Looking up children by key failed.
    #[error("child lookup failed: {0}")]
    Lookup(String),

    /// Rebuilding a node from transformed children failed.
    #[error("rebuild failed: {0}")]
    Rebuild(String),

    /// A rewrite rule raised an error.
    #[error("rewrite rule failed: {0}")]
    Rule(String),

    /// A modify or write-back transform raised an error.
    #[error("transform failed: {0}")]
    Transform(String),

    /// A distance function raised an error.
    #[error("distance function failed: {0}")]
    Distance(String),

    /// The accessor does not implement an optional capability.
    #[error("operation not supported by accessor: {0}")]
    Unsupported(&'static str),

    /// A cancellation-aware collaborator observed a cancellation request.
    #[error("operation cancelled")]
    Cancelled,

    /// An error tagged with the path reached when it surfaced.
    #[error("at {path}: {source}")]
    At {
        /// Rendered position, see [`Path::to_debug_string`].
        path: String,
        /// The underlying error.
        #[source]
        source: Box<TreeError>,
    },
}

impl TreeError {
    /// Tag this error with `path`. Errors that already carry a position keep
    /// the innermost one.
    pub fn at<I: fmt::Debug>(self, path: &Path<I>) -> Self {
        match self {
            located @ TreeError::At { .. } => located,
            other => TreeError::At {
                path: path.to_debug_string(),
                source: Box::new(other),
            },
        }
    }

    /// The rendered position attached by [`TreeError::at`], if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            TreeError::At { path, .. } => Some(path),
            _ => None,
        }
    }

    /// The error with any position tag stripped.
    pub fn root_cause(&self) -> &TreeError {
        match self {
            TreeError::At { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;

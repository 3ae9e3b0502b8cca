//! Traversal stream items.

use std::fmt;

use crate::error::{TreeError, TreeResult};
use crate::path::Path;

/// One item of a traversal: the position reached and the node found there,
/// or the error that stopped the walk below that position.
///
/// Errors occupy the value slot so a single stream carries both outcomes;
/// consumers check each entry before using it.
#[derive(Clone, Debug)]
pub struct Entry<K, N> {
    /// Where the node (or the failure) was found.
    pub path: Path<K>,
    /// The node, or the accessor error raised at `path`.
    pub value: TreeResult<N>,
}

impl<K, N> Entry<K, N> {
    /// A successful entry.
    pub fn found(path: Path<K>, node: N) -> Self {
        Self {
            path,
            value: Ok(node),
        }
    }

    /// A failed entry.
    pub fn failed(path: Path<K>, error: TreeError) -> Self {
        Self {
            path,
            value: Err(error),
        }
    }

    /// Returns `true` if the entry holds a node.
    pub fn is_ok(&self) -> bool {
        self.value.is_ok()
    }

    /// The node, if the entry succeeded.
    pub fn node(&self) -> Option<&N> {
        self.value.as_ref().ok()
    }

    /// The error, if the entry failed.
    pub fn error(&self) -> Option<&TreeError> {
        self.value.as_ref().err()
    }

    /// Split into path and node, tagging a failure with its path.
    pub fn into_result(self) -> TreeResult<(Path<K>, N)>
    where
        K: fmt::Debug,
    {
        match self.value {
            Ok(node) => Ok((self.path, node)),
            Err(err) => Err(err.at(&self.path)),
        }
    }
}

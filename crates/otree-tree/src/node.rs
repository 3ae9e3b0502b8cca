//! The generic tree node.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use otree_types::{ChildIter, TreeResult};

use crate::container::{
    ChainChildren, ChildContainer, LazyChildren, ListChildren, MapChildren, SharedChildren,
};

/// Bounds shared by tree keys and payloads: cheap to share between
/// snapshots and threads.
pub trait Element: Clone + Send + Sync + 'static {}

impl<X: Clone + Send + Sync + 'static> Element for X {}

/// A value plus a keyed child container.
///
/// Trees are immutable snapshots. The container is shared through an `Arc`,
/// so cloning a tree copies the payload and bumps one reference count.
pub struct Tree<K, T> {
    value: T,
    children: Option<SharedChildren<K, T>>,
}

impl<K: Element, T: Element> Tree<K, T> {
    /// A node without children.
    pub fn leaf(value: T) -> Self {
        Self {
            value,
            children: None,
        }
    }

    /// A node over explicit `(key, child)` entries.
    pub fn from_entries(value: T, entries: Vec<(K, Tree<K, T>)>) -> Self {
        if entries.is_empty() {
            return Self::leaf(value);
        }
        Self::with_container(value, ListChildren::new(entries))
    }

    /// A node over a single container.
    pub fn with_container<C>(value: T, container: C) -> Self
    where
        C: ChildContainer<K, T> + 'static,
    {
        Self {
            value,
            children: Some(Arc::new(container)),
        }
    }

    /// A node over any number of containers.
    ///
    /// No containers yield a leaf, one is used directly, several are chained
    /// into one virtual container that reads them in order.
    pub fn with_containers(value: T, mut containers: Vec<SharedChildren<K, T>>) -> Self {
        let children = match containers.len() {
            0 => None,
            1 => containers.pop(),
            _ => Some(Arc::new(ChainChildren::new(containers)) as SharedChildren<K, T>),
        };
        Self { value, children }
    }

    /// A node whose children are computed on every access.
    pub fn lazy<F>(value: T, compute: F) -> Self
    where
        F: Fn() -> TreeResult<Vec<(K, Tree<K, T>)>> + Send + Sync + 'static,
    {
        Self::with_container(value, LazyChildren::new(compute))
    }

    /// The node's own payload.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consume the node, keeping only its payload.
    pub fn into_value(self) -> T {
        self.value
    }

    /// The same children under a different payload.
    pub fn with_value(&self, value: T) -> Self {
        Self {
            value,
            children: self.children.clone(),
        }
    }

    /// The backing container, if the node has one.
    pub fn container(&self) -> Option<&SharedChildren<K, T>> {
        self.children.as_ref()
    }

    /// Returns `true` if the node has no container.
    ///
    /// A lazy container that computes no children is not a leaf by this
    /// definition.
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Enumerate the node's children.
    pub fn children(&self) -> ChildIter<'_, K, Tree<K, T>> {
        match &self.children {
            Some(container) => container.entries(),
            None => Box::new(std::iter::empty()),
        }
    }

    /// Number of nodes in this subtree, or the first enumeration error.
    pub fn size(&self) -> TreeResult<usize> {
        let mut total = 1;
        for item in self.children() {
            let (_, child) = item?;
            total += child.size()?;
        }
        Ok(total)
    }
}

impl<T: Element> Tree<usize, T> {
    /// A node whose children are keyed by position.
    pub fn node(value: T, children: Vec<Tree<usize, T>>) -> Self {
        if children.is_empty() {
            return Self::leaf(value);
        }
        Self::with_container(value, ListChildren::positional(children))
    }
}

impl<K: Element + Ord, T: Element> Tree<K, T> {
    /// A node over a map of uniquely keyed children.
    pub fn from_map(value: T, children: BTreeMap<K, Tree<K, T>>) -> Self {
        if children.is_empty() {
            return Self::leaf(value);
        }
        Self::with_container(value, MapChildren::new(children))
    }
}

impl<K, T: Clone> Clone for Tree<K, T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            children: self.children.clone(),
        }
    }
}

// Structural equality: payloads and enumerated children compare equal,
// regardless of which container kind backs either side. Enumeration errors
// make trees unequal.
impl<K: Element + PartialEq, T: Element + PartialEq> PartialEq for Tree<K, T> {
    fn eq(&self, other: &Self) -> bool {
        if self.value != other.value {
            return false;
        }
        let mut left = self.children();
        let mut right = other.children();
        loop {
            match (left.next(), right.next()) {
                (None, None) => return true,
                (Some(Ok((ka, a))), Some(Ok((kb, b)))) => {
                    if ka != kb || a != b {
                        return false;
                    }
                }
                _ => return false,
            }
        }
    }
}

impl<K: Element + fmt::Debug, T: Element + fmt::Debug> fmt::Debug for Tree<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.children.is_none() {
            return f.debug_tuple("Leaf").field(&self.value).finish();
        }
        let children: Vec<TreeResult<(K, Tree<K, T>)>> = self.children().collect();
        f.debug_struct("Tree")
            .field("value", &self.value)
            .field("children", &children)
            .finish()
    }
}

//! The child-access capability every otree algorithm is written against.
//!
//! No engine touches node internals directly. Traversal, rewriting, diffing
//! and merging only enumerate, look up and rebuild children through a
//! [`ChildAccessor`], so the same algorithms run over any tree shape: a
//! generic container tree, a hand-written AST enum, or a lazily computed
//! structure.

use std::fmt;

use crate::error::{TreeError, TreeResult};

/// A fallible stream of `(key, child)` pairs.
pub type ChildIter<'a, K, N> = Box<dyn Iterator<Item = TreeResult<(K, N)>> + 'a>;

/// Child access for trees whose nodes have type `N`.
///
/// Implementations must satisfy these invariants:
/// - Enumeration order is stable for an unchanged node.
/// - Several children may share a key; [`lookup`](ChildAccessor::lookup)
///   returns all of them in enumeration order.
/// - [`rebuild`](ChildAccessor::rebuild) keeps the node's own payload and
///   replaces each child by the transformed one, in place.
/// - Nodes are never mutated; every rebuild returns a new value.
pub trait ChildAccessor<N> {
    /// Position key selecting a child within its parent.
    type Key: Clone + fmt::Debug;

    /// Enumerate the children of `node`.
    ///
    /// An `Err` item means enumeration failed at that point; engines stop
    /// consuming the stream after the first error.
    fn children<'a>(&'a self, node: &'a N) -> ChildIter<'a, Self::Key, N>;

    /// All children of `node` stored under `key`.
    ///
    /// The default filters [`children`](ChildAccessor::children) with
    /// [`key_eq`](ChildAccessor::key_eq). Containers with an index should
    /// override it so path resolution does not enumerate siblings.
    fn lookup<'a>(&'a self, node: &'a N, key: &'a Self::Key) -> ChildIter<'a, Self::Key, N> {
        Box::new(self.children(node).filter(move |item| match item {
            Ok((k, _)) => self.key_eq(k, key),
            Err(_) => true,
        }))
    }

    /// Rebuild `node` with `f` applied to every child.
    fn rebuild(
        &self,
        node: &N,
        f: &mut dyn FnMut(&Self::Key, N) -> TreeResult<N>,
    ) -> TreeResult<N>;

    /// Key equality. Keys need not implement `PartialEq`.
    fn key_eq(&self, a: &Self::Key, b: &Self::Key) -> bool;

    /// Rebuild `node`'s payload over a replacement child list.
    ///
    /// Needed by operations that change the set of children (merge, diff
    /// write-back). Accessors that cannot construct nodes keep the default,
    /// which reports [`TreeError::Unsupported`].
    fn with_children(&self, node: &N, children: Vec<(Self::Key, N)>) -> TreeResult<N> {
        let _ = (node, children);
        Err(TreeError::Unsupported("with_children"))
    }
}

impl<N, A: ChildAccessor<N> + ?Sized> ChildAccessor<N> for &A {
    type Key = A::Key;

    fn children<'a>(&'a self, node: &'a N) -> ChildIter<'a, Self::Key, N> {
        (**self).children(node)
    }

    fn lookup<'a>(&'a self, node: &'a N, key: &'a Self::Key) -> ChildIter<'a, Self::Key, N> {
        (**self).lookup(node, key)
    }

    fn rebuild(
        &self,
        node: &N,
        f: &mut dyn FnMut(&Self::Key, N) -> TreeResult<N>,
    ) -> TreeResult<N> {
        (**self).rebuild(node, f)
    }

    fn key_eq(&self, a: &Self::Key, b: &Self::Key) -> bool {
        (**self).key_eq(a, b)
    }

    fn with_children(&self, node: &N, children: Vec<(Self::Key, N)>) -> TreeResult<N> {
        (**self).with_children(node, children)
    }
}

/// Pluggable key equality.
pub trait KeyEquality<K> {
    /// Returns `true` when `a` and `b` select the same child position.
    fn key_eq(&self, a: &K, b: &K) -> bool;

    /// Returns `true` when [`key_eq`](KeyEquality::key_eq) is plain `==`.
    ///
    /// Indexed containers only use their index for structural equalities and
    /// otherwise scan their children with `key_eq`.
    fn is_structural(&self) -> bool {
        false
    }
}

/// Key equality through `PartialEq`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StructuralEq;

impl<K: PartialEq> KeyEquality<K> for StructuralEq {
    fn key_eq(&self, a: &K, b: &K) -> bool {
        a == b
    }

    fn is_structural(&self) -> bool {
        true
    }
}

/// Key equality from a closure.
#[derive(Clone, Copy)]
pub struct KeyFn<F>(pub F);

impl<K, F: Fn(&K, &K) -> bool> KeyEquality<K> for KeyFn<F> {
    fn key_eq(&self, a: &K, b: &K) -> bool {
        (self.0)(a, b)
    }
}

impl<F> fmt::Debug for KeyFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyFn(..)")
    }
}

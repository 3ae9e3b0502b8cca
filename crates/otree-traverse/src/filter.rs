//! Acceptance predicates for walks.
//!
//! A predicate that rejects a node prunes it: neither the node nor anything
//! below it is visited. [`AcceptAll`] is the plain walk, [`ByNode`] looks
//! at the node only and [`ByPath`] also sees the position.

use otree_types::Path;

/// Decides whether a walk visits a node (and, transitively, its subtree).
pub trait Accept<K, N> {
    /// Returns `true` to visit `node` at `path`.
    fn accept(&mut self, path: &Path<K>, node: &N) -> bool;
}

/// Visits every node.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAll;

impl<K, N> Accept<K, N> for AcceptAll {
    fn accept(&mut self, _path: &Path<K>, _node: &N) -> bool {
        true
    }
}

/// A predicate over the node alone.
#[derive(Clone, Copy, Debug)]
pub struct ByNode<P>(pub P);

impl<K, N, P> Accept<K, N> for ByNode<P>
where
    P: FnMut(&N) -> bool,
{
    fn accept(&mut self, _path: &Path<K>, node: &N) -> bool {
        (self.0)(node)
    }
}

/// A predicate over the position and the node.
#[derive(Clone, Copy, Debug)]
pub struct ByPath<P>(pub P);

impl<K, N, P> Accept<K, N> for ByPath<P>
where
    P: FnMut(&Path<K>, &N) -> bool,
{
    fn accept(&mut self, path: &Path<K>, node: &N) -> bool {
        (self.0)(path, node)
    }
}

impl<K, N, A: Accept<K, N> + ?Sized> Accept<K, N> for &mut A {
    fn accept(&mut self, path: &Path<K>, node: &N) -> bool {
        (**self).accept(path, node)
    }
}

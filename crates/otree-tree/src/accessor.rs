//! [`ChildAccessor`] implementation for [`Tree`].

use std::fmt;

use otree_types::{ChildAccessor, ChildIter, KeyEquality, StructuralEq, TreeResult};

use crate::node::{Element, Tree};

/// Accesses the children of [`Tree`] nodes, comparing keys with `E`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TreeAccessor<E = StructuralEq> {
    eq: E,
}

impl TreeAccessor<StructuralEq> {
    /// An accessor comparing keys with `PartialEq`.
    pub fn new() -> Self {
        Self { eq: StructuralEq }
    }
}

impl<E> TreeAccessor<E> {
    /// An accessor comparing keys with `eq`.
    pub fn with_key_eq(eq: E) -> Self {
        Self { eq }
    }
}

impl<K, T, E> ChildAccessor<Tree<K, T>> for TreeAccessor<E>
where
    K: Element + fmt::Debug,
    T: Element,
    E: KeyEquality<K>,
{
    type Key = K;

    fn children<'a>(&'a self, node: &'a Tree<K, T>) -> ChildIter<'a, K, Tree<K, T>> {
        node.children()
    }

    fn lookup<'a>(&'a self, node: &'a Tree<K, T>, key: &'a K) -> ChildIter<'a, K, Tree<K, T>> {
        match node.container() {
            Some(container) => container.lookup(key, &self.eq),
            None => Box::new(std::iter::empty()),
        }
    }

    fn rebuild(
        &self,
        node: &Tree<K, T>,
        f: &mut dyn FnMut(&K, Tree<K, T>) -> TreeResult<Tree<K, T>>,
    ) -> TreeResult<Tree<K, T>> {
        match node.container() {
            Some(container) => {
                let children = container.rebuild(f)?;
                Ok(Tree::with_containers(node.value().clone(), vec![children]))
            }
            None => Ok(node.clone()),
        }
    }

    fn key_eq(&self, a: &K, b: &K) -> bool {
        self.eq.key_eq(a, b)
    }

    fn with_children(
        &self,
        node: &Tree<K, T>,
        children: Vec<(K, Tree<K, T>)>,
    ) -> TreeResult<Tree<K, T>> {
        Ok(Tree::from_entries(node.value().clone(), children))
    }
}

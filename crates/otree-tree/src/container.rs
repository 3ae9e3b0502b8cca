//! Child containers backing [`Tree`] nodes.
//!
//! A container owns (or computes) the keyed children of one node. Four kinds
//! ship with the crate:
//!
//! - [`ListChildren`] -- ordered `(key, child)` entries; duplicate keys allowed
//! - [`MapChildren`] -- a `BTreeMap` with indexed lookup
//! - [`LazyChildren`] -- children computed on every access
//! - [`ChainChildren`] -- several containers read as one, in order

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use otree_types::{ChildIter, KeyEquality, TreeResult};

use crate::node::{Element, Tree};

/// Shared handle to a child container.
pub type SharedChildren<K, T> = Arc<dyn ChildContainer<K, T>>;

/// The keyed children of one node.
pub trait ChildContainer<K, T>: Send + Sync {
    /// Enumerate children in order.
    fn entries(&self) -> ChildIter<'_, K, Tree<K, T>>;

    /// Children stored under `key`. The default filters
    /// [`entries`](ChildContainer::entries).
    fn lookup<'a>(
        &'a self,
        key: &'a K,
        eq: &'a dyn KeyEquality<K>,
    ) -> ChildIter<'a, K, Tree<K, T>>
    where
        K: 'a,
        T: 'a,
    {
        Box::new(self.entries().filter(move |item| match item {
            Ok((k, _)) => eq.key_eq(k, key),
            Err(_) => true,
        }))
    }

    /// A new container with `f` applied to every child.
    fn rebuild(
        &self,
        f: &mut dyn FnMut(&K, Tree<K, T>) -> TreeResult<Tree<K, T>>,
    ) -> TreeResult<SharedChildren<K, T>>;

    /// Short name of the container kind, used in `Debug` output.
    fn kind(&self) -> &'static str;
}

/// Ordered, list-backed children.
pub struct ListChildren<K, T> {
    entries: Vec<(K, Tree<K, T>)>,
}

impl<K, T> ListChildren<K, T> {
    /// Wrap explicit `(key, child)` entries.
    pub fn new(entries: Vec<(K, Tree<K, T>)>) -> Self {
        Self { entries }
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no children.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> ListChildren<usize, T> {
    /// Children keyed by their position.
    pub fn positional(children: Vec<Tree<usize, T>>) -> Self {
        Self::new(children.into_iter().enumerate().collect())
    }
}

impl<K: Element, T: Element> ChildContainer<K, T> for ListChildren<K, T> {
    fn entries(&self) -> ChildIter<'_, K, Tree<K, T>> {
        Box::new(self.entries.iter().cloned().map(Ok))
    }

    fn rebuild(
        &self,
        f: &mut dyn FnMut(&K, Tree<K, T>) -> TreeResult<Tree<K, T>>,
    ) -> TreeResult<SharedChildren<K, T>> {
        let entries = self
            .entries
            .iter()
            .map(|(k, child)| Ok((k.clone(), f(k, child.clone())?)))
            .collect::<TreeResult<Vec<_>>>()?;
        Ok(Arc::new(ListChildren::new(entries)))
    }

    fn kind(&self) -> &'static str {
        "list"
    }
}

/// Map-backed children with one child per key.
///
/// Lookup goes through the map index when the key equality is structural
/// (`Ord` must then agree with `PartialEq`). Any other equality scans the
/// entries in key order.
pub struct MapChildren<K, T> {
    map: BTreeMap<K, Tree<K, T>>,
}

impl<K: Ord, T> MapChildren<K, T> {
    /// Wrap a map of children.
    pub fn new(map: BTreeMap<K, Tree<K, T>>) -> Self {
        Self { map }
    }
}

impl<K: Element + Ord, T: Element> ChildContainer<K, T> for MapChildren<K, T> {
    fn entries(&self) -> ChildIter<'_, K, Tree<K, T>> {
        Box::new(self.map.iter().map(|(k, v)| Ok((k.clone(), v.clone()))))
    }

    fn lookup<'a>(
        &'a self,
        key: &'a K,
        eq: &'a dyn KeyEquality<K>,
    ) -> ChildIter<'a, K, Tree<K, T>>
    where
        K: 'a,
        T: 'a,
    {
        if !eq.is_structural() {
            return Box::new(
                self.map
                    .iter()
                    .filter(move |(k, _)| eq.key_eq(k, key))
                    .map(|(k, v)| Ok((k.clone(), v.clone()))),
            );
        }
        Box::new(
            self.map
                .get_key_value(key)
                .map(|(k, v)| Ok((k.clone(), v.clone())))
                .into_iter(),
        )
    }

    fn rebuild(
        &self,
        f: &mut dyn FnMut(&K, Tree<K, T>) -> TreeResult<Tree<K, T>>,
    ) -> TreeResult<SharedChildren<K, T>> {
        let mut map = BTreeMap::new();
        for (k, child) in &self.map {
            map.insert(k.clone(), f(k, child.clone())?);
        }
        Ok(Arc::new(MapChildren::new(map)))
    }

    fn kind(&self) -> &'static str {
        "map"
    }
}

type ComputeFn<K, T> = dyn Fn() -> TreeResult<Vec<(K, Tree<K, T>)>> + Send + Sync;

/// Children computed on demand.
///
/// The closure runs on every enumeration. Rebuilding materialises the
/// computed children into a [`ListChildren`].
pub struct LazyChildren<K, T> {
    compute: Arc<ComputeFn<K, T>>,
}

impl<K, T> LazyChildren<K, T> {
    /// Children produced by `compute`.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> TreeResult<Vec<(K, Tree<K, T>)>> + Send + Sync + 'static,
    {
        Self {
            compute: Arc::new(compute),
        }
    }
}

impl<K: Element, T: Element> ChildContainer<K, T> for LazyChildren<K, T> {
    fn entries(&self) -> ChildIter<'_, K, Tree<K, T>> {
        match (self.compute)() {
            Ok(entries) => Box::new(entries.into_iter().map(Ok)),
            Err(err) => Box::new(std::iter::once(Err(err))),
        }
    }

    fn rebuild(
        &self,
        f: &mut dyn FnMut(&K, Tree<K, T>) -> TreeResult<Tree<K, T>>,
    ) -> TreeResult<SharedChildren<K, T>> {
        let entries = (self.compute)()?
            .into_iter()
            .map(|(k, child)| {
                let child = f(&k, child)?;
                Ok((k, child))
            })
            .collect::<TreeResult<Vec<_>>>()?;
        Ok(Arc::new(ListChildren::new(entries)))
    }

    fn kind(&self) -> &'static str {
        "lazy"
    }
}

/// Several containers iterated and searched as one.
pub struct ChainChildren<K, T> {
    parts: Vec<SharedChildren<K, T>>,
}

impl<K, T> ChainChildren<K, T> {
    /// Chain `parts` in order.
    pub fn new(parts: Vec<SharedChildren<K, T>>) -> Self {
        Self { parts }
    }
}

impl<K: Element, T: Element> ChildContainer<K, T> for ChainChildren<K, T> {
    fn entries(&self) -> ChildIter<'_, K, Tree<K, T>> {
        Box::new(self.parts.iter().flat_map(|part| part.entries()))
    }

    fn lookup<'a>(
        &'a self,
        key: &'a K,
        eq: &'a dyn KeyEquality<K>,
    ) -> ChildIter<'a, K, Tree<K, T>>
    where
        K: 'a,
        T: 'a,
    {
        Box::new(self.parts.iter().flat_map(move |part| part.lookup(key, eq)))
    }

    fn rebuild(
        &self,
        f: &mut dyn FnMut(&K, Tree<K, T>) -> TreeResult<Tree<K, T>>,
    ) -> TreeResult<SharedChildren<K, T>> {
        let parts = self
            .parts
            .iter()
            .map(|part| part.rebuild(&mut *f))
            .collect::<TreeResult<Vec<_>>>()?;
        Ok(Arc::new(ChainChildren::new(parts)))
    }

    fn kind(&self) -> &'static str {
        "chain"
    }
}

impl<K, T> fmt::Debug for dyn ChildContainer<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChildContainer({})", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otree_types::{KeyFn, StructuralEq, TreeError};

    fn keys<K: Element, T: Element>(container: &dyn ChildContainer<K, T>) -> Vec<K> {
        container.entries().map(|e| e.unwrap().0).collect()
    }

    #[test]
    fn positional_list_keys_are_indices() {
        let list = ListChildren::positional(vec![Tree::leaf('a'), Tree::leaf('b')]);
        assert_eq!(keys(&list), vec![0, 1]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn list_lookup_returns_all_duplicates() {
        let list = ListChildren::new(vec![
            ("x", Tree::leaf(1)),
            ("y", Tree::leaf(2)),
            ("x", Tree::leaf(3)),
        ]);
        let found: Vec<i32> = list
            .lookup(&"x", &StructuralEq)
            .map(|e| *e.unwrap().1.value())
            .collect();
        assert_eq!(found, vec![1, 3]);
    }

    #[test]
    fn map_lookup_uses_index() {
        let mut map = BTreeMap::new();
        map.insert("b", Tree::leaf(2));
        map.insert("a", Tree::leaf(1));
        let children = MapChildren::new(map);
        assert_eq!(keys(&children), vec!["a", "b"]);
        let found: Vec<_> = children.lookup(&"b", &StructuralEq).collect();
        assert_eq!(found.len(), 1);
        assert!(children.lookup(&"zz", &StructuralEq).next().is_none());
    }

    #[test]
    fn map_lookup_honours_custom_equality() {
        let mut map = BTreeMap::new();
        map.insert("a", Tree::leaf(1));
        map.insert("B", Tree::leaf(2));
        let children = MapChildren::new(map);
        let ci = KeyFn(|a: &&str, b: &&str| a.eq_ignore_ascii_case(b));
        let found: Vec<(&str, i32)> = children
            .lookup(&"A", &ci)
            .map(|e| {
                let (k, c) = e.unwrap();
                (k, *c.value())
            })
            .collect();
        assert_eq!(found, vec![("a", 1)]);
        assert_eq!(children.lookup(&"b", &ci).count(), 1);
        assert!(children.lookup(&"A", &StructuralEq).next().is_none());
    }

    #[test]
    fn lazy_children_surface_errors() {
        let lazy: LazyChildren<usize, i32> =
            LazyChildren::new(|| Err(TreeError::Enumeration("offline".into())));
        let items: Vec<_> = lazy.entries().collect();
        assert_eq!(items, vec![Err(TreeError::Enumeration("offline".into()))]);
        assert!(lazy.rebuild(&mut |_, c| Ok(c)).is_err());
    }

    #[test]
    fn lazy_rebuild_keeps_the_compute_error() {
        let lazy: LazyChildren<usize, i32> =
            LazyChildren::new(|| Err(TreeError::Cancelled));
        let err = lazy.rebuild(&mut |_, c| Ok(c)).unwrap_err();
        assert_eq!(err, TreeError::Cancelled);
        assert_eq!(err.root_cause(), &TreeError::Cancelled);
        let listed: Vec<_> = lazy.entries().collect();
        assert_eq!(listed, vec![Err(err)]);
    }

    #[test]
    fn lazy_rebuild_materialises_list() {
        let lazy = LazyChildren::new(|| Ok(vec![(0usize, Tree::leaf(10))]));
        let rebuilt = lazy
            .rebuild(&mut |_, c| Ok(Tree::leaf(c.value() + 1)))
            .unwrap();
        assert_eq!(rebuilt.kind(), "list");
        let values: Vec<i32> = rebuilt.entries().map(|e| *e.unwrap().1.value()).collect();
        assert_eq!(values, vec![11]);
    }

    #[test]
    fn chain_reads_parts_in_order() {
        let first: SharedChildren<usize, i32> =
            Arc::new(ListChildren::new(vec![(0, Tree::leaf(1))]));
        let second: SharedChildren<usize, i32> =
            Arc::new(ListChildren::new(vec![(0, Tree::leaf(2)), (1, Tree::leaf(3))]));
        let chain = ChainChildren::new(vec![first, second]);
        assert_eq!(keys(&chain), vec![0, 0, 1]);
        let zeros: Vec<i32> = chain
            .lookup(&0, &StructuralEq)
            .map(|e| *e.unwrap().1.value())
            .collect();
        assert_eq!(zeros, vec![1, 2]);
    }
}

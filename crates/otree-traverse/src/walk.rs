//! Lazy tree walks: pre-order, post-order, level-order and match-and-stop.
//!
//! Every walk is an [`Iterator`] of [`Entry`] values driven by an explicit
//! stack (or queue), so stopping early is just dropping the iterator: no
//! child is enumerated before the walk actually needs it.
//!
//! # Failure semantics
//!
//! When enumerating a node's children fails, the walk yields one failed
//! entry tagged with that node's path and visits none of its children.
//! Branches scheduled before the failure are unaffected.

use std::collections::VecDeque;

use tracing::trace;

use otree_types::{ChildAccessor, Entry, Path, TreeError};

use crate::filter::{Accept, AcceptAll, ByNode, ByPath};

enum Frame<K, N> {
    /// Test the node against the predicate.
    Visit(Path<K>, N),
    /// Enumerate the children of an already-yielded node.
    Expand(Path<K>, N),
    /// Yield the node (post-order, after its children).
    Emit(Path<K>, N),
    /// Yield a failure.
    Fail(Path<K>, TreeError),
}

/// Enumerate the children of `node`, extending `path` per child.
fn expand<A, N>(
    accessor: &A,
    path: &Path<A::Key>,
    node: &N,
) -> Result<Vec<(Path<A::Key>, N)>, TreeError>
where
    A: ChildAccessor<N>,
{
    let mut children = Vec::new();
    for item in accessor.children(node) {
        let (key, child) = item?;
        children.push((path.append(key), child));
    }
    Ok(children)
}

fn pruned<K: std::fmt::Debug>(path: &Path<K>) {
    trace!(path = %path.to_debug_string(), "pruned subtree");
}

fn enumeration_failed<K: std::fmt::Debug>(path: &Path<K>, err: &TreeError) {
    trace!(path = %path.to_debug_string(), error = %err, "child enumeration failed");
}

// ---------------------------------------------------------------
// Pre-order
// ---------------------------------------------------------------

/// Pre-order walk: a node is yielded before its children.
pub struct TopDown<'a, A: ChildAccessor<N>, N, F> {
    accessor: &'a A,
    stack: Vec<Frame<A::Key, N>>,
    accept: F,
}

impl<'a, A: ChildAccessor<N>, N, F> TopDown<'a, A, N, F> {
    /// Walk `root` with an explicit predicate.
    pub fn new(accessor: &'a A, root: N, accept: F) -> Self {
        Self {
            accessor,
            stack: vec![Frame::Visit(Path::root(), root)],
            accept,
        }
    }
}

impl<A, N, F> Iterator for TopDown<'_, A, N, F>
where
    A: ChildAccessor<N>,
    N: Clone,
    F: Accept<A::Key, N>,
{
    type Item = Entry<A::Key, N>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Visit(path, node) => {
                    if !self.accept.accept(&path, &node) {
                        pruned(&path);
                        continue;
                    }
                    self.stack.push(Frame::Expand(path.clone(), node.clone()));
                    return Some(Entry::found(path, node));
                }
                Frame::Expand(path, node) => match expand(self.accessor, &path, &node) {
                    Ok(children) => self.stack.extend(
                        children
                            .into_iter()
                            .rev()
                            .map(|(path, child)| Frame::Visit(path, child)),
                    ),
                    Err(err) => {
                        enumeration_failed(&path, &err);
                        return Some(Entry::failed(path, err));
                    }
                },
                Frame::Emit(path, node) => return Some(Entry::found(path, node)),
                Frame::Fail(path, err) => return Some(Entry::failed(path, err)),
            }
        }
        None
    }
}

/// Pre-order walk over every node.
pub fn top_down<A, N>(accessor: &A, root: N) -> TopDown<'_, A, N, AcceptAll>
where
    A: ChildAccessor<N>,
{
    TopDown::new(accessor, root, AcceptAll)
}

/// Pre-order walk pruning nodes rejected by `pred`.
pub fn top_down_filtered<A, N, P>(accessor: &A, root: N, pred: P) -> TopDown<'_, A, N, ByNode<P>>
where
    A: ChildAccessor<N>,
    P: FnMut(&N) -> bool,
{
    TopDown::new(accessor, root, ByNode(pred))
}

/// Pre-order walk pruning positions rejected by `pred`.
pub fn top_down_indexed<A, N, P>(accessor: &A, root: N, pred: P) -> TopDown<'_, A, N, ByPath<P>>
where
    A: ChildAccessor<N>,
    P: FnMut(&Path<A::Key>, &N) -> bool,
{
    TopDown::new(accessor, root, ByPath(pred))
}

// ---------------------------------------------------------------
// Post-order
// ---------------------------------------------------------------

/// Post-order walk: a node is yielded after all of its children.
///
/// A node whose children cannot be enumerated is replaced by the failure.
pub struct BottomUp<'a, A: ChildAccessor<N>, N, F> {
    accessor: &'a A,
    stack: Vec<Frame<A::Key, N>>,
    accept: F,
}

impl<'a, A: ChildAccessor<N>, N, F> BottomUp<'a, A, N, F> {
    /// Walk `root` with an explicit predicate.
    pub fn new(accessor: &'a A, root: N, accept: F) -> Self {
        Self {
            accessor,
            stack: vec![Frame::Visit(Path::root(), root)],
            accept,
        }
    }
}

impl<A, N, F> Iterator for BottomUp<'_, A, N, F>
where
    A: ChildAccessor<N>,
    F: Accept<A::Key, N>,
{
    type Item = Entry<A::Key, N>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Visit(path, node) => {
                    if !self.accept.accept(&path, &node) {
                        pruned(&path);
                        continue;
                    }
                    match expand(self.accessor, &path, &node) {
                        Ok(children) => {
                            self.stack.push(Frame::Emit(path, node));
                            self.stack.extend(
                                children
                                    .into_iter()
                                    .rev()
                                    .map(|(path, child)| Frame::Visit(path, child)),
                            );
                        }
                        Err(err) => {
                            enumeration_failed(&path, &err);
                            self.stack.push(Frame::Fail(path, err));
                        }
                    }
                }
                Frame::Expand(path, node) | Frame::Emit(path, node) => {
                    return Some(Entry::found(path, node))
                }
                Frame::Fail(path, err) => return Some(Entry::failed(path, err)),
            }
        }
        None
    }
}

/// Post-order walk over every node.
pub fn bottom_up<A, N>(accessor: &A, root: N) -> BottomUp<'_, A, N, AcceptAll>
where
    A: ChildAccessor<N>,
{
    BottomUp::new(accessor, root, AcceptAll)
}

/// Post-order walk pruning nodes rejected by `pred`.
pub fn bottom_up_filtered<A, N, P>(accessor: &A, root: N, pred: P) -> BottomUp<'_, A, N, ByNode<P>>
where
    A: ChildAccessor<N>,
    P: FnMut(&N) -> bool,
{
    BottomUp::new(accessor, root, ByNode(pred))
}

/// Post-order walk pruning positions rejected by `pred`.
pub fn bottom_up_indexed<A, N, P>(accessor: &A, root: N, pred: P) -> BottomUp<'_, A, N, ByPath<P>>
where
    A: ChildAccessor<N>,
    P: FnMut(&Path<A::Key>, &N) -> bool,
{
    BottomUp::new(accessor, root, ByPath(pred))
}

// ---------------------------------------------------------------
// Level-order
// ---------------------------------------------------------------

/// Level-order (FIFO) walk. A rejected node enqueues no children.
///
/// Read-only: there is no level-order counterpart of the modify operations.
pub struct BreadthFirst<'a, A: ChildAccessor<N>, N, F> {
    accessor: &'a A,
    queue: VecDeque<Frame<A::Key, N>>,
    accept: F,
}

impl<'a, A: ChildAccessor<N>, N, F> BreadthFirst<'a, A, N, F> {
    /// Walk `root` with an explicit predicate.
    pub fn new(accessor: &'a A, root: N, accept: F) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back(Frame::Visit(Path::root(), root));
        Self {
            accessor,
            queue,
            accept,
        }
    }
}

impl<A, N, F> Iterator for BreadthFirst<'_, A, N, F>
where
    A: ChildAccessor<N>,
    N: Clone,
    F: Accept<A::Key, N>,
{
    type Item = Entry<A::Key, N>;

    fn next(&mut self) -> Option<Self::Item> {
        // Expand frames queue behind the node's siblings, which keeps the
        // children of level d after every node of level d.
        while let Some(frame) = self.queue.pop_front() {
            match frame {
                Frame::Visit(path, node) => {
                    if !self.accept.accept(&path, &node) {
                        pruned(&path);
                        continue;
                    }
                    self.queue
                        .push_back(Frame::Expand(path.clone(), node.clone()));
                    return Some(Entry::found(path, node));
                }
                Frame::Expand(path, node) => match expand(self.accessor, &path, &node) {
                    Ok(children) => self.queue.extend(
                        children
                            .into_iter()
                            .map(|(path, child)| Frame::Visit(path, child)),
                    ),
                    Err(err) => {
                        enumeration_failed(&path, &err);
                        return Some(Entry::failed(path, err));
                    }
                },
                Frame::Emit(path, node) => return Some(Entry::found(path, node)),
                Frame::Fail(path, err) => return Some(Entry::failed(path, err)),
            }
        }
        None
    }
}

/// Level-order walk over every node.
pub fn breadth_first<A, N>(accessor: &A, root: N) -> BreadthFirst<'_, A, N, AcceptAll>
where
    A: ChildAccessor<N>,
{
    BreadthFirst::new(accessor, root, AcceptAll)
}

/// Level-order walk pruning nodes rejected by `pred`.
pub fn breadth_first_filtered<A, N, P>(
    accessor: &A,
    root: N,
    pred: P,
) -> BreadthFirst<'_, A, N, ByNode<P>>
where
    A: ChildAccessor<N>,
    P: FnMut(&N) -> bool,
{
    BreadthFirst::new(accessor, root, ByNode(pred))
}

/// Level-order walk pruning positions rejected by `pred`.
pub fn breadth_first_indexed<A, N, P>(
    accessor: &A,
    root: N,
    pred: P,
) -> BreadthFirst<'_, A, N, ByPath<P>>
where
    A: ChildAccessor<N>,
    P: FnMut(&Path<A::Key>, &N) -> bool,
{
    BreadthFirst::new(accessor, root, ByPath(pred))
}

// ---------------------------------------------------------------
// Match-and-stop
// ---------------------------------------------------------------

/// Pre-order search yielding the first match on every branch.
///
/// The opposite of pruning: a matched node is yielded and not descended, an
/// unmatched node is not yielded but its children are searched. No two
/// yielded nodes are in an ancestor/descendant relation.
pub struct MatchStop<'a, A: ChildAccessor<N>, N, F> {
    accessor: &'a A,
    stack: Vec<Frame<A::Key, N>>,
    matches: F,
}

impl<'a, A: ChildAccessor<N>, N, F> MatchStop<'a, A, N, F> {
    /// Search `root` with an explicit match predicate.
    pub fn new(accessor: &'a A, root: N, matches: F) -> Self {
        Self {
            accessor,
            stack: vec![Frame::Visit(Path::root(), root)],
            matches,
        }
    }
}

impl<A, N, F> Iterator for MatchStop<'_, A, N, F>
where
    A: ChildAccessor<N>,
    F: Accept<A::Key, N>,
{
    type Item = Entry<A::Key, N>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Visit(path, node) | Frame::Expand(path, node) => {
                    if self.matches.accept(&path, &node) {
                        return Some(Entry::found(path, node));
                    }
                    match expand(self.accessor, &path, &node) {
                        Ok(children) => self.stack.extend(
                            children
                                .into_iter()
                                .rev()
                                .map(|(path, child)| Frame::Visit(path, child)),
                        ),
                        Err(err) => {
                            enumeration_failed(&path, &err);
                            return Some(Entry::failed(path, err));
                        }
                    }
                }
                Frame::Emit(path, node) => return Some(Entry::found(path, node)),
                Frame::Fail(path, err) => return Some(Entry::failed(path, err)),
            }
        }
        None
    }
}

/// Match-and-stop search with a node predicate.
pub fn top_down_match<A, N, P>(accessor: &A, root: N, pred: P) -> MatchStop<'_, A, N, ByNode<P>>
where
    A: ChildAccessor<N>,
    P: FnMut(&N) -> bool,
{
    MatchStop::new(accessor, root, ByNode(pred))
}

/// Match-and-stop search with a position-aware predicate.
pub fn top_down_match_indexed<A, N, P>(
    accessor: &A,
    root: N,
    pred: P,
) -> MatchStop<'_, A, N, ByPath<P>>
where
    A: ChildAccessor<N>,
    P: FnMut(&Path<A::Key>, &N) -> bool,
{
    MatchStop::new(accessor, root, ByPath(pred))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use otree_tree::{Tree, TreeAccessor};
    use proptest::prelude::*;

    type T = Tree<usize, &'static str>;

    //        a
    //      /   \
    //     b     c
    //    / \    |
    //   d   e   f
    fn sample() -> T {
        Tree::node(
            "a",
            vec![
                Tree::node("b", vec![Tree::leaf("d"), Tree::leaf("e")]),
                Tree::node("c", vec![Tree::leaf("f")]),
            ],
        )
    }

    fn values<I: Iterator<Item = Entry<usize, T>>>(walk: I) -> Vec<&'static str> {
        walk.map(|e| *e.value.unwrap().value()).collect()
    }

    fn failing(label: &'static str) -> T {
        Tree::lazy(label, || Err(TreeError::Enumeration("disk gone".into())))
    }

    #[test]
    fn top_down_is_pre_order() {
        let acc = TreeAccessor::new();
        assert_eq!(values(top_down(&acc, sample())), ["a", "b", "d", "e", "c", "f"]);
    }

    #[test]
    fn bottom_up_is_post_order() {
        let acc = TreeAccessor::new();
        assert_eq!(values(bottom_up(&acc, sample())), ["d", "e", "b", "f", "c", "a"]);
    }

    #[test]
    fn breadth_first_is_level_order() {
        let acc = TreeAccessor::new();
        assert_eq!(values(breadth_first(&acc, sample())), ["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn entries_carry_paths() {
        let acc = TreeAccessor::new();
        let paths: Vec<Vec<usize>> = top_down(&acc, sample())
            .map(|e| e.path.to_vec())
            .collect();
        assert_eq!(
            paths,
            vec![vec![], vec![0], vec![0, 0], vec![0, 1], vec![1], vec![1, 0]]
        );
    }

    #[test]
    fn rejected_node_prunes_subtree_in_every_order() {
        let acc = TreeAccessor::new();
        let keep = |n: &T| *n.value() != "b";
        assert_eq!(values(top_down_filtered(&acc, sample(), keep)), ["a", "c", "f"]);
        assert_eq!(values(bottom_up_filtered(&acc, sample(), keep)), ["f", "c", "a"]);
        assert_eq!(values(breadth_first_filtered(&acc, sample(), keep)), ["a", "c", "f"]);
    }

    #[test]
    fn rejected_root_yields_nothing() {
        let acc = TreeAccessor::new();
        assert_eq!(top_down_filtered(&acc, sample(), |_| false).count(), 0);
        assert_eq!(bottom_up_filtered(&acc, sample(), |_| false).count(), 0);
        assert_eq!(breadth_first_filtered(&acc, sample(), |_| false).count(), 0);
    }

    #[test]
    fn indexed_predicate_sees_depth() {
        let acc = TreeAccessor::new();
        let shallow = |p: &Path<usize>, _: &T| p.len() <= 1;
        assert_eq!(values(top_down_indexed(&acc, sample(), shallow)), ["a", "b", "c"]);
        assert_eq!(values(bottom_up_indexed(&acc, sample(), shallow)), ["b", "c", "a"]);
        assert_eq!(values(breadth_first_indexed(&acc, sample(), shallow)), ["a", "b", "c"]);
    }

    #[test]
    fn match_stop_does_not_descend_into_matches() {
        let acc = TreeAccessor::new();
        let inner = |n: &T| matches!(*n.value(), "b" | "c" | "d");
        assert_eq!(values(top_down_match(&acc, sample(), inner)), ["b", "c"]);
        assert_eq!(values(top_down_match(&acc, sample(), |_| true)), ["a"]);
        assert_eq!(
            values(top_down_match(&acc, sample(), |n| n.is_leaf())),
            ["d", "e", "f"]
        );
    }

    #[test]
    fn match_indexed_uses_paths() {
        let acc = TreeAccessor::new();
        let second_child = |p: &Path<usize>, _: &T| p.last() == Some(&1);
        assert_eq!(
            values(top_down_match_indexed(&acc, sample(), second_child)),
            ["e", "c"]
        );
    }

    fn with_failure() -> T {
        Tree::node(
            "root",
            vec![Tree::leaf("ok1"), failing("x"), Tree::leaf("ok2")],
        )
    }

    fn describe(entry: Entry<usize, T>) -> String {
        match entry.value {
            Ok(node) => node.value().to_string(),
            Err(_) => format!("err@{:?}", entry.path.to_vec()),
        }
    }

    #[test]
    fn enumeration_errors_are_forwarded_in_stream() {
        let acc = TreeAccessor::new();
        let td: Vec<_> = top_down(&acc, with_failure()).map(describe).collect();
        assert_eq!(td, ["root", "ok1", "x", "err@[1]", "ok2"]);

        let bu: Vec<_> = bottom_up(&acc, with_failure()).map(describe).collect();
        assert_eq!(bu, ["ok1", "err@[1]", "ok2", "root"]);

        let bf: Vec<_> = breadth_first(&acc, with_failure()).map(describe).collect();
        assert_eq!(bf, ["root", "ok1", "x", "ok2", "err@[1]"]);

        let ms: Vec<_> = top_down_match(&acc, with_failure(), |n| n.is_leaf())
            .map(describe)
            .collect();
        assert_eq!(ms, ["ok1", "err@[1]", "ok2"]);
    }

    #[test]
    fn early_exit_skips_child_enumeration() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let root: T = Tree::lazy("root", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec![(0, Tree::leaf("child"))])
        });
        let acc = TreeAccessor::new();

        let first = top_down(&acc, root.clone()).next().unwrap();
        assert_eq!(*first.value.unwrap().value(), "root");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let first = breadth_first(&acc, root.clone()).next().unwrap();
        assert_eq!(*first.value.unwrap().value(), "root");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        assert_eq!(top_down(&acc, root).take(2).count(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    fn arb_tree() -> impl Strategy<Value = Tree<usize, u8>> {
        let leaf = (0u8..6).prop_map(Tree::leaf);
        leaf.prop_recursive(4, 48, 4, |inner| {
            (0u8..6, proptest::collection::vec(inner, 0..4))
                .prop_map(|(value, children)| Tree::node(value, children))
        })
    }

    /// Values reachable when every node on the way down satisfies `keep`,
    /// in pre-order.
    fn reference_pruned(tree: &Tree<usize, u8>, keep: &dyn Fn(u8) -> bool, out: &mut Vec<u8>) {
        if !keep(*tree.value()) {
            return;
        }
        out.push(*tree.value());
        for item in tree.children() {
            reference_pruned(&item.unwrap().1, keep, out);
        }
    }

    fn sorted(mut v: Vec<u8>) -> Vec<u8> {
        v.sort_unstable();
        v
    }

    proptest! {
        #[test]
        fn all_orders_visit_every_node(tree in arb_tree()) {
            let acc = TreeAccessor::new();
            let size = tree.size().unwrap();
            let td: Vec<u8> = top_down(&acc, tree.clone()).map(|e| *e.value.unwrap().value()).collect();
            let bu: Vec<u8> = bottom_up(&acc, tree.clone()).map(|e| *e.value.unwrap().value()).collect();
            let bf: Vec<u8> = breadth_first(&acc, tree.clone()).map(|e| *e.value.unwrap().value()).collect();
            prop_assert_eq!(td.len(), size);
            prop_assert_eq!(bu.len(), size);
            let td = sorted(td);
            prop_assert_eq!(&td, &sorted(bu));
            prop_assert_eq!(&td, &sorted(bf));
        }

        #[test]
        fn pruning_removes_whole_subtrees(tree in arb_tree(), banned in 0u8..6) {
            let acc = TreeAccessor::new();
            let keep = move |v: u8| v != banned;
            let mut expected = Vec::new();
            reference_pruned(&tree, &keep, &mut expected);

            let td: Vec<u8> = top_down_filtered(&acc, tree.clone(), |n: &Tree<usize, u8>| keep(*n.value()))
                .map(|e| *e.value.unwrap().value())
                .collect();
            let bu: Vec<u8> = bottom_up_filtered(&acc, tree.clone(), |n: &Tree<usize, u8>| keep(*n.value()))
                .map(|e| *e.value.unwrap().value())
                .collect();
            let bf: Vec<u8> = breadth_first_filtered(&acc, tree.clone(), |n: &Tree<usize, u8>| keep(*n.value()))
                .map(|e| *e.value.unwrap().value())
                .collect();
            prop_assert_eq!(&td, &expected);
            let expected = sorted(expected);
            prop_assert_eq!(sorted(bu), expected.clone());
            prop_assert_eq!(sorted(bf), expected);
        }

        #[test]
        fn match_stop_results_never_nest(tree in arb_tree(), wanted in 0u8..6) {
            let acc = TreeAccessor::new();
            let paths: Vec<Path<usize>> = top_down_match(&acc, tree, |n: &Tree<usize, u8>| *n.value() == wanted)
                .map(|e| e.path)
                .collect();
            for (i, a) in paths.iter().enumerate() {
                for (j, b) in paths.iter().enumerate() {
                    if i != j {
                        prop_assert!(!b.starts_with_by(a, |x, y| x == y));
                    }
                }
            }
        }
    }
}

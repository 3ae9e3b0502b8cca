//! Persistent modification: transform accepted nodes, rebuild ancestors.
//!
//! Both orders return a new root and never mutate the input. A node rejected
//! by the predicate is returned as-is together with its whole subtree.
//! Errors abort the modification and come back tagged with the position
//! where they surfaced.

use otree_types::{ChildAccessor, Path, TreeResult};
use tracing::trace;

use crate::filter::Accept;

type Transform<'f, K, N> = dyn FnMut(&Path<K>, N) -> TreeResult<N> + 'f;

/// Transform each accepted node, then descend into the children of the
/// transformed node.
pub fn modify_top_down<A, N, P, F>(accessor: &A, root: N, mut accept: P, mut f: F) -> TreeResult<N>
where
    A: ChildAccessor<N>,
    P: Accept<A::Key, N>,
    F: FnMut(&Path<A::Key>, N) -> TreeResult<N>,
{
    top_down_at(accessor, &Path::root(), root, &mut accept, &mut f)
}

fn top_down_at<A, N>(
    accessor: &A,
    path: &Path<A::Key>,
    node: N,
    accept: &mut dyn Accept<A::Key, N>,
    f: &mut Transform<'_, A::Key, N>,
) -> TreeResult<N>
where
    A: ChildAccessor<N>,
{
    if !accept.accept(path, &node) {
        trace!(path = %path.to_debug_string(), "modify skipped subtree");
        return Ok(node);
    }
    let node = f(path, node).map_err(|e| e.at(path))?;
    accessor
        .rebuild(&node, &mut |key, child| {
            top_down_at(accessor, &path.append(key.clone()), child, &mut *accept, &mut *f)
        })
        .map_err(|e| e.at(path))
}

/// Rebuild each accepted node from its modified children, then transform
/// the rebuilt node.
pub fn modify_bottom_up<A, N, P, F>(accessor: &A, root: N, mut accept: P, mut f: F) -> TreeResult<N>
where
    A: ChildAccessor<N>,
    P: Accept<A::Key, N>,
    F: FnMut(&Path<A::Key>, N) -> TreeResult<N>,
{
    bottom_up_at(accessor, &Path::root(), root, &mut accept, &mut f)
}

fn bottom_up_at<A, N>(
    accessor: &A,
    path: &Path<A::Key>,
    node: N,
    accept: &mut dyn Accept<A::Key, N>,
    f: &mut Transform<'_, A::Key, N>,
) -> TreeResult<N>
where
    A: ChildAccessor<N>,
{
    if !accept.accept(path, &node) {
        trace!(path = %path.to_debug_string(), "modify skipped subtree");
        return Ok(node);
    }
    let rebuilt = accessor
        .rebuild(&node, &mut |key, child| {
            bottom_up_at(accessor, &path.append(key.clone()), child, &mut *accept, &mut *f)
        })
        .map_err(|e| e.at(path))?;
    f(path, rebuilt).map_err(|e| e.at(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{AcceptAll, ByNode, ByPath};
    use otree_tree::{Tree, TreeAccessor};
    use otree_types::TreeError;

    type T = Tree<usize, i32>;

    fn sample() -> T {
        Tree::node(
            1,
            vec![
                Tree::node(2, vec![Tree::leaf(3), Tree::leaf(4)]),
                Tree::leaf(5),
            ],
        )
    }

    fn pre_order(tree: &T, out: &mut Vec<i32>) {
        out.push(*tree.value());
        for item in tree.children() {
            pre_order(&item.unwrap().1, out);
        }
    }

    fn flatten(tree: &T) -> Vec<i32> {
        let mut out = Vec::new();
        pre_order(tree, &mut out);
        out
    }

    #[test]
    fn bottom_up_maps_every_node() {
        let acc = TreeAccessor::new();
        let doubled =
            modify_bottom_up(&acc, sample(), AcceptAll, |_, n: T| Ok(n.with_value(n.value() * 2)))
                .unwrap();
        assert_eq!(flatten(&doubled), vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn input_is_left_untouched() {
        let acc = TreeAccessor::new();
        let original = sample();
        let _ = modify_top_down(&acc, original.clone(), AcceptAll, |_, n: T| {
            Ok(n.with_value(0))
        })
        .unwrap();
        assert_eq!(flatten(&original), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn top_down_descends_into_transformed_children() {
        let acc = TreeAccessor::new();
        // Replace the root's children wholesale; the new children must be
        // the ones visited next.
        let modified = modify_top_down(&acc, sample(), AcceptAll, |path, n: T| {
            if path.is_root() {
                Ok(Tree::node(*n.value(), vec![Tree::leaf(10), Tree::leaf(20)]))
            } else {
                Ok(n.with_value(n.value() + 1))
            }
        })
        .unwrap();
        assert_eq!(flatten(&modified), vec![1, 11, 21]);
    }

    #[test]
    fn bottom_up_sees_rebuilt_children() {
        let acc = TreeAccessor::new();
        // Each node becomes the sum of its subtree.
        let summed = modify_bottom_up(&acc, sample(), AcceptAll, |_, n: T| {
            let below: i32 = n.children().map(|c| *c.unwrap().1.value()).sum();
            Ok(n.with_value(n.value() + below))
        })
        .unwrap();
        assert_eq!(flatten(&summed), vec![15, 9, 3, 4, 5]);
    }

    #[test]
    fn rejected_subtrees_pass_through() {
        let acc = TreeAccessor::new();
        let keep = ByNode(|n: &T| *n.value() != 2);
        let out = modify_bottom_up(&acc, sample(), keep, |_, n: T| Ok(n.with_value(-n.value())))
            .unwrap();
        assert_eq!(flatten(&out), vec![-1, 2, 3, 4, -5]);

        let shallow = ByPath(|p: &Path<usize>, _: &T| p.len() < 2);
        let out = modify_top_down(&acc, sample(), shallow, |_, n: T| Ok(n.with_value(0))).unwrap();
        assert_eq!(flatten(&out), vec![0, 0, 3, 4, 0]);
    }

    #[test]
    fn transform_error_is_tagged_with_position() {
        let acc = TreeAccessor::new();
        let err = modify_bottom_up(&acc, sample(), AcceptAll, |_, n: T| {
            if *n.value() == 4 {
                Err(TreeError::Transform("four".into()))
            } else {
                Ok(n)
            }
        })
        .unwrap_err();
        assert_eq!(err.path(), Some("/0/1"));
        assert_eq!(err.root_cause(), &TreeError::Transform("four".into()));
    }

    #[test]
    fn enumeration_error_aborts_at_failing_node() {
        let acc = TreeAccessor::new();
        let root: T = Tree::node(
            0,
            vec![
                Tree::leaf(1),
                Tree::lazy(2, || Err(TreeError::Enumeration("gone".into()))),
            ],
        );
        let err = modify_top_down(&acc, root, AcceptAll, |_, n: T| Ok(n)).unwrap_err();
        assert_eq!(err.path(), Some("/1"));
    }
}

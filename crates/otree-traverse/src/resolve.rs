//! Direct path resolution through keyed lookup.
//!
//! Resolution walks one level per key instead of scanning the tree, so its
//! cost is proportional to the depth of the key path (times the fan-out of
//! duplicate keys). A lookup returning several children resolves to all of
//! them.

use otree_types::{ChildAccessor, Entry, Path, TreeResult};
use tracing::trace;

use crate::filter::{Accept, AcceptAll, ByNode};

/// Every node reachable from `root` along `keys`.
///
/// Found nodes come first, in the order a pre-order walk would reach them,
/// followed by one failed entry per node whose lookup failed.
pub fn resolve<A, N>(accessor: &A, root: N, keys: &[A::Key]) -> Vec<Entry<A::Key, N>>
where
    A: ChildAccessor<N>,
{
    resolve_accepting(accessor, root, keys, AcceptAll)
}

/// As [`resolve`], applying `pred` at every level, the root included. A
/// rejected node stops resolution below it.
pub fn resolve_filtered<A, N, P>(
    accessor: &A,
    root: N,
    keys: &[A::Key],
    pred: P,
) -> Vec<Entry<A::Key, N>>
where
    A: ChildAccessor<N>,
    P: FnMut(&N) -> bool,
{
    resolve_accepting(accessor, root, keys, ByNode(pred))
}

/// As [`resolve`], with any acceptance predicate.
pub fn resolve_accepting<A, N, F>(
    accessor: &A,
    root: N,
    keys: &[A::Key],
    mut accept: F,
) -> Vec<Entry<A::Key, N>>
where
    A: ChildAccessor<N>,
    F: Accept<A::Key, N>,
{
    let mut failures = Vec::new();
    let mut frontier = Vec::new();
    let root_path = Path::root();
    if accept.accept(&root_path, &root) {
        frontier.push((root_path, root));
    }

    for key in keys {
        if frontier.is_empty() {
            break;
        }
        let mut next = Vec::new();
        for (path, node) in frontier {
            for item in accessor.lookup(&node, key) {
                match item {
                    Ok((found, child)) => {
                        let child_path = path.append(found);
                        if accept.accept(&child_path, &child) {
                            next.push((child_path, child));
                        }
                    }
                    Err(err) => {
                        trace!(path = %path.to_debug_string(), error = %err, "lookup failed");
                        failures.push(Entry::failed(path.clone(), err));
                        break;
                    }
                }
            }
        }
        frontier = next;
    }

    frontier
        .into_iter()
        .map(|(path, node)| Entry::found(path, node))
        .chain(failures)
        .collect()
}

/// Transform every node resolved by `keys` and rebuild its ancestors.
///
/// Nodes off the key path are kept as they are. When nothing resolves the
/// result equals the input.
pub fn modify_at<A, N, F>(accessor: &A, root: N, keys: &[A::Key], mut f: F) -> TreeResult<N>
where
    A: ChildAccessor<N>,
    F: FnMut(&Path<A::Key>, N) -> TreeResult<N>,
{
    modify_at_level(accessor, &Path::root(), root, keys, &mut f)
}

fn modify_at_level<A, N>(
    accessor: &A,
    path: &Path<A::Key>,
    node: N,
    keys: &[A::Key],
    f: &mut dyn FnMut(&Path<A::Key>, N) -> TreeResult<N>,
) -> TreeResult<N>
where
    A: ChildAccessor<N>,
{
    let Some((key, rest)) = keys.split_first() else {
        return f(path, node).map_err(|e| e.at(path));
    };
    accessor
        .rebuild(&node, &mut |found, child| {
            if accessor.key_eq(found, key) {
                modify_at_level(accessor, &path.append(found.clone()), child, rest, &mut *f)
            } else {
                Ok(child)
            }
        })
        .map_err(|e| e.at(path))
}

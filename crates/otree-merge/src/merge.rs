//! Key-correspondence merge.
//!
//! Children correspond purely by key equality. With duplicate keys, the
//! n-th occurrence of a key on the left pairs with the n-th occurrence on
//! the right. The merged child list keeps the left order, shared keys merged
//! in place, followed by the right-only children in right order.

use otree_types::{ChildAccessor, Path, TreeResult};
use tracing::debug;

#[derive(Debug, Default)]
struct MergeStats {
    shared: usize,
    left_only: usize,
    right_only: usize,
}

/// Merge two optional snapshots. At shared positions the right node's
/// payload wins.
///
/// One side absent returns the other unchanged.
pub fn merge<A, N>(accessor: &A, left: Option<N>, right: Option<N>) -> TreeResult<Option<N>>
where
    A: ChildAccessor<N>,
    N: Clone,
{
    merge_with(accessor, left, right, |_, _, right: &N| Ok(right.clone()))
}

/// Merge two optional snapshots, letting `combine` produce the node whose
/// payload the merged node carries at each shared position.
///
/// The children of the node returned by `combine` are ignored; the merged
/// children replace them.
pub fn merge_with<A, N, F>(
    accessor: &A,
    left: Option<N>,
    right: Option<N>,
    mut combine: F,
) -> TreeResult<Option<N>>
where
    A: ChildAccessor<N>,
    N: Clone,
    F: FnMut(&Path<A::Key>, &N, &N) -> TreeResult<N>,
{
    match (left, right) {
        (None, None) => Ok(None),
        (Some(only), None) | (None, Some(only)) => Ok(Some(only)),
        (Some(left), Some(right)) => {
            let mut stats = MergeStats::default();
            let merged = merge_at(accessor, &Path::root(), left, right, &mut combine, &mut stats)?;
            debug!(
                shared = stats.shared,
                left_only = stats.left_only,
                right_only = stats.right_only,
                "merge complete"
            );
            Ok(Some(merged))
        }
    }
}

fn merge_at<A, N>(
    accessor: &A,
    path: &Path<A::Key>,
    left: N,
    right: N,
    combine: &mut dyn FnMut(&Path<A::Key>, &N, &N) -> TreeResult<N>,
    stats: &mut MergeStats,
) -> TreeResult<N>
where
    A: ChildAccessor<N>,
    N: Clone,
{
    stats.shared += 1;
    let base = combine(path, &left, &right).map_err(|e| e.at(path))?;

    let left_children = accessor
        .children(&left)
        .collect::<TreeResult<Vec<_>>>()
        .map_err(|e| e.at(path))?;
    let right_children = accessor
        .children(&right)
        .collect::<TreeResult<Vec<_>>>()
        .map_err(|e| e.at(path))?;

    let mut claimed = vec![false; right_children.len()];
    let mut merged = Vec::with_capacity(left_children.len() + right_children.len());
    for (key, left_child) in left_children {
        let partner = (0..right_children.len())
            .find(|&j| !claimed[j] && accessor.key_eq(&right_children[j].0, &key));
        match partner {
            Some(j) => {
                claimed[j] = true;
                let (right_key, right_child) = &right_children[j];
                let child = merge_at(
                    accessor,
                    &path.append(right_key.clone()),
                    left_child,
                    right_child.clone(),
                    combine,
                    stats,
                )?;
                merged.push((right_key.clone(), child));
            }
            None => {
                stats.left_only += 1;
                merged.push((key, left_child));
            }
        }
    }
    for (entry, taken) in right_children.into_iter().zip(claimed) {
        if !taken {
            stats.right_only += 1;
            merged.push(entry);
        }
    }

    accessor
        .with_children(&base, merged)
        .map_err(|e| e.at(path))
}

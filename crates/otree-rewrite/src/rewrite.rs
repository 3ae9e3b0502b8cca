//! Fixpoint rewriting.
//!
//! One pass visits the tree top-down. At each node the rule is asked first:
//! a replacement is substituted wholesale and is not looked at again in the
//! same pass; a declined node has its children rewritten and is rebuilt
//! from them. Passes repeat from the root until one produces no change.

use otree_types::{ChildAccessor, Path, TreeResult};
use tracing::{debug, trace};

use crate::config::{Cancellation, RewriteConfig};
use crate::error::{RewriteError, RewriteResult};

/// A local rewrite rule.
///
/// Returns `Ok(Some(replacement))` to replace the node, `Ok(None)` to leave
/// it and descend into its children.
pub trait Rule<K, N> {
    /// Offer `node` at `path` to the rule.
    fn apply(&mut self, path: &Path<K>, node: &N) -> TreeResult<Option<N>>;
}

impl<K, N, F> Rule<K, N> for F
where
    F: FnMut(&Path<K>, &N) -> TreeResult<Option<N>>,
{
    fn apply(&mut self, path: &Path<K>, node: &N) -> TreeResult<Option<N>> {
        self(path, node)
    }
}

/// The outcome of a single pass.
#[derive(Clone, Debug)]
pub struct Pass<N> {
    /// The tree after the pass.
    pub tree: N,
    /// How many replacements the rule made.
    pub changes: usize,
}

/// A converged rewrite.
#[derive(Clone, Debug)]
pub struct Rewritten<N> {
    /// The tree no rule applies to any more.
    pub tree: N,
    /// Passes run, including the final pass that changed nothing.
    pub passes: usize,
}

/// Run one pass of `rule` over `root`.
pub fn rewrite_pass<A, N, R>(accessor: &A, root: N, mut rule: R) -> TreeResult<Pass<N>>
where
    A: ChildAccessor<N>,
    R: Rule<A::Key, N>,
{
    run_pass(accessor, root, &mut rule)
}

fn run_pass<A, N>(accessor: &A, root: N, rule: &mut dyn Rule<A::Key, N>) -> TreeResult<Pass<N>>
where
    A: ChildAccessor<N>,
{
    let mut changes = 0;
    let tree = pass_at(accessor, &Path::root(), root, rule, &mut changes)?;
    Ok(Pass { tree, changes })
}

fn pass_at<A, N>(
    accessor: &A,
    path: &Path<A::Key>,
    node: N,
    rule: &mut dyn Rule<A::Key, N>,
    changes: &mut usize,
) -> TreeResult<N>
where
    A: ChildAccessor<N>,
{
    if let Some(replacement) = rule.apply(path, &node).map_err(|e| e.at(path))? {
        trace!(path = %path.to_debug_string(), "rule replaced node");
        *changes += 1;
        return Ok(replacement);
    }

    let before = *changes;
    let rebuilt = accessor
        .rebuild(&node, &mut |key, child| {
            pass_at(accessor, &path.append(key.clone()), child, &mut *rule, &mut *changes)
        })
        .map_err(|e| e.at(path))?;
    if *changes == before {
        Ok(node)
    } else {
        Ok(rebuilt)
    }
}

/// Rewrite `root` until `rule` no longer applies anywhere.
///
/// Does not terminate if the rule never stops producing replacements; use
/// [`rewrite_with`] with a pass limit when that is a possibility.
pub fn rewrite<A, N, R>(accessor: &A, root: N, rule: R) -> RewriteResult<N>
where
    A: ChildAccessor<N>,
    R: Rule<A::Key, N>,
{
    rewrite_with(accessor, root, &RewriteConfig::default(), None, rule).map(|done| done.tree)
}

/// Rewrite `root` to a fixpoint under a pass limit and optional
/// cancellation.
///
/// The cancellation flag is checked before every pass. A limit of zero
/// passes fails immediately.
pub fn rewrite_with<A, N, R>(
    accessor: &A,
    root: N,
    config: &RewriteConfig,
    cancel: Option<&Cancellation>,
    mut rule: R,
) -> RewriteResult<Rewritten<N>>
where
    A: ChildAccessor<N>,
    R: Rule<A::Key, N>,
{
    let mut tree = root;
    let mut passes = 0;
    loop {
        if cancel.is_some_and(Cancellation::is_cancelled) {
            debug!(passes, "rewrite cancelled");
            return Err(RewriteError::Cancelled { passes });
        }
        if let Some(limit) = config.max_passes {
            if passes >= limit {
                debug!(limit, "rewrite hit pass limit");
                return Err(RewriteError::PassLimit { limit });
            }
        }

        let pass = run_pass(accessor, tree, &mut rule)?;
        passes += 1;
        debug!(pass = passes, changes = pass.changes, "rewrite pass complete");
        tree = pass.tree;
        if pass.changes == 0 {
            return Ok(Rewritten { tree, passes });
        }
    }
}

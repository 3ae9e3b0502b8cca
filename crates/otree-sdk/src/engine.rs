use otree_diff::{DiffEntry, Distance, TreeDiff};
use otree_rewrite::{Cancellation, Rewritten, Rule};
use otree_traverse::{Accept, BottomUp, BreadthFirst, ByNode, MatchStop, TopDown};
use otree_types::{ChildAccessor, Entry, Path, TreeResult};
use tracing::debug;

use crate::config::EngineConfig;
use crate::error::SdkResult;

/// One accessor plus the engine configuration, exposing every otree
/// engine over the accessor's node type.
#[derive(Clone, Debug, Default)]
pub struct Otree<A> {
    accessor: A,
    config: EngineConfig,
}

impl<A> Otree<A> {
    /// An engine with the default configuration.
    pub fn new(accessor: A) -> Self {
        Self::with_config(accessor, EngineConfig::default())
    }

    /// An engine using `config`.
    pub fn with_config(accessor: A, config: EngineConfig) -> Self {
        debug!(?config, "otree engine created");
        Self { accessor, config }
    }

    /// The child accessor every operation goes through.
    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    /// The active configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Mutable access to the configuration.
    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    // ---------------------------------------------------------------
    // Traversal
    // ---------------------------------------------------------------

    /// Pre-order walk pruned by `accept`.
    pub fn top_down<N, P>(&self, root: N, accept: P) -> TopDown<'_, A, N, P>
    where
        A: ChildAccessor<N>,
        P: Accept<A::Key, N>,
    {
        TopDown::new(&self.accessor, root, accept)
    }

    /// Post-order walk pruned by `accept`.
    pub fn bottom_up<N, P>(&self, root: N, accept: P) -> BottomUp<'_, A, N, P>
    where
        A: ChildAccessor<N>,
        P: Accept<A::Key, N>,
    {
        BottomUp::new(&self.accessor, root, accept)
    }

    /// Level-order walk pruned by `accept`.
    pub fn breadth_first<N, P>(&self, root: N, accept: P) -> BreadthFirst<'_, A, N, P>
    where
        A: ChildAccessor<N>,
        P: Accept<A::Key, N>,
    {
        BreadthFirst::new(&self.accessor, root, accept)
    }

    /// The outermost nodes matching `pred`.
    pub fn find<N, P>(&self, root: N, pred: P) -> MatchStop<'_, A, N, ByNode<P>>
    where
        A: ChildAccessor<N>,
        P: FnMut(&N) -> bool,
    {
        MatchStop::new(&self.accessor, root, ByNode(pred))
    }

    /// Every node reached by following `keys` from `root`.
    pub fn resolve<N>(&self, root: N, keys: &[A::Key]) -> Vec<Entry<A::Key, N>>
    where
        A: ChildAccessor<N>,
    {
        otree_traverse::resolve(&self.accessor, root, keys)
    }

    /// As [`resolve`](Self::resolve), stopping below nodes rejected by
    /// `accept`.
    pub fn resolve_accepting<N, P>(
        &self,
        root: N,
        keys: &[A::Key],
        accept: P,
    ) -> Vec<Entry<A::Key, N>>
    where
        A: ChildAccessor<N>,
        P: Accept<A::Key, N>,
    {
        otree_traverse::resolve_accepting(&self.accessor, root, keys, accept)
    }

    // ---------------------------------------------------------------
    // Modification
    // ---------------------------------------------------------------

    /// Transform accepted nodes pre-order, descending into each transformed
    /// node's children.
    pub fn modify_top_down<N, P, F>(&self, root: N, accept: P, f: F) -> SdkResult<N>
    where
        A: ChildAccessor<N>,
        P: Accept<A::Key, N>,
        F: FnMut(&Path<A::Key>, N) -> TreeResult<N>,
    {
        Ok(otree_traverse::modify_top_down(&self.accessor, root, accept, f)?)
    }

    /// Transform accepted nodes post-order, after their children have been
    /// rebuilt.
    pub fn modify_bottom_up<N, P, F>(&self, root: N, accept: P, f: F) -> SdkResult<N>
    where
        A: ChildAccessor<N>,
        P: Accept<A::Key, N>,
        F: FnMut(&Path<A::Key>, N) -> TreeResult<N>,
    {
        Ok(otree_traverse::modify_bottom_up(&self.accessor, root, accept, f)?)
    }

    /// Transform the nodes at `keys`, rebuilding their ancestors.
    pub fn modify_at<N, F>(&self, root: N, keys: &[A::Key], f: F) -> SdkResult<N>
    where
        A: ChildAccessor<N>,
        F: FnMut(&Path<A::Key>, N) -> TreeResult<N>,
    {
        Ok(otree_traverse::modify_at(&self.accessor, root, keys, f)?)
    }

    // ---------------------------------------------------------------
    // Rewrite
    // ---------------------------------------------------------------

    /// Rewrite to a fixpoint under the configured pass limit.
    pub fn rewrite<N, R>(&self, root: N, rule: R) -> SdkResult<Rewritten<N>>
    where
        A: ChildAccessor<N>,
        R: Rule<A::Key, N>,
    {
        Ok(otree_rewrite::rewrite_with(
            &self.accessor,
            root,
            &self.config.rewrite,
            None,
            rule,
        )?)
    }

    /// As [`rewrite`](Self::rewrite), stopping between passes once `cancel`
    /// is set.
    pub fn rewrite_cancellable<N, R>(
        &self,
        root: N,
        cancel: &Cancellation,
        rule: R,
    ) -> SdkResult<Rewritten<N>>
    where
        A: ChildAccessor<N>,
        R: Rule<A::Key, N>,
    {
        Ok(otree_rewrite::rewrite_with(
            &self.accessor,
            root,
            &self.config.rewrite,
            Some(cancel),
            rule,
        )?)
    }

    // ---------------------------------------------------------------
    // Diff and merge
    // ---------------------------------------------------------------

    /// Diff two optional snapshots under the configured threshold,
    /// suppression mask and move detection.
    pub fn diff<N, D>(
        &self,
        before: Option<N>,
        after: Option<N>,
        distance: D,
    ) -> SdkResult<TreeDiff<A::Key, N>>
    where
        A: ChildAccessor<N>,
        N: Clone,
        D: Distance<A::Key, N>,
    {
        Ok(otree_diff::diff(
            &self.accessor,
            before,
            after,
            distance,
            &self.config.diff,
        )?)
    }

    /// Write the diff of `before` and `after` back through `transform`.
    pub fn apply_diff<N, D, F>(
        &self,
        before: Option<N>,
        after: Option<N>,
        distance: D,
        transform: F,
    ) -> SdkResult<Option<N>>
    where
        A: ChildAccessor<N>,
        N: Clone,
        D: Distance<A::Key, N>,
        F: FnMut(&DiffEntry<A::Key, N>, Option<N>) -> TreeResult<Option<N>>,
    {
        Ok(otree_diff::apply_diff(
            &self.accessor,
            before,
            after,
            distance,
            &self.config.diff,
            transform,
        )?)
    }

    /// Union two optional snapshots, right payload winning.
    pub fn merge<N>(&self, left: Option<N>, right: Option<N>) -> SdkResult<Option<N>>
    where
        A: ChildAccessor<N>,
        N: Clone,
    {
        Ok(otree_merge::merge(&self.accessor, left, right)?)
    }

    /// Union two optional snapshots, `combine` choosing the payload at
    /// shared positions.
    pub fn merge_with<N, F>(
        &self,
        left: Option<N>,
        right: Option<N>,
        combine: F,
    ) -> SdkResult<Option<N>>
    where
        A: ChildAccessor<N>,
        N: Clone,
        F: FnMut(&Path<A::Key>, &N, &N) -> TreeResult<N>,
    {
        Ok(otree_merge::merge_with(&self.accessor, left, right, combine)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SdkError;
    use otree_diff::{ByValue, DiffConfig, DiffType};
    use otree_rewrite::{RewriteConfig, RewriteError};
    use otree_traverse::{AcceptAll, ByPath};
    use otree_tree::{Tree, TreeAccessor};
    use otree_types::TreeError;
    use proptest::prelude::*;

    type T = Tree<u8, i64>;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    }

    fn engine() -> Otree<TreeAccessor> {
        init_tracing();
        Otree::new(TreeAccessor::new())
    }

    fn sample() -> T {
        Tree::from_entries(
            1,
            vec![
                (0, Tree::from_entries(2, vec![(0, Tree::leaf(4)), (1, Tree::leaf(5))])),
                (1, Tree::leaf(3)),
            ],
        )
    }

    fn values(entries: impl Iterator<Item = Entry<u8, T>>) -> Vec<i64> {
        entries.map(|e| *e.into_result().unwrap().1.value()).collect()
    }

    fn by_value() -> ByValue<fn(&T) -> i64> {
        ByValue(|n: &T| *n.value())
    }

    #[test]
    fn walks_in_three_orders() {
        let otree = engine();
        assert_eq!(values(otree.top_down(sample(), AcceptAll)), vec![1, 2, 4, 5, 3]);
        assert_eq!(values(otree.bottom_up(sample(), AcceptAll)), vec![4, 5, 2, 3, 1]);
        assert_eq!(values(otree.breadth_first(sample(), AcceptAll)), vec![1, 2, 3, 4, 5]);
        assert_eq!(
            values(otree.top_down(sample(), ByPath(|p: &Path<u8>, _: &T| p.len() < 2))),
            vec![1, 2, 3]
        );
        assert_eq!(values(otree.find(sample(), |n: &T| *n.value() % 2 == 0)), vec![2]);
    }

    #[test]
    fn resolves_and_modifies_by_key() {
        let otree = engine();
        let found = otree.resolve(sample(), &[0, 1]);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path.to_vec(), vec![0, 1]);

        let bumped = otree
            .modify_at(sample(), &[0, 1], |_, n: T| Ok(n.with_value(50)))
            .unwrap();
        assert_eq!(values(otree.top_down(bumped, AcceptAll)), vec![1, 2, 4, 50, 3]);

        let doubled = otree
            .modify_bottom_up(sample(), AcceptAll, |_, n: T| {
                let v = *n.value();
                Ok(n.with_value(v * 2))
            })
            .unwrap();
        assert_eq!(values(otree.top_down(doubled, AcceptAll)), vec![2, 4, 8, 10, 6]);
    }

    #[test]
    fn rewrite_uses_configured_limit() {
        let mut otree = engine();
        let flip = |_: &Path<u8>, n: &T| -> TreeResult<Option<T>> {
            Ok(Some(n.with_value(-*n.value())))
        };
        otree.config_mut().rewrite = RewriteConfig::bounded(4);
        let err = otree.rewrite(Tree::leaf(1), flip).unwrap_err();
        assert!(matches!(err, SdkError::Rewrite(RewriteError::PassLimit { limit: 4 })));

        let cancel = Cancellation::new();
        cancel.cancel();
        let err = otree
            .rewrite_cancellable(Tree::leaf(1), &cancel, flip)
            .unwrap_err();
        assert!(matches!(err, SdkError::Rewrite(RewriteError::Cancelled { passes: 0 })));
    }

    #[test]
    fn rewrite_collapses_to_a_leaf() {
        let otree = engine();
        let sum = |_: &Path<u8>, n: &T| -> TreeResult<Option<T>> {
            if n.is_leaf() {
                return Ok(None);
            }
            let mut total = *n.value();
            for child in n.children() {
                let (_, child) = child?;
                if !child.is_leaf() {
                    return Ok(None);
                }
                total += *child.value();
            }
            Ok(Some(Tree::leaf(total)))
        };
        let done = otree.rewrite(sample(), sum).unwrap();
        assert_eq!(done.tree, Tree::leaf(15));
        assert!(done.passes >= 2);
    }

    #[test]
    fn diff_honours_config() {
        let changed = sample().with_value(9);
        let otree = engine();
        let diff = otree.diff(Some(sample()), Some(changed.clone()), by_value()).unwrap();
        assert_eq!(diff.count(DiffType::Modify), 1);
        assert_eq!(diff.count(DiffType::None), 4);

        let otree = Otree::with_config(
            TreeAccessor::new(),
            EngineConfig {
                diff: DiffConfig::changes_only(),
                ..Default::default()
            },
        );
        let diff = otree.diff(Some(sample()), Some(changed), by_value()).unwrap();
        assert_eq!(diff.len(), 1);
        assert!(diff.iter().all(|e| e.kind == DiffType::Modify));
    }

    #[test]
    fn apply_and_merge() {
        let otree = engine();
        let after = Tree::from_entries(1, vec![(1, Tree::leaf(3)), (2, Tree::leaf(6))]);
        let revert = otree
            .apply_diff(Some(sample()), Some(after.clone()), by_value(), |e, _| {
                Ok(e.before_value.clone())
            })
            .unwrap();
        assert_eq!(revert, Some(sample()));

        let merged = otree.merge(Some(sample()), Some(after.clone())).unwrap().unwrap();
        assert_eq!(values(otree.top_down(merged, AcceptAll)), vec![1, 2, 4, 5, 3, 6]);

        let summed = otree
            .merge_with(Some(sample()), Some(after), |_, l: &T, r: &T| {
                Ok(r.with_value(*l.value() + *r.value()))
            })
            .unwrap()
            .unwrap();
        assert_eq!(values(otree.top_down(summed, AcceptAll)), vec![2, 2, 4, 5, 6, 6]);
    }

    #[test]
    fn errors_keep_their_position() {
        let otree = engine();
        let broken: T = Tree::from_entries(
            0,
            vec![(4, Tree::lazy(1, || Err(TreeError::Enumeration("offline".into()))))],
        );
        let err = otree
            .modify_bottom_up(broken.clone(), AcceptAll, |_, n: T| Ok(n))
            .unwrap_err();
        assert_eq!(err.tree_error().and_then(TreeError::path), Some("/4"));

        let err = otree
            .diff(Some(broken.clone()), Some(broken), by_value())
            .unwrap_err();
        assert_eq!(err.tree_error().and_then(TreeError::path), Some("/4"));
    }

    fn arb_tree() -> impl Strategy<Value = T> {
        let leaf = (0i64..5).prop_map(Tree::leaf);
        leaf.prop_recursive(4, 48, 4, |inner| {
            (0i64..5, proptest::collection::vec((0u8..4, inner), 0..4))
                .prop_map(|(value, children)| Tree::from_entries(value, children))
        })
    }

    proptest! {
        #[test]
        fn orders_agree_on_node_multiset(tree in arb_tree()) {
            let otree = Otree::new(TreeAccessor::new());
            let mut pre = values(otree.top_down(tree.clone(), AcceptAll));
            let mut post = values(otree.bottom_up(tree.clone(), AcceptAll));
            let mut level = values(otree.breadth_first(tree.clone(), AcceptAll));
            prop_assert_eq!(pre.len(), tree.size().unwrap());
            pre.sort_unstable();
            post.sort_unstable();
            level.sort_unstable();
            prop_assert_eq!(&pre, &post);
            prop_assert_eq!(&pre, &level);
        }

        #[test]
        fn identity_write_back_rebuilds_after(before in arb_tree(), after in arb_tree()) {
            let otree = Otree::new(TreeAccessor::new());
            let rebuilt = otree
                .apply_diff(Some(before), Some(after.clone()), by_value(), |_, current| Ok(current))
                .unwrap();
            prop_assert_eq!(rebuilt, Some(after));
        }

        #[test]
        fn merging_a_diffed_tree_with_itself_reports_no_change(tree in arb_tree()) {
            let otree = Otree::new(TreeAccessor::new());
            let merged = otree.merge(Some(tree.clone()), Some(tree.clone())).unwrap();
            let diff = otree.diff(Some(tree), merged, by_value()).unwrap();
            prop_assert!(!diff.has_changes());
        }
    }
}

//! The diff walk and diff write-back.
//!
//! Both operations share one walk over a pair of optional snapshots:
//!
//! - both absent: one `None` entry, no recursion;
//! - one side absent: one `Add` or `Remove` entry for the whole subtree;
//! - both present: the pair is measured, reported as `None` (distance zero)
//!   or `Modify` (within the threshold) or not at all (beyond it), and the
//!   children are aligned and walked in any case.
//!
//! [`Differ::diff`] collects the reported entries in pre-order.
//! [`Differ::apply`] hands every reported entry to a transform, children
//! before parents, and assembles a new tree from the results.

use std::fmt;

use otree_types::{ChildAccessor, Path, TreeResult};
use tracing::{debug, trace};

use crate::align::{AlignContext, Alignment, SequenceAligner, SiblingAligner};
use crate::config::DiffConfig;
use crate::distance::{measure, Distance, Positioned};
use crate::entry::{DiffEntry, DiffType, TreeDiff};
use crate::error::{DiffError, DiffResult};

/// Diff engine over one accessor and one distance function.
pub struct Differ<'a, A, D, G = SequenceAligner> {
    accessor: &'a A,
    distance: D,
    aligner: G,
    config: DiffConfig,
}

impl<'a, A, D> Differ<'a, A, D> {
    /// A differ with the default configuration and [`SequenceAligner`].
    pub fn new(accessor: &'a A, distance: D) -> Self {
        Self {
            accessor,
            distance,
            aligner: SequenceAligner,
            config: DiffConfig::default(),
        }
    }
}

impl<'a, A, D, G> Differ<'a, A, D, G> {
    pub fn with_config(mut self, config: DiffConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the sibling aligner.
    pub fn with_aligner<G2>(self, aligner: G2) -> Differ<'a, A, D, G2> {
        Differ {
            accessor: self.accessor,
            distance: self.distance,
            aligner,
            config: self.config,
        }
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }
}

impl<A, D, G> Differ<'_, A, D, G> {
    /// Compare two optional snapshots.
    pub fn diff<N>(&self, before: Option<N>, after: Option<N>) -> DiffResult<TreeDiff<A::Key, N>>
    where
        A: ChildAccessor<N>,
        N: Clone,
        D: Distance<A::Key, N>,
        G: SiblingAligner<A::Key, N>,
    {
        let mut walk = Walk {
            differ: self,
            sink: Collect {
                entries: Vec::new(),
            },
        };
        walk.root(before, after)?;
        let diff = TreeDiff::new(walk.sink.entries);
        debug!(
            entries = diff.len(),
            added = diff.count(DiffType::Add),
            removed = diff.count(DiffType::Remove),
            modified = diff.count(DiffType::Modify),
            moved = diff.moves().count(),
            "diff complete"
        );
        Ok(diff)
    }

    /// Walk the diff of two snapshots and rebuild the after snapshot
    /// through `transform`.
    ///
    /// The transform receives each reported entry and the after-side value
    /// at that position (rebuilt from already transformed children for
    /// matched nodes, `None` for removals) and returns the value to keep.
    /// Suppressed and unreported positions keep their after-side value
    /// without calling the transform. Matched nodes are rebuilt with
    /// [`ChildAccessor::with_children`].
    pub fn apply<N, F>(&self, before: Option<N>, after: Option<N>, transform: F) -> DiffResult<Option<N>>
    where
        A: ChildAccessor<N>,
        N: Clone,
        D: Distance<A::Key, N>,
        G: SiblingAligner<A::Key, N>,
        F: FnMut(&DiffEntry<A::Key, N>, Option<N>) -> TreeResult<Option<N>>,
    {
        let mut walk = Walk {
            differ: self,
            sink: Transform { f: transform },
        };
        walk.root(before, after)
    }
}

/// Compare two optional snapshots with the default aligner.
pub fn diff<A, N, D>(
    accessor: &A,
    before: Option<N>,
    after: Option<N>,
    distance: D,
    config: &DiffConfig,
) -> DiffResult<TreeDiff<A::Key, N>>
where
    A: ChildAccessor<N>,
    N: Clone,
    D: Distance<A::Key, N>,
{
    Differ::new(accessor, distance)
        .with_config(config.clone())
        .diff(before, after)
}

/// Write a diff back through `transform`, see [`Differ::apply`].
pub fn apply_diff<A, N, D, F>(
    accessor: &A,
    before: Option<N>,
    after: Option<N>,
    distance: D,
    config: &DiffConfig,
    transform: F,
) -> DiffResult<Option<N>>
where
    A: ChildAccessor<N>,
    N: Clone,
    D: Distance<A::Key, N>,
    F: FnMut(&DiffEntry<A::Key, N>, Option<N>) -> TreeResult<Option<N>>,
{
    Differ::new(accessor, distance)
        .with_config(config.clone())
        .apply(before, after, transform)
}

/// Receives reported entries during a walk.
trait Sink<K, N> {
    /// Whether matched nodes are reassembled from their children, which
    /// also means children are visited before their parent.
    const REBUILDS: bool;

    fn report(&mut self, entry: DiffEntry<K, N>, current: Option<N>) -> DiffResult<Option<N>>;
}

struct Collect<K, N> {
    entries: Vec<DiffEntry<K, N>>,
}

impl<K, N> Sink<K, N> for Collect<K, N> {
    const REBUILDS: bool = false;

    fn report(&mut self, entry: DiffEntry<K, N>, current: Option<N>) -> DiffResult<Option<N>> {
        self.entries.push(entry);
        Ok(current)
    }
}

struct Transform<F> {
    f: F,
}

impl<K, N, F> Sink<K, N> for Transform<F>
where
    K: fmt::Debug,
    F: FnMut(&DiffEntry<K, N>, Option<N>) -> TreeResult<Option<N>>,
{
    const REBUILDS: bool = true;

    fn report(&mut self, entry: DiffEntry<K, N>, current: Option<N>) -> DiffResult<Option<N>> {
        (self.f)(&entry, current).map_err(|e| DiffError::Tree(e.at(&entry.after_path)))
    }
}

/// A matched pair of nodes about to be visited.
struct Matched<K, N> {
    before_path: Path<K>,
    after_path: Path<K>,
    before_position: Option<usize>,
    after_position: Option<usize>,
    before: N,
    after: N,
    kind: DiffType,
    distance: f64,
    moved: bool,
}

impl<K: Clone, N: Clone> Matched<K, N> {
    fn entry(&self) -> DiffEntry<K, N> {
        DiffEntry {
            kind: self.kind,
            before_path: self.before_path.clone(),
            after_path: self.after_path.clone(),
            before_position: self.before_position,
            after_position: self.after_position,
            before_value: Some(self.before.clone()),
            after_value: Some(self.after.clone()),
            distance: self.distance,
            moved: self.moved,
        }
    }
}

struct Walk<'d, 'a, A, D, G, S> {
    differ: &'d Differ<'a, A, D, G>,
    sink: S,
}

impl<A, D, G, S> Walk<'_, '_, A, D, G, S> {
    fn root<N>(&mut self, before: Option<N>, after: Option<N>) -> DiffResult<Option<N>>
    where
        A: ChildAccessor<N>,
        N: Clone,
        D: Distance<A::Key, N>,
        G: SiblingAligner<A::Key, N>,
        S: Sink<A::Key, N>,
    {
        let root = Path::root();
        match (before, after) {
            (None, None) => self.emit(DiffEntry::both_absent(), None),
            (None, Some(after)) => {
                let entry = one_sided(DiffType::Add, None, Some(after.clone()), &root, &root, None, None);
                self.emit(entry, Some(after))
            }
            (Some(before), None) => {
                let entry = one_sided(DiffType::Remove, Some(before), None, &root, &root, None, None);
                self.emit(entry, None)
            }
            (Some(before), Some(after)) => {
                let distance = measure(
                    &self.differ.distance,
                    &Positioned::new(root.clone(), before.clone()),
                    &Positioned::new(root.clone(), after.clone()),
                )?;
                let kind = if distance == 0.0 {
                    DiffType::None
                } else {
                    DiffType::Modify
                };
                self.matched(Matched {
                    before_path: root.clone(),
                    after_path: root,
                    before_position: None,
                    after_position: None,
                    before,
                    after,
                    kind,
                    distance,
                    moved: false,
                })
            }
        }
    }

    /// Report a matched pair (threshold permitting) and walk its children.
    fn matched<N>(&mut self, pair: Matched<A::Key, N>) -> DiffResult<Option<N>>
    where
        A: ChildAccessor<N>,
        N: Clone,
        D: Distance<A::Key, N>,
        G: SiblingAligner<A::Key, N>,
        S: Sink<A::Key, N>,
    {
        let reported = !(pair.kind == DiffType::Modify && pair.distance > self.differ.config.threshold);
        if !reported {
            trace!(
                path = %pair.after_path.to_debug_string(),
                distance = pair.distance,
                "beyond threshold, not reported"
            );
        }

        if <S as Sink<A::Key, N>>::REBUILDS {
            let current = self.children(&pair)?;
            if reported {
                self.emit(pair.entry(), Some(current))
            } else {
                Ok(Some(current))
            }
        } else {
            if reported {
                self.emit(pair.entry(), Some(pair.after.clone()))?;
            }
            self.children(&pair)?;
            Ok(Some(pair.after))
        }
    }

    /// Align and walk the children of a matched pair. Returns the after
    /// node, rebuilt over the walked children when the sink rebuilds.
    fn children<N>(&mut self, pair: &Matched<A::Key, N>) -> DiffResult<N>
    where
        A: ChildAccessor<N>,
        N: Clone,
        D: Distance<A::Key, N>,
        G: SiblingAligner<A::Key, N>,
        S: Sink<A::Key, N>,
    {
        let accessor = self.differ.accessor;
        let before_children = enumerate(accessor, &pair.before_path, &pair.before)?;
        let after_children = enumerate(accessor, &pair.after_path, &pair.after)?;

        let key_eq = |a: &A::Key, b: &A::Key| accessor.key_eq(a, b);
        let ctx = AlignContext {
            before_path: &pair.before_path,
            after_path: &pair.after_path,
            distance: &self.differ.distance,
            key_eq: &key_eq,
            threshold: self.differ.config.threshold,
            detect_moves: self.differ.config.detect_moves,
        };
        let alignments = self
            .differ
            .aligner
            .align(&ctx, &before_children, &after_children)?;

        let mut rebuilt = Vec::with_capacity(after_children.len());
        for alignment in alignments {
            let (key, child) = self.child(pair, &before_children, &after_children, alignment)?;
            if let Some(child) = child {
                rebuilt.push((key, child));
            }
        }

        if <S as Sink<A::Key, N>>::REBUILDS {
            Ok(accessor
                .with_children(&pair.after, rebuilt)
                .map_err(|e| e.at(&pair.after_path))?)
        } else {
            Ok(pair.after.clone())
        }
    }

    /// Visit one aligned child. Returns the key and the value to keep under
    /// the parent.
    fn child<N>(
        &mut self,
        parent: &Matched<A::Key, N>,
        before: &[(A::Key, N)],
        after: &[(A::Key, N)],
        alignment: Alignment<A::Key>,
    ) -> DiffResult<(A::Key, Option<N>)>
    where
        A: ChildAccessor<N>,
        N: Clone,
        D: Distance<A::Key, N>,
        G: SiblingAligner<A::Key, N>,
        S: Sink<A::Key, N>,
    {
        let invalid = |reason: &str| DiffError::Alignment {
            path: parent.after_path.to_debug_string(),
            reason: reason.to_string(),
        };
        let before_child = match alignment.before_index {
            Some(i) => Some(before.get(i).ok_or_else(|| invalid("before index out of range"))?),
            None => None,
        };
        let after_child = match alignment.after_index {
            Some(i) => Some(after.get(i).ok_or_else(|| invalid("after index out of range"))?),
            None => None,
        };

        match (alignment.kind, before_child, after_child) {
            (DiffType::Add, None, Some((key, node))) => {
                let entry = one_sided(
                    DiffType::Add,
                    None,
                    Some(node.clone()),
                    &parent.before_path.append(key.clone()),
                    &parent.after_path.append(key.clone()),
                    None,
                    alignment.after_index,
                );
                Ok((key.clone(), self.emit(entry, Some(node.clone()))?))
            }
            (DiffType::Remove, Some((key, node)), None) => {
                let entry = one_sided(
                    DiffType::Remove,
                    Some(node.clone()),
                    None,
                    &parent.before_path.append(key.clone()),
                    &parent.after_path.append(key.clone()),
                    alignment.before_index,
                    None,
                );
                Ok((key.clone(), self.emit(entry, None)?))
            }
            (DiffType::None | DiffType::Modify, Some((before_key, before)), Some((after_key, after))) => {
                let kept = self.matched(Matched {
                    before_path: parent.before_path.append(before_key.clone()),
                    after_path: parent.after_path.append(after_key.clone()),
                    before_position: alignment.before_index,
                    after_position: alignment.after_index,
                    before: before.clone(),
                    after: after.clone(),
                    kind: alignment.kind,
                    distance: alignment.distance,
                    moved: alignment.moved,
                })?;
                Ok((after_key.clone(), kept))
            }
            (kind, _, _) => Err(invalid(&format!("{kind} alignment with mismatched indices"))),
        }
    }

    fn emit<N>(&mut self, entry: DiffEntry<A::Key, N>, current: Option<N>) -> DiffResult<Option<N>>
    where
        A: ChildAccessor<N>,
        S: Sink<A::Key, N>,
    {
        if self.differ.config.suppress.contains(entry.kind) {
            trace!(kind = %entry.kind, path = %entry.after_path.to_debug_string(), "suppressed");
            return Ok(current);
        }
        self.sink.report(entry, current)
    }
}

fn enumerate<A, N>(accessor: &A, path: &Path<A::Key>, node: &N) -> DiffResult<Vec<(A::Key, N)>>
where
    A: ChildAccessor<N>,
{
    accessor
        .children(node)
        .collect::<TreeResult<Vec<_>>>()
        .map_err(|e| DiffError::Tree(e.at(path)))
}

fn one_sided<K: Clone, N>(
    kind: DiffType,
    before_value: Option<N>,
    after_value: Option<N>,
    before_path: &Path<K>,
    after_path: &Path<K>,
    before_position: Option<usize>,
    after_position: Option<usize>,
) -> DiffEntry<K, N> {
    DiffEntry {
        kind,
        before_path: before_path.clone(),
        after_path: after_path.clone(),
        before_position,
        after_position,
        before_value,
        after_value,
        distance: 0.0,
        moved: false,
    }
}

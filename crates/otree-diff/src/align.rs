//! Sibling alignment: pairing the children of two matched nodes.
//!
//! The engine hands the aligner both child lists and receives one
//! [`Alignment`] per output position. [`SequenceAligner`] runs Myers over
//! the key sequences and can afterwards pair leftover removals and
//! additions with equal keys as moves.

use std::fmt;

use otree_types::Path;
use similar::algorithms::{myers, Capture};
use similar::DiffOp;
use tracing::trace;

use crate::distance::{measure, Distance, Positioned};
use crate::entry::DiffType;
use crate::error::DiffResult;

/// One aligned child position.
///
/// `Add` carries only `after_index`, `Remove` only `before_index`, matched
/// kinds (`None`, `Modify`) both.
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment<K> {
    pub key: K,
    pub before_index: Option<usize>,
    pub after_index: Option<usize>,
    pub kind: DiffType,
    pub distance: f64,
    /// Paired out of sequence.
    pub moved: bool,
}

impl<K> Alignment<K> {
    fn added(key: K, after_index: usize) -> Self {
        Self {
            key,
            before_index: None,
            after_index: Some(after_index),
            kind: DiffType::Add,
            distance: 0.0,
            moved: false,
        }
    }

    fn removed(key: K, before_index: usize) -> Self {
        Self {
            key,
            before_index: Some(before_index),
            after_index: None,
            kind: DiffType::Remove,
            distance: 0.0,
            moved: false,
        }
    }
}

/// What an aligner knows about the parent pair being aligned.
pub struct AlignContext<'a, K, N> {
    /// Path of the parent in the before snapshot.
    pub before_path: &'a Path<K>,
    /// Path of the parent in the after snapshot.
    pub after_path: &'a Path<K>,
    pub distance: &'a dyn Distance<K, N>,
    pub key_eq: &'a dyn Fn(&K, &K) -> bool,
    pub threshold: f64,
    pub detect_moves: bool,
}

impl<K: Clone + fmt::Debug, N: Clone> AlignContext<'_, K, N> {
    /// Distance between two children at their real positions.
    pub fn child_distance(&self, before: &(K, N), after: &(K, N)) -> DiffResult<f64> {
        measure(
            self.distance,
            &Positioned::new(self.before_path.append(before.0.clone()), before.1.clone()),
            &Positioned::new(self.after_path.append(after.0.clone()), after.1.clone()),
        )
    }

    /// Distance between two children both placed at their parents' paths.
    ///
    /// Used as the identity check for move candidates. Position-sensitive
    /// metrics therefore see no position change here.
    pub fn placeholder_distance(&self, before: &(K, N), after: &(K, N)) -> DiffResult<f64> {
        measure(
            self.distance,
            &Positioned::new(self.before_path.clone(), before.1.clone()),
            &Positioned::new(self.after_path.clone(), after.1.clone()),
        )
    }
}

/// Aligns two keyed sibling lists.
///
/// Contract: every before index and every after index appears in exactly
/// one alignment, output follows the after sequence with removals placed
/// at their before positions, and matched alignments carry the distance of
/// the pair.
pub trait SiblingAligner<K, N> {
    fn align(
        &self,
        ctx: &AlignContext<'_, K, N>,
        before: &[(K, N)],
        after: &[(K, N)],
    ) -> DiffResult<Vec<Alignment<K>>>;
}

/// Myers alignment over child keys, with optional move pairing.
#[derive(Clone, Copy, Debug, Default)]
pub struct SequenceAligner;

/// A key compared through the accessor's key equality.
struct Keyed<'a, K> {
    key: &'a K,
    eq: &'a dyn Fn(&K, &K) -> bool,
}

impl<K> PartialEq for Keyed<'_, K> {
    fn eq(&self, other: &Self) -> bool {
        (self.eq)(self.key, other.key)
    }
}

impl<K, N> SiblingAligner<K, N> for SequenceAligner
where
    K: Clone + fmt::Debug,
    N: Clone,
{
    fn align(
        &self,
        ctx: &AlignContext<'_, K, N>,
        before: &[(K, N)],
        after: &[(K, N)],
    ) -> DiffResult<Vec<Alignment<K>>> {
        let old: Vec<Keyed<'_, K>> = before
            .iter()
            .map(|(key, _)| Keyed { key, eq: ctx.key_eq })
            .collect();
        let new: Vec<Keyed<'_, K>> = after
            .iter()
            .map(|(key, _)| Keyed { key, eq: ctx.key_eq })
            .collect();

        let mut capture = Capture::new();
        myers::diff(&mut capture, &old, 0..old.len(), &new, 0..new.len())
            .unwrap_or_else(|never| match never {});

        let mut out = Vec::with_capacity(before.len().max(after.len()));
        for op in capture.into_ops() {
            match op {
                DiffOp::Equal {
                    old_index,
                    new_index,
                    len,
                } => {
                    for i in 0..len {
                        let (b, a) = (old_index + i, new_index + i);
                        let distance = ctx.child_distance(&before[b], &after[a])?;
                        out.push(Alignment {
                            key: after[a].0.clone(),
                            before_index: Some(b),
                            after_index: Some(a),
                            kind: if distance == 0.0 {
                                DiffType::None
                            } else {
                                DiffType::Modify
                            },
                            distance,
                            moved: false,
                        });
                    }
                }
                DiffOp::Delete {
                    old_index, old_len, ..
                } => {
                    for b in old_index..old_index + old_len {
                        out.push(Alignment::removed(before[b].0.clone(), b));
                    }
                }
                DiffOp::Insert {
                    new_index, new_len, ..
                } => {
                    for a in new_index..new_index + new_len {
                        out.push(Alignment::added(after[a].0.clone(), a));
                    }
                }
                DiffOp::Replace {
                    old_index,
                    old_len,
                    new_index,
                    new_len,
                } => {
                    for b in old_index..old_index + old_len {
                        out.push(Alignment::removed(before[b].0.clone(), b));
                    }
                    for a in new_index..new_index + new_len {
                        out.push(Alignment::added(after[a].0.clone(), a));
                    }
                }
            }
        }

        if ctx.detect_moves {
            out = pair_moves(ctx, before, after, out)?;
        }
        Ok(out)
    }
}

/// Turn remove/add pairs with equal keys into moves.
///
/// A pair is accepted when the placeholder distance is within the
/// threshold; its kind comes from that check while the reported distance is
/// measured at the real child paths. The move takes the addition's slot.
fn pair_moves<K, N>(
    ctx: &AlignContext<'_, K, N>,
    before: &[(K, N)],
    after: &[(K, N)],
    mut out: Vec<Alignment<K>>,
) -> DiffResult<Vec<Alignment<K>>>
where
    K: Clone + fmt::Debug,
    N: Clone,
{
    let removals: Vec<usize> = (0..out.len())
        .filter(|&i| out[i].kind == DiffType::Remove)
        .collect();
    let mut additions: Vec<usize> = (0..out.len())
        .filter(|&i| out[i].kind == DiffType::Add)
        .collect();
    let mut paired = vec![false; out.len()];

    for slot in removals {
        let Some(b) = out[slot].before_index else {
            continue;
        };
        let mut accepted = None;
        for (candidate, &add_slot) in additions.iter().enumerate() {
            let Some(a) = out[add_slot].after_index else {
                continue;
            };
            if !(ctx.key_eq)(&before[b].0, &after[a].0) {
                continue;
            }
            let identity = ctx.placeholder_distance(&before[b], &after[a])?;
            if identity <= ctx.threshold {
                accepted = Some((candidate, add_slot, a, identity));
                break;
            }
        }
        let Some((candidate, add_slot, a, identity)) = accepted else {
            continue;
        };

        let distance = ctx.child_distance(&before[b], &after[a])?;
        trace!(
            key = ?after[a].0,
            before_index = b,
            after_index = a,
            distance,
            "paired move"
        );
        out[add_slot] = Alignment {
            key: after[a].0.clone(),
            before_index: Some(b),
            after_index: Some(a),
            kind: if identity == 0.0 {
                DiffType::None
            } else {
                DiffType::Modify
            },
            distance,
            moved: true,
        };
        paired[slot] = true;
        additions.remove(candidate);
    }

    Ok(out
        .into_iter()
        .zip(paired)
        .filter_map(|(alignment, dropped)| (!dropped).then_some(alignment))
        .collect())
}

//! Diff entries and the diff result.

use std::fmt;

use otree_types::Path;
use serde::{Deserialize, Serialize};

/// The correspondence status of one position between two snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffType {
    /// Matched and identical (distance zero), or both snapshots absent.
    None,
    /// Present only in the after snapshot.
    Add,
    /// Present only in the before snapshot.
    Remove,
    /// Matched with a distance within the threshold.
    Modify,
}

impl DiffType {
    /// Every kind, in declaration order.
    pub const ALL: [DiffType; 4] = [
        DiffType::None,
        DiffType::Add,
        DiffType::Remove,
        DiffType::Modify,
    ];

    const fn bit(self) -> u8 {
        match self {
            DiffType::None => 1,
            DiffType::Add => 1 << 1,
            DiffType::Remove => 1 << 2,
            DiffType::Modify => 1 << 3,
        }
    }
}

impl fmt::Display for DiffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiffType::None => "none",
            DiffType::Add => "add",
            DiffType::Remove => "remove",
            DiffType::Modify => "modify",
        };
        f.write_str(name)
    }
}

/// A set of [`DiffType`]s, used to suppress kinds from diff output.
///
/// Serialized as the list of kinds it contains.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<DiffType>", into = "Vec<DiffType>")]
pub struct DiffMask(u8);

impl DiffMask {
    /// No kinds.
    pub const EMPTY: DiffMask = DiffMask(0);
    /// Every kind.
    pub const ALL: DiffMask = DiffMask(0b1111);

    /// A mask holding exactly `kinds`.
    pub fn of(kinds: &[DiffType]) -> Self {
        kinds.iter().fold(Self::EMPTY, |mask, kind| mask.with(*kind))
    }

    /// This mask plus `kind`.
    pub const fn with(self, kind: DiffType) -> Self {
        DiffMask(self.0 | kind.bit())
    }

    /// This mask minus `kind`.
    pub const fn without(self, kind: DiffType) -> Self {
        DiffMask(self.0 & !kind.bit())
    }

    pub const fn contains(self, kind: DiffType) -> bool {
        self.0 & kind.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// The kinds in this mask, in declaration order.
    pub fn kinds(self) -> impl Iterator<Item = DiffType> {
        DiffType::ALL.into_iter().filter(move |kind| self.contains(*kind))
    }
}

impl From<DiffType> for DiffMask {
    fn from(kind: DiffType) -> Self {
        DiffMask::EMPTY.with(kind)
    }
}

impl From<Vec<DiffType>> for DiffMask {
    fn from(kinds: Vec<DiffType>) -> Self {
        DiffMask::of(&kinds)
    }
}

impl From<DiffMask> for Vec<DiffType> {
    fn from(mask: DiffMask) -> Self {
        mask.kinds().collect()
    }
}

impl fmt::Debug for DiffMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.kinds()).finish()
    }
}

/// One reported position of a diff.
///
/// Paths are given for both sides even when the node exists on one side
/// only: an added node's `before_path` is where it would sit in the before
/// snapshot. Positions are sibling indices and are `None` at the root and
/// on the side where the node is absent.
#[derive(Clone, Debug)]
pub struct DiffEntry<K, N> {
    pub kind: DiffType,
    pub before_path: Path<K>,
    pub after_path: Path<K>,
    pub before_position: Option<usize>,
    pub after_position: Option<usize>,
    pub before_value: Option<N>,
    pub after_value: Option<N>,
    /// Distance between the two sides; `0.0` for additions and removals.
    pub distance: f64,
    /// Set when the sibling aligner paired this node out of sequence.
    pub moved: bool,
}

impl<K, N> DiffEntry<K, N> {
    /// The entry reported when both snapshots are absent.
    pub(crate) fn both_absent() -> Self {
        Self {
            kind: DiffType::None,
            before_path: Path::root(),
            after_path: Path::root(),
            before_position: None,
            after_position: None,
            before_value: None,
            after_value: None,
            distance: 0.0,
            moved: false,
        }
    }

    /// Returns `true` if the entry reports a difference.
    pub fn is_change(&self) -> bool {
        self.kind != DiffType::None || self.moved
    }
}

/// The entries of one diff, in pre-order of the after snapshot (removed
/// nodes are interleaved at their before positions).
#[derive(Clone, Debug)]
pub struct TreeDiff<K, N> {
    pub entries: Vec<DiffEntry<K, N>>,
}

impl<K, N> TreeDiff<K, N> {
    pub fn new(entries: Vec<DiffEntry<K, N>>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiffEntry<K, N>> {
        self.entries.iter()
    }

    /// Number of entries of `kind`.
    pub fn count(&self, kind: DiffType) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Entries of `kind`.
    pub fn of_kind(&self, kind: DiffType) -> impl Iterator<Item = &DiffEntry<K, N>> {
        self.entries.iter().filter(move |e| e.kind == kind)
    }

    /// Entries for nodes that changed sibling position.
    pub fn moves(&self) -> impl Iterator<Item = &DiffEntry<K, N>> {
        self.entries.iter().filter(|e| e.moved)
    }

    /// Returns `true` if any entry reports a difference.
    pub fn has_changes(&self) -> bool {
        self.entries.iter().any(DiffEntry::is_change)
    }
}

impl<K, N> Default for TreeDiff<K, N> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<K, N> IntoIterator for TreeDiff<K, N> {
    type Item = DiffEntry<K, N>;
    type IntoIter = std::vec::IntoIter<DiffEntry<K, N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, K, N> IntoIterator for &'a TreeDiff<K, N> {
    type Item = &'a DiffEntry<K, N>;
    type IntoIter = std::slice::Iter<'a, DiffEntry<K, N>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

//! Diff engine for otree.
//!
//! Compares two optional tree snapshots through a
//! [`ChildAccessor`](otree_types::ChildAccessor) and a pluggable distance
//! function, producing a tagged edit script. Matched siblings are aligned by
//! key (Myers, via `similar`) with optional move detection. A diff can be
//! written back through a transform to rebuild either snapshot or anything
//! in between.
//!
//! # Key Types
//!
//! - [`Differ`] -- Diff engine: [`Differ::diff`] and [`Differ::apply`]
//! - [`TreeDiff`] / [`DiffEntry`] -- Diff result and its entries
//! - [`DiffType`] / [`DiffMask`] -- Entry kinds and suppression masks
//! - [`Distance`] / [`Positioned`] -- Distance functions over positioned nodes
//! - [`SiblingAligner`] / [`SequenceAligner`] -- Child alignment
//! - [`DiffConfig`] -- Threshold, suppression and move detection

pub mod align;
pub mod config;
pub mod distance;
pub mod engine;
pub mod entry;
pub mod error;

pub use align::{AlignContext, Alignment, SequenceAligner, SiblingAligner};
pub use config::DiffConfig;
pub use distance::{measure, ByValue, Distance, Positioned};
pub use engine::{apply_diff, diff, Differ};
pub use entry::{DiffEntry, DiffMask, DiffType, TreeDiff};
pub use error::{DiffError, DiffResult};

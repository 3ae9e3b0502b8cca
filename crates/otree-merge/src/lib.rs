//! Merge engine for otree.
//!
//! Unions two optional snapshots by key correspondence: positions present on
//! one side are copied, positions present on both are merged recursively.
//! Nodes are assembled through
//! [`ChildAccessor::with_children`](otree_types::ChildAccessor::with_children).
//!
//! # Key Types
//!
//! - [`merge`] -- Union with the right-hand payload winning at shared positions
//! - [`merge_with`] -- Union with a caller-chosen payload at shared positions

pub mod merge;

pub use merge::{merge, merge_with};

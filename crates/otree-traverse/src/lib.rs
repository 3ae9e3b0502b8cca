//! Traversal engine for otree.
//!
//! Walks any tree for which a [`ChildAccessor`](otree_types::ChildAccessor)
//! exists. Walks are lazy iterators of [`Entry`](otree_types::Entry) values,
//! so accessor failures travel in the stream next to the nodes found.
//! Modification is persistent: the input tree is never touched.
//!
//! # Key Types
//!
//! - [`TopDown`], [`BottomUp`], [`BreadthFirst`] -- Pre-, post- and level-order walks
//! - [`MatchStop`] -- Pre-order search that stops descending at each match
//! - [`Accept`] -- Pruning predicate ([`AcceptAll`], [`ByNode`], [`ByPath`])
//! - [`modify_top_down`], [`modify_bottom_up`], [`modify_at`] -- Persistent modification
//! - [`resolve`], [`resolve_filtered`] -- Direct path resolution by key

pub mod filter;
pub mod modify;
pub mod resolve;
pub mod walk;

pub use filter::{Accept, AcceptAll, ByNode, ByPath};
pub use modify::{modify_bottom_up, modify_top_down};
pub use resolve::{modify_at, resolve, resolve_accepting, resolve_filtered};
pub use walk::{
    bottom_up, bottom_up_filtered, bottom_up_indexed, breadth_first, breadth_first_filtered,
    breadth_first_indexed, top_down, top_down_filtered, top_down_indexed, top_down_match,
    top_down_match_indexed, BottomUp, BreadthFirst, MatchStop, TopDown,
};

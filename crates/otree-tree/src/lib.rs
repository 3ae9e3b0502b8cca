//! Generic container-backed trees for otree.
//!
//! [`Tree`] pairs a payload with a pluggable child container and is the
//! default node type the otree engines are exercised with. Any other node
//! type works as long as it has a [`ChildAccessor`](otree_types::ChildAccessor).
//!
//! # Key Types
//!
//! - [`Tree`] -- Immutable node: payload plus shared child container
//! - [`ChildContainer`] -- Container capability ([`ListChildren`], [`MapChildren`],
//!   [`LazyChildren`], [`ChainChildren`])
//! - [`TreeAccessor`] -- [`ChildAccessor`](otree_types::ChildAccessor) for [`Tree`]

pub mod accessor;
pub mod container;
pub mod node;

pub use accessor::TreeAccessor;
pub use container::{
    ChainChildren, ChildContainer, LazyChildren, ListChildren, MapChildren, SharedChildren,
};
pub use node::{Element, Tree};

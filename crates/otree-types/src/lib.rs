//! Foundation types for otree.
//!
//! This crate provides the position, error and capability types every other
//! otree crate depends on.
//!
//! # Key Types
//!
//! - [`Path`] -- Immutable, structurally shared, parent-linked position path
//! - [`ChildAccessor`] -- Enumerate / look up / rebuild children of any tree shape
//! - [`KeyEquality`] -- Pluggable key comparison ([`StructuralEq`], [`KeyFn`])
//! - [`Entry`] -- Traversal stream item carrying a node or an error
//! - [`TreeError`] -- Errors raised by accessors, rules and transforms

pub mod accessor;
pub mod entry;
pub mod error;
pub mod path;

pub use accessor::{ChildAccessor, ChildIter, KeyEquality, KeyFn, StructuralEq};
pub use entry::Entry;
pub use error::{TreeError, TreeResult};
pub use path::{Keys, Path};

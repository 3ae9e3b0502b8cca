//! Fixpoint rewrite engine for otree.
//!
//! Applies a local [`Rule`] across a tree, pass after pass, until a pass
//! replaces nothing. Works over any node type with a
//! [`ChildAccessor`](otree_types::ChildAccessor).
//!
//! # Key Types
//!
//! - [`Rule`] -- Local rewrite rule, implemented for closures
//! - [`RewriteConfig`] -- Pass limit (unbounded by default)
//! - [`Cancellation`] -- Shared flag checked between passes
//! - [`Rewritten`] / [`Pass`] -- Converged tree with pass count / single pass outcome
//! - [`RewriteError`] -- Located rule failures, pass limit, cancellation

pub mod config;
pub mod error;
pub mod rewrite;

pub use config::{Cancellation, RewriteConfig};
pub use error::{RewriteError, RewriteResult};
pub use rewrite::{rewrite, rewrite_pass, rewrite_with, Pass, Rewritten, Rule};

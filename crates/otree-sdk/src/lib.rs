//! High-level SDK for otree.
//!
//! Bundles a [`ChildAccessor`] with an [`EngineConfig`] in one [`Otree`]
//! handle and re-exports the types needed to drive every engine through it.
//! The configuration can be loaded from TOML.
//!
//! # Key Types
//!
//! - [`Otree`] -- Engine handle: walks, modify, resolve, rewrite, diff, merge
//! - [`EngineConfig`] -- Rewrite and diff configuration, TOML-loadable
//! - [`SdkError`] -- Any engine failure, or a configuration error

pub mod config;
pub mod engine;
pub mod error;

pub use config::EngineConfig;
pub use engine::Otree;
pub use error::{SdkError, SdkResult};

// Re-export key types
pub use otree_diff::{
    ByValue, DiffConfig, DiffEntry, DiffError, DiffMask, DiffType, Distance, Positioned, TreeDiff,
};
pub use otree_rewrite::{Cancellation, RewriteConfig, RewriteError, Rewritten, Rule};
pub use otree_traverse::{Accept, AcceptAll, ByNode, ByPath};
pub use otree_tree::{Tree, TreeAccessor};
pub use otree_types::{ChildAccessor, Entry, KeyEquality, KeyFn, Path, StructuralEq, TreeError, TreeResult};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Configuration for the rewrite engine.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Upper bound on the number of passes, counting the final pass that
    /// confirms convergence. `None` rewrites until a fixpoint is reached.
    pub max_passes: Option<usize>,
}

impl RewriteConfig {
    /// A configuration that gives up after `max_passes` passes.
    pub fn bounded(max_passes: usize) -> Self {
        Self {
            max_passes: Some(max_passes),
        }
    }
}

/// A shared flag requesting that a running rewrite stop.
///
/// The engine checks it before every pass, never in the middle of one.
/// Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    flag: Arc<AtomicBool>,
}

impl Cancellation {
    /// A fresh, unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once [`cancel`](Cancellation::cancel) has been called
    /// on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

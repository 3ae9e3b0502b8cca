use serde::{Deserialize, Serialize};

use crate::entry::{DiffMask, DiffType};

/// Configuration for the diff engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Matched nodes further apart than this are not reported, though their
    /// children still are.
    pub threshold: f64,
    /// Kinds never emitted. Suppression does not stop recursion.
    pub suppress: DiffMask,
    /// Pair removed and added siblings with equal keys as moves.
    pub detect_moves: bool,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            threshold: 1.0,
            suppress: DiffMask::EMPTY,
            detect_moves: false,
        }
    }
}

impl DiffConfig {
    /// Report only differences: `None` entries are suppressed.
    pub fn changes_only() -> Self {
        Self {
            suppress: DiffMask::from(DiffType::None),
            ..Default::default()
        }
    }

    /// Set the distance above which matched nodes are not reported.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Turn move detection on or off.
    pub fn with_moves(mut self, detect_moves: bool) -> Self {
        self.detect_moves = detect_moves;
        self
    }

    /// Drop entries whose diff type is in `suppress`.
    pub fn suppressing(mut self, suppress: DiffMask) -> Self {
        self.suppress = suppress;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reports_everything() {
        let config = DiffConfig::default();
        assert!(config.suppress.is_empty());
        assert!(!config.detect_moves);
        assert_eq!(config.threshold, 1.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: DiffConfig = serde_json::from_str(r#"{"detect_moves":true}"#).unwrap();
        assert_eq!(config, DiffConfig::default().with_moves(true));

        let config: DiffConfig =
            serde_json::from_str(r#"{"threshold":0.25,"suppress":["none"]}"#).unwrap();
        assert_eq!(config, DiffConfig::changes_only().with_threshold(0.25));
    }
}

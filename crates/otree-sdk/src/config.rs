use std::path::Path;

use otree_diff::DiffConfig;
use otree_rewrite::RewriteConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SdkError, SdkResult};

/// Engine-wide configuration, one table per engine.
///
/// ```toml
/// [rewrite]
/// max_passes = 64
///
/// [diff]
/// threshold = 0.5
/// suppress = ["none"]
/// detect_moves = true
/// ```
///
/// Missing tables and keys take their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rewrite: RewriteConfig,
    pub diff: DiffConfig,
}

impl EngineConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| SdkError::Config(e.to_string()))?;
        if config.diff.threshold.is_nan() || config.diff.threshold < 0.0 {
            return Err(SdkError::Config(format!(
                "diff.threshold must be a non-negative number, got {}",
                config.diff.threshold
            )));
        }
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_toml_str(&text)?;
        debug!(path = %path.display(), ?config, "engine config loaded");
        Ok(config)
    }

    /// Render as TOML text accepted by [`from_toml_str`](Self::from_toml_str).
    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string(self).map_err(|e| SdkError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otree_diff::{DiffMask, DiffType};

    #[test]
    fn empty_text_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn parses_both_tables() {
        let config = EngineConfig::from_toml_str(
            r#"
            [rewrite]
            max_passes = 64

            [diff]
            threshold = 0.5
            suppress = ["none", "modify"]
            detect_moves = true
            "#,
        )
        .unwrap();
        assert_eq!(config.rewrite, RewriteConfig::bounded(64));
        assert_eq!(config.diff.threshold, 0.5);
        assert_eq!(
            config.diff.suppress,
            DiffMask::of(&[DiffType::None, DiffType::Modify])
        );
        assert!(config.diff.detect_moves);
    }

    #[test]
    fn partial_tables_keep_defaults() {
        let config = EngineConfig::from_toml_str("[diff]\ndetect_moves = true\n").unwrap();
        assert_eq!(config.rewrite, RewriteConfig::default());
        assert_eq!(config.diff, DiffConfig::default().with_moves(true));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            EngineConfig::from_toml_str("[diff]\nsuppress = [\"sideways\"]\n"),
            Err(SdkError::Config(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[diff]\nthreshold = -1.0\n"),
            Err(SdkError::Config(_))
        ));
    }

    #[test]
    fn toml_text_round_trips() {
        let config = EngineConfig {
            rewrite: RewriteConfig::bounded(3),
            diff: DiffConfig::changes_only().with_threshold(2.0),
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("otree.toml");
        std::fs::write(&path, "[rewrite]\nmax_passes = 7\n").unwrap();
        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.rewrite.max_passes, Some(7));

        let missing = EngineConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(missing.to_string().contains("absent.toml"));
    }
}

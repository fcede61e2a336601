use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Greenlines take effect on hitsounds slightly after their offset.
pub const DEFAULT_HITSOUND_LOOKAHEAD_MS: f64 = 5.0;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimelineConfig {
    /// Offset added to an event's time when looking up the control point
    /// that decides its volume and samples.
    pub hitsound_lookahead_ms: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            hitsound_lookahead_ms: DEFAULT_HITSOUND_LOOKAHEAD_MS,
        }
    }
}

impl TimelineConfig {
    /// Loads config from a specified path.
    /// Returns default config if file doesn't exist.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// Saves config to a specified path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = TimelineConfig::default();
        assert_eq!(config.hitsound_lookahead_ms, 5.0);
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let dir = tempdir().unwrap();
        let config = TimelineConfig::load_from(dir.path().join("missing.json")).unwrap();
        assert_eq!(config, TimelineConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("timeline.json");

        let config = TimelineConfig {
            hitsound_lookahead_ms: 3.5,
        };
        config.save_to(&path).unwrap();

        let loaded = TimelineConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("timeline.json");
        fs::write(&path, "{}").unwrap();

        let loaded = TimelineConfig::load_from(&path).unwrap();
        assert_eq!(loaded.hitsound_lookahead_ms, DEFAULT_HITSOUND_LOOKAHEAD_MS);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("timeline.json");
        fs::write(&path, "not json").unwrap();

        assert!(TimelineConfig::load_from(&path).is_err());
    }
}

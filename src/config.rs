//! Engine and host configuration.
//!
//! Stored as JSON. Every field has a default, so an empty object (or no
//! file at all) is a valid configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of icon channels. `None` takes it from the loaded document.
    pub channels: Option<usize>,
    /// Name of the icon theme used by the viewer.
    pub theme: String,
    /// How often the viewer checks the inbound state file for changes.
    pub poll_interval_ms: u64,
    /// Draw an error marker on nodes that could not be built.
    pub mark_broken_nodes: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            channels: None,
            theme: "Light".to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            mark_broken_nodes: true,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"channels": 2}"#).unwrap();
        assert_eq!(config.channels, Some(2));
        assert_eq!(config.theme, "Light");
        assert_eq!(config.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert!(config.mark_broken_nodes);
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = EngineConfig::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }

    #[test]
    fn test_load_or_default_without_path() {
        assert_eq!(EngineConfig::load_or_default(None).unwrap(), EngineConfig::default());
    }
}

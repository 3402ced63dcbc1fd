//! Engine configuration
//!
//! TOML-backed sizing configuration for games and scenes. Every field has
//! a default, so an empty file (or no file at all) yields the same values
//! the constructors use.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scene::SceneConfig;
use crate::GameConfig;

/// Errors from loading an engine configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file was not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Game-level sizing (global scene, scene defaults).
    #[serde(default)]
    pub game: GameConfig,
}

impl EngineConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Default scene config carried by this configuration.
    #[must_use]
    pub fn scene(&self) -> &SceneConfig {
        &self.game.scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config.game.global_pool_size, 100);
        assert_eq!(config.game.scene.pool_size, 2000);
        assert!(config.game.scene.allow_growth);
    }

    #[test]
    fn test_partial_config_overrides_selected_fields() {
        let text = r"
[game]
global_pool_size = 32

[game.scene]
pool_size = 64
allow_growth = false
";
        let config = EngineConfig::from_toml_str(text).unwrap();
        assert_eq!(config.game.global_pool_size, 32);
        assert_eq!(config.game.scene.pool_size, 64);
        assert!(!config.game.scene.allow_growth);
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let result = EngineConfig::from_toml_str("game = nonsense");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}

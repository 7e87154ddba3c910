use crate::services::icons::IconSize;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct Config {
    #[serde(default)]
    pub explorer: ExplorerConfig,

    #[serde(default)]
    pub icons: IconConfig,
}

/// Navigation and drive behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExplorerConfig {
    /// Show hidden directories in the tree and hidden files in the listing
    #[serde(default = "default_false")]
    pub show_hidden: bool,

    /// Maximum number of back/forward entries kept
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Directories presented as additional drive roots
    #[serde(default)]
    pub extra_drive_roots: Vec<PathBuf>,

    /// Directory opened at startup; the first drive when unset
    #[serde(default)]
    pub start_path: Option<PathBuf>,

    /// How often the drive set is polled for hot-plug changes
    #[serde(default = "default_drive_poll_interval")]
    pub drive_poll_interval_ms: u64,

    /// Delete to the system trash instead of removing permanently
    #[serde(default = "default_true")]
    pub delete_to_trash: bool,
}

fn default_history_capacity() -> usize {
    100
}

fn default_drive_poll_interval() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            show_hidden: false,
            history_capacity: default_history_capacity(),
            extra_drive_roots: Vec::new(),
            start_path: None,
            drive_poll_interval_ms: default_drive_poll_interval(),
            delete_to_trash: true,
        }
    }
}

/// Icon resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IconConfig {
    #[serde(default)]
    pub size: IconSize,

    /// Also cache file icons by extension. Faster, but the first file seen
    /// decides the icon for every file sharing its extension.
    #[serde(default = "default_false")]
    pub cache_by_extension: bool,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            size: IconSize::default(),
            cache_by_extension: false,
        }
    }
}

impl Config {
    pub const FILENAME: &'static str = "explorer.json";

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let config: Config =
            serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path.as_ref(), contents).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// JSON Schema of the configuration file
    pub fn json_schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(Config)).unwrap_or_default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.explorer.history_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "history_capacity must be greater than 0".to_string(),
            ));
        }

        if self.explorer.drive_poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "drive_poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        if let Some(start) = &self.explorer.start_path {
            if start.is_relative() {
                return Err(ConfigError::ValidationError(format!(
                    "start_path must be absolute: {}",
                    start.display()
                )));
            }
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("Serialize error: {0}")]
    SerializeError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.explorer.history_capacity, 100);
        assert!(!config.explorer.show_hidden);
        assert!(config.explorer.delete_to_trash);
        assert!(!config.icons.cache_by_extension);
        assert_eq!(config.icons.size, IconSize::Large);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.explorer.history_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.explorer.start_path = Some(PathBuf::from("relative/dir"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = temp_dir.path().join(Config::FILENAME);

        let mut config = Config::default();
        config.explorer.show_hidden = true;
        config.icons.size = IconSize::Small;
        config.save_to_file(&config_path).unwrap();

        let loaded = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "explorer": {
                "history_capacity": 20
            },
            "icons": {
                "size": "small",
                "cache_by_extension": true
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.explorer.history_capacity, 20);
        assert_eq!(config.explorer.drive_poll_interval_ms, 2000);
        assert_eq!(config.icons.size, IconSize::Small);
        assert!(config.icons.cache_by_extension);
    }

    #[test]
    fn test_schema_lists_sections() {
        let schema = Config::json_schema();
        let properties = &schema["properties"];
        assert!(properties.get("explorer").is_some());
        assert!(properties.get("icons").is_some());
    }
}

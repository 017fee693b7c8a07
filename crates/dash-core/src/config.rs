//! Engine settings

use std::path::Path;

use dash_model::{ScreenSize, SizingSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("inconsistent settings: {0}")]
    Invalid(String),
}

/// Engine configuration; every field has a default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    /// Maximum number of undo records kept
    pub undo_limit: usize,

    /// Screen class used when normalizing item sizes
    pub screen: ScreenSize,

    /// Grid and per-widget size overrides
    pub sizing: SizingSettings,

    /// Queue length above which dispatch logs a warning
    pub queue_warning_threshold: usize,

    /// Resolve the date data set of newly placed insight widgets unless the command says otherwise
    pub auto_resolve_date_data_sets: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            undo_limit: 50,
            screen: ScreenSize::Xl,
            sizing: SizingSettings::default(),
            queue_warning_threshold: 64,
            auto_resolve_date_data_sets: false,
        }
    }
}

impl EngineSettings {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.sizing.inconsistency() {
            Some(problem) => Err(ConfigError::Invalid(problem)),
            None => Ok(()),
        }
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_default() {
        let settings = EngineSettings::from_json(r#"{ "undoLimit": 5 }"#).unwrap();

        assert_eq!(settings.undo_limit, 5);
        assert_eq!(settings.screen, ScreenSize::Xl);
        assert_eq!(settings.sizing.grid_columns, 12);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        assert!(matches!(
            EngineSettings::from_json(r#"{ "undoLimit": "many" }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_inconsistent_size_override_rejected() {
        let json = r#"{
            "sizing": {
                "overrides": {
                    "richText": {
                        "defaultWidth": 12, "minWidth": 1,
                        "defaultHeight": 20, "minHeight": 30, "maxHeight": 10
                    }
                }
            }
        }"#;

        assert!(matches!(EngineSettings::from_json(json), Err(ConfigError::Invalid(_))));
        assert!(matches!(
            EngineSettings::from_json(r#"{ "sizing": { "gridColumns": 0 } }"#),
            Err(ConfigError::Invalid(_))
        ));
    }
}

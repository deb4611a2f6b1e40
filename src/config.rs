//! Model settings and the serialisable blueprint of a bound model.

use crate::component::{Category, Parameter};
use crate::domain::{Calendar, DateTime, GridKind};
use crate::error::{CouplingError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

fn current_dir() -> PathBuf {
    PathBuf::from(".")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub identifier: String,
    #[serde(default = "current_dir")]
    pub config_directory: PathBuf,
    /// Where dumps are written and looked up.
    #[serde(default = "current_dir")]
    pub saving_directory: PathBuf,
}

impl ModelSettings {
    pub fn new(identifier: &str) -> Self {
        Self {
            identifier: identifier.to_string(),
            config_directory: current_dir(),
            saving_directory: current_dir(),
        }
    }

    pub fn with_config_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config_directory = dir.into();
        self
    }

    pub fn with_saving_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.saving_directory = dir.into();
        self
    }

    /// The identifier prefixes every dump file name, so it must be a plain file-name fragment.
    pub fn validate(&self) -> Result<()> {
        let id = &self.identifier;
        if id.is_empty() || id.contains(['/', '\\']) || id.chars().any(char::is_whitespace) {
            return Err(CouplingError::Configuration(format!(
                "model identifier '{}' must be non-empty and contain no whitespace or path separators",
                id
            )));
        }
        Ok(())
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(s)
            .map_err(|e| CouplingError::Configuration(format!("invalid model settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| CouplingError::io(path, e))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CouplingError::Configuration(format!("cannot serialise model settings: {}", e)))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json_string()?).map_err(|e| CouplingError::io(path, e))
    }
}

/// A description of a bound model, suitable for archiving next to its outputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelBlueprint {
    pub identifier: String,
    pub config_directory: PathBuf,
    pub saving_directory: PathBuf,
    pub components: Vec<ComponentBlueprint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentBlueprint {
    pub category: Category,
    pub kind: String,
    pub inwards: Vec<String>,
    pub outwards: Vec<String>,
    pub parameters: BTreeMap<String, Parameter>,
    pub constants: BTreeMap<String, f64>,
    pub timedomain: TimeSummary,
    pub spacedomain: SpaceSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSummary {
    pub start: DateTime,
    pub end: DateTime,
    pub step_seconds: i64,
    pub calendar: Calendar,
    pub units: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpaceSummary {
    pub kind: GridKind,
    pub shape: Vec<usize>,
}

impl ModelBlueprint {
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CouplingError::Configuration(format!("cannot serialise blueprint: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_settings_json_defaults() {
        let settings = ModelSettings::from_json_str(r#"{"identifier": "test"}"#).unwrap();
        assert_eq!(settings, ModelSettings::new("test"));
        let back = ModelSettings::from_json_str(&settings.to_json_string().unwrap()).unwrap();
        assert_eq!(back, settings);
    }

    #[rstest]
    #[case("")]
    #[case("a/b")]
    #[case("two words")]
    fn test_invalid_identifier(#[case] id: &str) {
        assert!(matches!(ModelSettings::new(id).validate(), Err(CouplingError::Configuration(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = ModelSettings::new("catchment").with_saving_directory(dir.path());
        settings.save(&path).unwrap();
        assert_eq!(ModelSettings::load(&path).unwrap(), settings);
    }
}
